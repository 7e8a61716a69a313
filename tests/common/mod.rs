#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use tenant_portal::auth::{IdentityAssertion, IdentityError, IdentityProvider, SessionContext};
use tenant_portal::config::AppConfig;
use tenant_portal::{app, AppState};

pub const ADMIN_EMAIL: &str = "admin@portal.test";
pub const SARA_EMAIL: &str = "sara@acme.test";
pub const OMAR_EMAIL: &str = "Omar@Nobles.test";
pub const IDLE_EMAIL: &str = "idle@acme.test";

/// A portal running over a throwaway data directory.
pub struct TestPortal {
    pub dir: TempDir,
    pub state: AppState,
    router: Router,
}

impl TestPortal {
    pub fn new() -> Result<Self> {
        Self::build(None)
    }

    pub fn with_identity(provider: FakeProvider) -> Result<Self> {
        Self::build(Some(Arc::new(provider)))
    }

    fn build(provider: Option<Arc<dyn IdentityProvider>>) -> Result<Self> {
        let dir = tempfile::tempdir().context("failed to create fixture dir")?;
        write_fixture(dir.path())?;

        let config = AppConfig::for_root(dir.path(), "integration-test-secret");
        let mut state = AppState::from_config(config)?;
        if let Some(provider) = provider {
            state = state.with_identity_provider(provider);
        }
        let router = app(state.clone());

        Ok(Self { dir, state, router })
    }

    pub async fn send(&self, request: Request<Body>) -> Result<Response<Body>> {
        Ok(self.router.clone().oneshot(request).await?)
    }

    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Result<Response<Body>> {
        let mut builder = Request::builder().uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty())?).await
    }

    pub async fn post_form(
        &self,
        path: &str,
        body: &str,
        cookie: Option<&str>,
    ) -> Result<Response<Body>> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string()))?).await
    }

    /// `Cookie` header value for a session signed in as the stored user.
    pub async fn session_for(&self, email: &str) -> Result<String> {
        let user = self
            .state
            .store
            .find_user_by_email(email)
            .await?
            .with_context(|| format!("fixture has no user {}", email))?;
        let token = self.state.keys.issue_session(&SessionContext::for_user(&user))?;
        Ok(format!("portal_session={}", token))
    }

    /// Body of the page a flash-carrying redirect lands on.
    pub async fn follow_with_flash(&self, response: Response<Body>, session: Option<&str>) -> Result<String> {
        let location = location(&response).context("response is not a redirect")?;
        let flash = set_cookie(&response, "portal_flash").context("no flash cookie set")?;
        let cookie = match session {
            Some(session) => format!("{}; {}", session, flash),
            None => flash,
        };
        let page = self.get(&location, Some(&cookie)).await?;
        body_text(page).await
    }
}

pub fn location(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// `name=value` from the response's `Set-Cookie` headers, skipping expirations.
pub fn set_cookie(response: &Response<Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .find(|pair| {
            pair.split_once('=')
                .map(|(k, v)| k == name && !v.is_empty())
                .unwrap_or(false)
        })
        .map(str::to_string)
}

pub fn clears_cookie(response: &Response<Body>, name: &str) -> bool {
    let prefix = format!("{}=;", name);
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with(&prefix) && v.contains("Max-Age=0"))
}

pub fn assert_redirect(response: &Response<Body>, to: &str) {
    assert!(
        response.status().is_redirection(),
        "expected redirect to {}, got {}",
        to,
        response.status()
    );
    assert_eq!(location(response).as_deref(), Some(to));
}

pub async fn body_text(response: Response<Body>) -> Result<String> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(String::from_utf8(bytes.to_vec())?)
}

pub async fn body_json(response: Response<Body>) -> Result<Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// JSON context embedded in a rendered page.
pub async fn page_context(response: Response<Body>) -> Result<Value> {
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await?;
    let start = html
        .find("id=\"page-context\">")
        .context("page has no embedded context")?
        + "id=\"page-context\">".len();
    let end = html[start..].find("</script>").context("unterminated context")? + start;
    Ok(serde_json::from_str(&html[start..end])?)
}

/// Identity provider double: hands back a fixed result for any code.
pub struct FakeProvider {
    outcome: std::result::Result<IdentityAssertion, String>,
}

impl FakeProvider {
    pub fn verified(email: &str, name: &str) -> Self {
        Self {
            outcome: Ok(IdentityAssertion {
                email: email.to_string(),
                name: name.to_string(),
                picture: Some("https://idp.test/avatar.png".to_string()),
            }),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            outcome: Err(reason.to_string()),
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn authorization_url(&self, state: &str, redirect_uri: &str) -> std::result::Result<String, IdentityError> {
        let url = url::Url::parse_with_params(
            "https://idp.test/authorize",
            &[("state", state), ("redirect_uri", redirect_uri)],
        )?;
        Ok(url.into())
    }

    async fn exchange(
        &self,
        _code: &str,
        _redirect_uri: &str,
    ) -> std::result::Result<IdentityAssertion, IdentityError> {
        self.outcome.clone().map_err(IdentityError::Provider)
    }
}

fn write_json(path: &Path, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

fn write_fixture(root: &Path) -> Result<()> {
    let data = root.join("data");

    write_json(
        &data.join("platform.json"),
        &json!({
            "platform": {
                "name": "منصة 24/45",
                "tagline": "لوحات متابعة المشاريع"
            },
            "tenants": [{ "slug": "acme" }]
        }),
    )?;

    write_json(
        &data.join("tenants.json"),
        &json!({
            "tenants": [
                { "slug": "acme", "name": "Acme", "active": true },
                { "slug": "nobles", "name": "Nobles", "active": true },
                { "slug": "dormant", "name": "Dormant", "active": false }
            ]
        }),
    )?;

    write_json(
        &data.join("users.json"),
        &json!({
            "users": [
                {
                    "id": "u-admin",
                    "email": ADMIN_EMAIL,
                    "name": "Admin",
                    "password": "admin-pass",
                    "role": "admin",
                    "tenant_access": [],
                    "active": true
                },
                {
                    "id": "u-sara",
                    "email": SARA_EMAIL,
                    "name": "Sara",
                    "password": "sara-pass",
                    "role": "user",
                    "tenant_access": ["acme"],
                    "default_tenant": "acme",
                    "active": true
                },
                {
                    "id": "u-omar",
                    "email": OMAR_EMAIL,
                    "name": "Omar",
                    "password": "omar-pass",
                    "role": "user",
                    "tenants": [],
                    "default_tenant": "",
                    "active": true,
                    "phone": "+966500000000"
                },
                {
                    "id": "u-idle",
                    "email": IDLE_EMAIL,
                    "name": "Idle",
                    "password": "idle-pass",
                    "role": "user",
                    "tenant_access": ["acme"],
                    "active": false
                }
            ]
        }),
    )?;

    write_json(
        &data.join("tenants").join("acme").join("projects.json"),
        &json!({
            "projects": [
                { "slug": "tower", "name": "Tower", "progress": 40 },
                { "slug": "bridge", "name": "Bridge", "progress": 75 }
            ]
        }),
    )?;

    write_json(
        &data.join("tenants").join("acme").join("config.json"),
        &json!({ "company": { "name": "Acme Holding" } }),
    )?;

    let favicon = root.join("static").join("images").join("favicon.svg");
    if let Some(parent) = favicon.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(favicon, "<svg xmlns=\"http://www.w3.org/2000/svg\"/>")?;
    fs::create_dir_all(root.join("templates"))?;

    Ok(())
}
