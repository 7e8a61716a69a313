use axum::http::{header, HeaderMap, HeaderValue};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::config::SessionConfig;
use crate::store::{Role, User};

pub const SESSION_COOKIE: &str = "portal_session";
pub const FLASH_COOKIE: &str = "portal_flash";
pub const STATE_COOKIE: &str = "portal_signin_state";

/// Identity resolved from the session cookie, built once per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub user_id: String,
    pub user_email: String,
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_picture: Option<String>,
    pub role: Role,
    pub tenant_access: Vec<String>,
    pub default_tenant: Option<String>,
}

impl SessionContext {
    pub fn for_user(user: &User) -> Self {
        let user_name = if user.name.is_empty() {
            user.email.clone()
        } else {
            user.name.clone()
        };

        Self {
            user_id: user.id.clone(),
            user_email: user.email.clone(),
            user_name,
            user_picture: None,
            role: user.role,
            tenant_access: user.tenant_access.clone(),
            default_tenant: user.default_tenant.clone(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Membership in the access list is the only thing that grants a tenant.
    pub fn can_access(&self, tenant_slug: &str) -> bool {
        self.tenant_access.iter().any(|slug| slug == tenant_slug)
    }

    /// Where a freshly signed-in user lands.
    pub fn landing_path(&self) -> String {
        if self.is_admin() {
            "/admin".to_string()
        } else if let Some(tenant) = &self.default_tenant {
            format!("/{}/", tenant)
        } else {
            "/".to_string()
        }
    }
}

/// Purpose of a signed token, so one cookie's value cannot stand in for
/// another's.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Session,
    Flash,
    SigninState,
}

#[derive(Debug, Serialize, Deserialize)]
struct SignedClaims<T> {
    kind: TokenKind,
    iat: i64,
    exp: i64,
    data: T,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session secret is not configured")]
    MissingSecret,

    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Signing material for every cookie the portal issues.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    session_ttl: Duration,
    cookie_secure: bool,
}

impl SessionKeys {
    pub fn from_config(config: &SessionConfig) -> Result<Self, SessionError> {
        if config.secret.is_empty() {
            return Err(SessionError::MissingSecret);
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            session_ttl: Duration::hours(config.ttl_hours as i64),
            cookie_secure: config.cookie_secure,
        })
    }

    pub fn issue_session(&self, session: &SessionContext) -> Result<String, SessionError> {
        self.sign(TokenKind::Session, session, self.session_ttl)
    }

    /// `None` for anything that is not a current, untampered session token.
    pub fn verify_session(&self, token: &str) -> Option<SessionContext> {
        self.open(TokenKind::Session, token)
    }

    pub fn sign<T: Serialize>(
        &self,
        kind: TokenKind,
        data: T,
        ttl: Duration,
    ) -> Result<String, SessionError> {
        let now = Utc::now();
        let claims = SignedClaims {
            kind,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            data,
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    pub fn open<T: DeserializeOwned>(&self, kind: TokenKind, token: &str) -> Option<T> {
        let validation = Validation::new(Algorithm::HS256);
        match decode::<SignedClaims<T>>(token, &self.decoding, &validation) {
            Ok(data) if data.claims.kind == kind => Some(data.claims.data),
            Ok(_) => {
                tracing::debug!(?kind, "token presented for the wrong purpose");
                None
            }
            Err(e) => {
                tracing::debug!(?kind, error = %e, "rejected signed token");
                None
            }
        }
    }

    /// `Set-Cookie` value for a browser-session cookie.
    pub fn cookie(&self, name: &str, value: &str) -> HeaderValue {
        self.cookie_with_max_age(name, value, None)
    }

    pub fn cookie_with_max_age(&self, name: &str, value: &str, max_age: Option<i64>) -> HeaderValue {
        let mut cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", name, value);
        if let Some(seconds) = max_age {
            cookie.push_str(&format!("; Max-Age={}", seconds));
        }
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        header_value(cookie)
    }

    pub fn expired_cookie(&self, name: &str) -> HeaderValue {
        self.cookie_with_max_age(name, "", Some(0))
    }
}

/// Value of the named cookie from the request's `Cookie` headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

fn header_value(cookie: String) -> HeaderValue {
    // Cookie names and token values are restricted to visible ASCII.
    HeaderValue::from_str(&cookie).unwrap_or_else(|e| {
        tracing::error!(error = %e, "refusing to emit malformed cookie");
        HeaderValue::from_static("portal_invalid=; Max-Age=0")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn keys(secret: &str) -> SessionKeys {
        SessionKeys::from_config(&SessionConfig {
            secret: secret.to_string(),
            ttl_hours: 1,
            cookie_secure: false,
        })
        .unwrap()
    }

    fn sara() -> SessionContext {
        SessionContext {
            user_id: "u1".into(),
            user_email: "sara@example.com".into(),
            user_name: "سارة".into(),
            user_picture: None,
            role: Role::User,
            tenant_access: vec!["acme".into()],
            default_tenant: Some("acme".into()),
        }
    }

    #[test]
    fn session_token_round_trips() {
        let keys = keys("secret");
        let token = keys.issue_session(&sara()).unwrap();
        assert_eq!(keys.verify_session(&token), Some(sara()));
    }

    #[test]
    fn foreign_or_tampered_tokens_are_rejected() {
        let token = keys("secret").issue_session(&sara()).unwrap();
        assert_eq!(keys("other").verify_session(&token), None);

        let mut tampered = token.clone();
        tampered.push('x');
        assert_eq!(keys("secret").verify_session(&tampered), None);
        assert_eq!(keys("secret").verify_session("garbage"), None);
    }

    #[test]
    fn tokens_are_bound_to_their_kind() {
        let keys = keys("secret");
        let flash = keys
            .sign(TokenKind::Flash, sara(), Duration::minutes(5))
            .unwrap();
        assert_eq!(keys.verify_session(&flash), None);
    }

    #[test]
    fn expired_session_is_rejected() {
        let keys = keys("secret");
        let token = keys
            .sign(TokenKind::Session, sara(), Duration::hours(-2))
            .unwrap();
        assert_eq!(keys.verify_session(&token), None);
    }

    #[test]
    fn missing_secret_is_an_error() {
        let result = SessionKeys::from_config(&SessionConfig {
            secret: String::new(),
            ttl_hours: 1,
            cookie_secure: true,
        });
        assert!(matches!(result, Err(SessionError::MissingSecret)));
    }

    #[test]
    fn landing_path_follows_role_then_default_tenant() {
        let mut session = sara();
        assert_eq!(session.landing_path(), "/acme/");

        session.default_tenant = None;
        assert_eq!(session.landing_path(), "/");

        session.role = Role::Admin;
        session.default_tenant = Some("acme".into());
        assert_eq!(session.landing_path(), "/admin");
    }

    #[test]
    fn admin_role_does_not_grant_tenant_access() {
        let mut session = sara();
        session.role = Role::Admin;
        session.tenant_access.clear();
        assert!(!session.can_access("acme"));
    }

    #[test]
    fn cookie_value_scans_all_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1; portal_flash=abc"));
        headers.append(header::COOKIE, HeaderValue::from_static("portal_session=tok.en.sig"));

        assert_eq!(cookie_value(&headers, SESSION_COOKIE), Some("tok.en.sig"));
        assert_eq!(cookie_value(&headers, FLASH_COOKIE), Some("abc"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn cookie_attributes() {
        let keys = keys("secret");
        let cookie = keys.cookie(SESSION_COOKIE, "v");
        assert_eq!(cookie, "portal_session=v; Path=/; HttpOnly; SameSite=Lax");

        let cleared = keys.expired_cookie(SESSION_COOKIE);
        assert!(cleared.to_str().unwrap().contains("Max-Age=0"));
    }
}
