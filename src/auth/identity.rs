//! Delegated sign-in through an external identity provider.
//!
//! Only the contract matters to the portal: a redirect to the provider, and
//! an exchange of the returned code for a verified email, name and avatar.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::IdentityConfig;

const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const GOOGLE_SCOPES: &str = "openid email profile";

/// Profile returned by a successful handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityAssertion {
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("provider returned an error: {0}")]
    Provider(String),

    #[error("sign-in state did not match")]
    StateMismatch,

    #[error("provider response is missing profile information")]
    MissingProfile,

    #[error("provider reports the email as unverified")]
    UnverifiedEmail,

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Where to send the browser to start the handshake.
    fn authorization_url(&self, state: &str, redirect_uri: &str) -> Result<String, IdentityError>;

    /// Trade the authorization code for the user's profile.
    async fn exchange(&self, code: &str, redirect_uri: &str) -> Result<IdentityAssertion, IdentityError>;
}

pub struct GoogleProvider {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
    picture: Option<String>,
}

impl GoogleProvider {
    /// `None` when the client credentials are not configured; sign-in by
    /// provider is then unavailable but the portal still starts.
    pub fn from_config(config: &IdentityConfig) -> Result<Option<Self>, IdentityError> {
        let Some((client_id, client_secret)) = config.google_credentials() else {
            return Ok(None);
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Some(Self {
            client,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        }))
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorization_url(&self, state: &str, redirect_uri: &str) -> Result<String, IdentityError> {
        let url = Url::parse_with_params(
            GOOGLE_AUTHORIZE_URL,
            &[
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("scope", GOOGLE_SCOPES),
                ("state", state),
            ],
        )?;
        Ok(url.into())
    }

    async fn exchange(&self, code: &str, redirect_uri: &str) -> Result<IdentityAssertion, IdentityError> {
        let token_response = self
            .client
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;

        if !token_response.status().is_success() {
            return Err(IdentityError::Provider(format!(
                "token endpoint answered {}",
                token_response.status()
            )));
        }
        let token: TokenResponse = token_response.json().await?;

        let info: UserInfo = self
            .client
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        assertion_from_userinfo(info)
    }
}

fn assertion_from_userinfo(info: UserInfo) -> Result<IdentityAssertion, IdentityError> {
    if info.email_verified == Some(false) {
        return Err(IdentityError::UnverifiedEmail);
    }

    let email = info
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .ok_or(IdentityError::MissingProfile)?;

    Ok(IdentityAssertion {
        email,
        name: info.name.unwrap_or_default(),
        picture: info.picture.filter(|p| !p.is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> GoogleProvider {
        GoogleProvider::from_config(&IdentityConfig {
            google_client_id: Some("client-123".into()),
            google_client_secret: Some("shh".into()),
            request_timeout_secs: 5,
        })
        .unwrap()
        .unwrap()
    }

    #[test]
    fn provider_disabled_without_credentials() {
        let config = IdentityConfig {
            google_client_id: None,
            google_client_secret: Some("shh".into()),
            request_timeout_secs: 5,
        };
        assert!(GoogleProvider::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn authorization_url_carries_state_and_callback() {
        let url = provider()
            .authorization_url("st4te", "http://localhost:5001/auth/google/callback")
            .unwrap();
        let parsed = Url::parse(&url).unwrap();
        let pairs: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();

        assert_eq!(parsed.host_str(), Some("accounts.google.com"));
        assert_eq!(pairs["state"], "st4te");
        assert_eq!(pairs["client_id"], "client-123");
        assert_eq!(pairs["redirect_uri"], "http://localhost:5001/auth/google/callback");
        assert_eq!(pairs["scope"], "openid email profile");
    }

    #[test]
    fn userinfo_without_email_is_rejected() {
        let info = UserInfo {
            email: Some("  ".into()),
            email_verified: None,
            name: Some("No Mail".into()),
            picture: None,
        };
        assert!(matches!(
            assertion_from_userinfo(info),
            Err(IdentityError::MissingProfile)
        ));
    }

    #[test]
    fn unverified_email_is_rejected() {
        let info = UserInfo {
            email: Some("a@example.com".into()),
            email_verified: Some(false),
            name: None,
            picture: None,
        };
        assert!(matches!(
            assertion_from_userinfo(info),
            Err(IdentityError::UnverifiedEmail)
        ));
    }

    #[test]
    fn userinfo_maps_to_assertion() {
        let info = UserInfo {
            email: Some("a@example.com".into()),
            email_verified: Some(true),
            name: None,
            picture: Some("https://img/a.png".into()),
        };
        let assertion = assertion_from_userinfo(info).unwrap();
        assert_eq!(assertion.email, "a@example.com");
        assert_eq!(assertion.name, "");
        assert_eq!(assertion.picture.as_deref(), Some("https://img/a.png"));
    }
}
