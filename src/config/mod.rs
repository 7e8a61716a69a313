use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub session: SessionConfig,
    pub identity: IdentityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Externally visible origin, used to build the sign-in callback URL.
    pub public_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(skip_serializing)]
    pub secret: String,
    pub ttl_hours: u64,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub google_client_id: Option<String>,
    #[serde(skip_serializing)]
    pub google_client_secret: Option<String>,
    pub request_timeout_secs: u64,
}

impl IdentityConfig {
    /// Delegated sign-in is only offered when both credentials are present.
    pub fn google_credentials(&self) -> Option<(&str, &str)> {
        match (
            self.google_client_id.as_deref(),
            self.google_client_secret.as_deref(),
        ) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Some((id, secret)),
            _ => None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("PORTAL_HOST") {
            self.server.host = v;
        }
        if let Some(port) = env::var("PORTAL_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse().ok())
        {
            self.server.port = port;
        }
        if let Ok(v) = env::var("PUBLIC_BASE_URL") {
            self.server.public_base_url = v.trim_end_matches('/').to_string();
        }

        // Storage overrides
        if let Ok(v) = env::var("PORTAL_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = env::var("PORTAL_TEMPLATES_DIR") {
            self.storage.templates_dir = PathBuf::from(v);
        }
        if let Ok(v) = env::var("PORTAL_STATIC_DIR") {
            self.storage.static_dir = PathBuf::from(v);
        }

        // Session overrides
        if let Ok(v) = env::var("SESSION_SECRET").or_else(|_| env::var("SECRET_KEY")) {
            self.session.secret = v;
        }
        if let Ok(v) = env::var("SESSION_TTL_HOURS") {
            self.session.ttl_hours = v.parse().unwrap_or(self.session.ttl_hours);
        }
        if let Ok(v) = env::var("SESSION_COOKIE_SECURE") {
            self.session.cookie_secure = v.parse().unwrap_or(self.session.cookie_secure);
        }

        // Identity overrides
        if let Ok(v) = env::var("GOOGLE_CLIENT_ID") {
            self.identity.google_client_id = Some(v);
        }
        if let Ok(v) = env::var("GOOGLE_CLIENT_SECRET") {
            self.identity.google_client_secret = Some(v);
        }
        if let Ok(v) = env::var("IDENTITY_REQUEST_TIMEOUT_SECS") {
            self.identity.request_timeout_secs =
                v.parse().unwrap_or(self.identity.request_timeout_secs);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5001,
                public_base_url: "http://127.0.0.1:5001".to_string(),
            },
            storage: StorageConfig::default_layout(),
            session: SessionConfig {
                secret: "platform-24-45-development-secret".to_string(),
                ttl_hours: 24 * 7,
                cookie_secure: false,
            },
            identity: IdentityConfig::empty(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                public_base_url: "https://staging.example.com".to_string(),
            },
            storage: StorageConfig::default_layout(),
            session: SessionConfig {
                secret: String::new(),
                ttl_hours: 24,
                cookie_secure: true,
            },
            identity: IdentityConfig::empty(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                public_base_url: "https://app.example.com".to_string(),
            },
            storage: StorageConfig::default_layout(),
            session: SessionConfig {
                secret: String::new(),
                ttl_hours: 12,
                cookie_secure: true,
            },
            identity: IdentityConfig::empty(),
        }
    }

    /// Configuration rooted at an arbitrary directory, used by tests and
    /// local tooling that should not depend on the process environment.
    pub fn for_root(root: impl Into<PathBuf>, secret: impl Into<String>) -> Self {
        let root = root.into();
        let mut config = Self::development();
        config.storage = StorageConfig {
            data_dir: root.join("data"),
            templates_dir: root.join("templates"),
            static_dir: root.join("static"),
        };
        config.session.secret = secret.into();
        config
    }

    /// Callback URL registered with the identity provider.
    pub fn google_callback_url(&self) -> String {
        format!("{}/auth/google/callback", self.server.public_base_url)
    }
}

impl StorageConfig {
    fn default_layout() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            templates_dir: PathBuf::from("templates"),
            static_dir: PathBuf::from("static"),
        }
    }
}

impl IdentityConfig {
    fn empty() -> Self {
        Self {
            google_client_id: None,
            google_client_secret: None,
            request_timeout_secs: 10,
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!(
            $crate::config::CONFIG.environment,
            $crate::config::Environment::Production
        )
    };
}
