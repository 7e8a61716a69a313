use std::sync::Arc;

use thiserror::Error;

use crate::auth::{GoogleProvider, IdentityError, IdentityProvider, SessionError, SessionKeys};
use crate::config::AppConfig;
use crate::store::DataStore;

#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Identity(#[from] IdentityError),
}

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: DataStore,
    pub keys: SessionKeys,
    pub identity: Option<Arc<dyn IdentityProvider>>,
}

impl AppState {
    pub fn from_config(config: AppConfig) -> Result<Self, StateError> {
        let keys = SessionKeys::from_config(&config.session)?;
        let identity = GoogleProvider::from_config(&config.identity)?
            .map(|provider| Arc::new(provider) as Arc<dyn IdentityProvider>);

        if identity.is_none() {
            tracing::info!("identity provider credentials not set; single sign-on disabled");
        }

        Ok(Self {
            store: DataStore::new(&config.storage.data_dir),
            config: Arc::new(config),
            keys,
            identity,
        })
    }

    /// Replace the identity provider, e.g. with a stub in tests.
    pub fn with_identity_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(provider);
        self
    }
}
