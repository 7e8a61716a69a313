//! Flat-file JSON storage.
//!
//! Every lookup parses its backing document from disk; nothing is cached
//! between calls. Writes replace the whole document and are not guarded
//! against concurrent writers.

pub mod models;
pub mod tenants;
pub mod users;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub use models::{PlatformConfig, Project, ProjectSet, Role, Tenant, TenantConfig, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed document {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Handle on the data directory.
#[derive(Debug, Clone)]
pub struct DataStore {
    root: PathBuf,
}

impl DataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn platform_path(&self) -> PathBuf {
        self.root.join("platform.json")
    }

    fn tenants_path(&self) -> PathBuf {
        self.root.join("tenants.json")
    }

    fn users_path(&self) -> PathBuf {
        self.root.join("users.json")
    }

    fn tenant_dir(&self, slug: &str) -> PathBuf {
        self.root.join("tenants").join(slug)
    }

    /// Platform-wide settings; an absent file yields the empty default.
    pub async fn platform_config(&self) -> Result<PlatformConfig, StoreError> {
        Ok(read_document(&self.platform_path()).await?.unwrap_or_default())
    }

    /// Read a document, returning `None` when the file does not exist.
    pub(crate) async fn read<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>, StoreError> {
        read_document(path).await
    }

    pub(crate) async fn write<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), StoreError> {
        write_document(path, value).await
    }
}

async fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

async fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    // serde_json writes non-ASCII verbatim; pretty output keeps the files
    // hand-editable.
    let mut body = serde_json::to_vec_pretty(value)?;
    body.push(b'\n');

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    tokio::fs::write(path, body)
        .await
        .map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
}
