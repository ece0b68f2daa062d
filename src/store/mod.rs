mod hub;
mod local;
mod memory;

pub use hub::{ HubStore, RepoType };
pub use local::LocalStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use log::info;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use crate::cli::Args;

/// Identifies one blob: a file inside a repository.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlobKey {
    pub repo_id: String,
    pub path: String,
}

impl BlobKey {
    pub fn new(repo_id: impl Into<String>, path: impl Into<String>) -> Self {
        Self { repo_id: repo_id.into(), path: path.into() }
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.repo_id, self.path)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("'{0}' not found")]
    NotFound(BlobKey),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Whole-file blob storage. A `put` always replaces the entire blob.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn get(&self, key: &BlobKey) -> Result<Vec<u8>, StoreError>;

    async fn put(&self, key: &BlobKey, bytes: Vec<u8>) -> Result<(), StoreError>;
}

pub fn create_remote_store(
    args: &Args
) -> Result<Arc<dyn RemoteStore>, Box<dyn Error + Send + Sync>> {
    match args.store_type.to_lowercase().as_str() {
        "hub" => {
            let repo_type: RepoType = args.repo_type.parse()?;
            let store = HubStore::new(
                &args.hub_endpoint,
                repo_type,
                &args.revision,
                &args.hf_token
            )?;
            Ok(Arc::new(store))
        }
        "local" => Ok(Arc::new(LocalStore::new(&args.local_root))),
        "memory" => Ok(Arc::new(MemoryStore::new())),
        _ =>
            Err(
                Box::new(
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("Unsupported store type: {}", args.store_type)
                    )
                )
            ),
    }
}

pub fn initialize_remote_store(
    args: &Args
) -> Result<Arc<dyn RemoteStore>, Box<dyn Error + Send + Sync>> {
    info!(
        "Dataset will be stored in: {} ({}/{})",
        args.store_type,
        args.repo_id,
        args.data_filename
    );
    create_remote_store(args)
}
