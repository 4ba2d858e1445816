use async_trait::async_trait;
use thiserror::Error;

pub mod http;

pub use http::HttpObjectStorage;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Storage rejected '{key}' with status {status}")]
    Rejected { key: String, status: u16 },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Durable object storage for ticket code images.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores `bytes` under `key` and returns the public URL of the object.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}
