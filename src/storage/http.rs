use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

use super::{ObjectStorage, StorageError};
use crate::config::StorageConfig;

/// Bucket storage reached over its REST API.
///
/// Objects are uploaded with `POST {base}/storage/v1/object/{bucket}/{key}`, removed with `DELETE`
/// on the same path, and served from `{base}/storage/v1/object/public/{bucket}/{key}`.
#[derive(Clone)]
pub struct HttpObjectStorage {
    client: Client,
    base_url: String,
    bucket: String,
    service_key: String,
}

impl HttpObjectStorage {
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            bucket: config.bucket.clone(),
            service_key: config.service_key.clone(),
        })
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, key)
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, self.bucket, key)
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, StorageError> {
        let response = self
            .client
            .post(self.object_url(key))
            .bearer_auth(&self.service_key)
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::Rejected {
                key: key.to_string(),
                status: status.as_u16(),
            });
        }
        debug!(key, "Stored object");
        Ok(self.public_url(key))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let response = self
            .client
            .delete(self.object_url(key))
            .bearer_auth(&self.service_key)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::Rejected {
                key: key.to_string(),
                status: status.as_u16(),
            });
        }
        debug!(key, "Deleted object");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_urls() {
        let storage = HttpObjectStorage::new(&StorageConfig {
            base_url: "https://storage.test".to_string(),
            service_key: "key".to_string(),
            bucket: "qr-codes".to_string(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();
        assert_eq!(
            storage.object_url("qr_codes/abc.png"),
            "https://storage.test/storage/v1/object/qr-codes/qr_codes/abc.png"
        );
        assert_eq!(
            storage.public_url("qr_codes/abc.png"),
            "https://storage.test/storage/v1/object/public/qr-codes/qr_codes/abc.png"
        );
    }
}
