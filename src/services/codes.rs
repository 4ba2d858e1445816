use std::io::Cursor;
use std::sync::Arc;

use image::{ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

use crate::storage::{ObjectStorage, StorageError};

const PNG_CONTENT_TYPE: &str = "image/png";
const MODULE_PIXELS: u32 = 10;
const LOGGED_CODE_CHARS: usize = 8;

#[derive(Debug, Error)]
pub enum CodeIssueError {
    #[error("Failed to render ticket code: {0}")]
    Render(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IssuedCode {
    pub code: String,
    pub image_url: String,
}

/// Mints ticket codes and keeps their scannable images in object storage.
pub struct TicketCodeIssuer {
    storage: Arc<dyn ObjectStorage>,
}

impl TicketCodeIssuer {
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self { storage }
    }

    /// Generates a fresh random code, renders it and uploads the image.
    pub async fn issue(&self) -> Result<IssuedCode, CodeIssueError> {
        let code = generate_code();
        let png = render_png(&code)?;
        let image_url = self.storage.put(&storage_key(&code), png, PNG_CONTENT_TYPE).await?;
        debug!(code = %code_prefix(&code), "Issued ticket code");
        Ok(IssuedCode { code, image_url })
    }

    /// Best-effort removal of a code's image. Failures are logged and reported as `false`, never
    /// raised; a failed delete leaves an orphaned object behind.
    pub async fn delete(&self, code: &str) -> bool {
        match self.storage.delete(&storage_key(code)).await {
            Ok(()) => {
                debug!(code = %code_prefix(code), "Deleted ticket code image");
                true
            }
            Err(e) => {
                error!(code = %code_prefix(code), error = %e, "Failed to delete ticket code image, object left orphaned");
                false
            }
        }
    }
}

/// Version 4 UUIDs come from the OS CSPRNG, which makes collisions negligible without any
/// coordination between requests.
pub fn generate_code() -> String {
    Uuid::new_v4().to_string()
}

/// Enough of a code to correlate log lines. Full codes never reach the logs.
pub fn code_prefix(code: &str) -> String {
    code.chars().take(LOGGED_CODE_CHARS).collect()
}

pub fn storage_key(code: &str) -> String {
    format!("qr_codes/{code}.png")
}

/// The image encodes the code and nothing else.
pub fn render_png(code: &str) -> Result<Vec<u8>, CodeIssueError> {
    let qr = QrCode::with_error_correction_level(code.as_bytes(), EcLevel::M)
        .map_err(|e| CodeIssueError::Render(e.to_string()))?;
    let image = qr
        .render::<Luma<u8>>()
        .quiet_zone(true)
        .module_dimensions(MODULE_PIXELS, MODULE_PIXELS)
        .build();

    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| CodeIssueError::Render(e.to_string()))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{capture_logs, MemoryStorage};

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    #[test]
    fn test_codes_are_unique() {
        let a = generate_code();
        let b = generate_code();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }

    #[test]
    fn test_render_png() {
        let png = render_png("5d1f6d1e-6a43-4f0e-9d55-0f3c3b7c2b11").unwrap();
        assert_eq!(&png[..8], &PNG_MAGIC);
    }

    #[tokio::test]
    async fn test_issue_then_delete() {
        let storage = Arc::new(MemoryStorage::default());
        let issuer = TicketCodeIssuer::new(storage.clone());

        let issued = issuer.issue().await.unwrap();
        let key = storage_key(&issued.code);
        assert_eq!(storage.keys(), vec![key.clone()]);
        assert!(issued.image_url.ends_with(&key));
        assert_eq!(&storage.get(&key).unwrap()[..8], &PNG_MAGIC);

        assert!(issuer.delete(&issued.code).await);
        assert!(storage.keys().is_empty());
    }

    #[tokio::test]
    async fn test_full_codes_stay_out_of_logs() {
        let storage = Arc::new(MemoryStorage::default().failing_deletes());
        let issuer = TicketCodeIssuer::new(storage);

        let (logs, _guard) = capture_logs(tracing::Level::DEBUG);
        let issued = issuer.issue().await.unwrap();
        issuer.delete(&issued.code).await;

        let logs = logs();
        assert!(logs.contains(&code_prefix(&issued.code)));
        assert!(!logs.contains(&issued.code));
    }

    #[tokio::test]
    async fn test_upload_failure_is_reported() {
        let issuer = TicketCodeIssuer::new(Arc::new(MemoryStorage::failing_at(1)));
        assert!(matches!(issuer.issue().await, Err(CodeIssueError::Storage(_))));
    }

    #[tokio::test]
    async fn test_delete_failure_is_swallowed() {
        let storage = Arc::new(MemoryStorage::default().failing_deletes());
        let issuer = TicketCodeIssuer::new(storage.clone());
        let issued = issuer.issue().await.unwrap();
        assert!(!issuer.delete(&issued.code).await);
        assert_eq!(storage.keys().len(), 1);
    }
}
