//! Media endpoints.
//!
//! Signed-URL issuance goes through the gateway (and therefore carries both
//! the bearer token and the service access token). The binary transfer that
//! follows goes straight to the signed URL with a bare client: the URL
//! carries its own authorization and must not receive session headers.

use crate::gateway::{ApiGateway, RequestOptions};
use futures::StreamExt;
use serde::Deserialize;
use snaplabel_core::error::{Result, SnapError};
use snaplabel_core::upload::{ACCEPTED_CONTENT_TYPE, MediaBackend, ProgressFn, UploadSlot};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const SIGNED_URL_PATH: &str = "/media/generate-signed-url";

/// Chunk size for the streamed transfer body; each chunk yields one
/// progress callback.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// The signed-URL payload. Canonical shape is `signedUrl` + `fileName`;
/// fields are optional here so a legacy or broken response is rejected with
/// a clear message instead of a decode error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignedUrlData {
    #[serde(default)]
    signed_url: Option<String>,
    #[serde(default)]
    file_name: Option<String>,
}

impl SignedUrlData {
    fn into_slot(self) -> Result<UploadSlot> {
        match (self.signed_url, self.file_name) {
            (Some(signed_url), Some(remote_key))
                if !signed_url.is_empty() && !remote_key.is_empty() =>
            {
                Ok(UploadSlot {
                    signed_url,
                    remote_key,
                })
            }
            _ => Err(SnapError::unexpected(
                "Server returned an invalid signed URL response",
            )),
        }
    }
}

/// Client for signed-URL issuance and the direct binary transfer.
#[derive(Clone)]
pub struct MediaApi {
    gateway: Arc<ApiGateway>,
    /// Bare client for the signed-URL PUT; no credential attachment.
    transfer_client: reqwest::Client,
}

impl MediaApi {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self {
            gateway,
            transfer_client: reqwest::Client::new(),
        }
    }

    /// Asks the backend for a pre-authorized upload destination.
    pub async fn generate_signed_url(&self) -> Result<UploadSlot> {
        let data: SignedUrlData = self
            .gateway
            .get_data(SIGNED_URL_PATH, RequestOptions::service_token())
            .await?;
        data.into_slot()
    }

    async fn put_to_signed_url(
        &self,
        slot: &UploadSlot,
        bytes: Vec<u8>,
        on_progress: ProgressFn,
    ) -> Result<()> {
        let total = bytes.len();
        let sent = Arc::new(AtomicUsize::new(0));
        let on_progress = Arc::new(on_progress);

        let chunks: Vec<Vec<u8>> = bytes
            .chunks(UPLOAD_CHUNK_SIZE)
            .map(|chunk| chunk.to_vec())
            .collect();
        let stream = futures::stream::iter(chunks).map(move |chunk| {
            let done = sent.fetch_add(chunk.len(), Ordering::SeqCst) + chunk.len();
            on_progress(progress_percent(done, total));
            Ok::<_, std::io::Error>(chunk)
        });

        let response = self
            .transfer_client
            .put(&slot.signed_url)
            .header(reqwest::header::CONTENT_TYPE, ACCEPTED_CONTENT_TYPE)
            .body(reqwest::Body::wrap_stream(stream))
            .send()
            .await
            .map_err(|err| {
                tracing::warn!(error = %err, "transfer received no response");
                SnapError::NoResponse
            })?;

        if !response.status().is_success() {
            return Err(SnapError::server(
                response.status().as_u16(),
                "Failed to upload image to storage",
            ));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl MediaBackend for MediaApi {
    async fn request_upload_slot(&self) -> Result<UploadSlot> {
        self.generate_signed_url().await
    }

    async fn transfer(
        &self,
        slot: &UploadSlot,
        bytes: Vec<u8>,
        on_progress: ProgressFn,
    ) -> Result<()> {
        self.put_to_signed_url(slot, bytes, on_progress).await
    }
}

fn progress_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done * 100) / total).min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_shape_accepted() {
        let data: SignedUrlData = serde_json::from_str(
            r#"{"signedUrl": "https://bucket/obj?sig=abc", "fileName": "k123"}"#,
        )
        .unwrap();
        let slot = data.into_slot().unwrap();
        assert_eq!(slot.signed_url, "https://bucket/obj?sig=abc");
        assert_eq!(slot.remote_key, "k123");
    }

    #[test]
    fn test_legacy_localized_key_rejected() {
        // The older call site's `"signed url"` key is not the canonical
        // shape; it decodes to an empty payload and is rejected.
        let data: SignedUrlData =
            serde_json::from_str(r#"{"signed url": "https://bucket/obj"}"#).unwrap();
        assert!(data.into_slot().is_err());
    }

    #[test]
    fn test_missing_remote_key_rejected() {
        let data: SignedUrlData =
            serde_json::from_str(r#"{"signedUrl": "https://bucket/obj"}"#).unwrap();
        assert!(data.into_slot().is_err());
    }

    #[test]
    fn test_progress_percent_bounds() {
        assert_eq!(progress_percent(0, 100), 0);
        assert_eq!(progress_percent(50, 100), 50);
        assert_eq!(progress_percent(100, 100), 100);
        assert_eq!(progress_percent(7, 3), 100);
        // Empty file reports complete immediately.
        assert_eq!(progress_percent(0, 0), 100);
    }
}
