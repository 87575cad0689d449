//! Upload domain models.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The only content type the upload flow accepts.
pub const ACCEPTED_CONTENT_TYPE: &str = "image/png";

/// Lifecycle states of an upload attempt.
///
/// `Succeeded` and `Failed` are terminal until a new file selection resets
/// the task to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadStatus {
    /// No file selected.
    Idle,
    /// Content-type check in progress.
    Validating,
    /// File accepted, waiting for the user to start the upload.
    Ready,
    /// Asking the backend for a pre-authorized destination.
    RequestingUrl,
    /// Binary transfer to the signed URL in flight.
    Uploading,
    Succeeded,
    Failed,
}

impl UploadStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Ready => "ready",
            Self::RequestingUrl => "requesting-url",
            Self::Uploading => "uploading",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

/// One user-initiated upload attempt.
///
/// Created on file selection, replaced on the next selection or an explicit
/// clear. The `generation` stamp ties async completions back to the attempt
/// they belong to; a completion whose generation no longer matches the
/// current task is discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTask {
    /// Unique id of this attempt.
    pub id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub status: UploadStatus,
    /// Transfer progress, 0-100.
    pub progress_percent: u8,
    /// Backend-assigned key for the uploaded object, set on success.
    pub remote_key: Option<String>,
    pub error_message: Option<String>,
    /// Monotonic selection counter; see struct docs.
    pub generation: u64,
}

impl UploadTask {
    /// An empty task in the `Idle` state.
    pub fn idle(generation: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_name: String::new(),
            content_type: String::new(),
            size_bytes: 0,
            status: UploadStatus::Idle,
            progress_percent: 0,
            remote_key: None,
            error_message: None,
            generation,
        }
    }
}

/// A pre-authorized upload destination issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSlot {
    /// Time-limited destination URL carrying its own authorization.
    pub signed_url: String,
    /// Backend-assigned identifier used to correlate processing results.
    pub remote_key: String,
}
