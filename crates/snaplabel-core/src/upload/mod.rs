//! Upload lifecycle module.
//!
//! Drives a single selected file from validation through signed-URL
//! acquisition and direct transfer.
//!
//! # Module Structure
//!
//! - `model`: `UploadTask`, `UploadStatus`, `UploadSlot`
//! - `manager`: The lifecycle state machine (`UploadManager`) and the
//!   `MediaBackend` trait it drives

mod manager;
mod model;

// Re-export public API
pub use manager::{MediaBackend, ProgressFn, UploadManager};
pub use model::{ACCEPTED_CONTENT_TYPE, UploadSlot, UploadStatus, UploadTask};
