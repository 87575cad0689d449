pub mod config;
pub mod error;
pub mod guard;
pub mod session;
pub mod upload;

// Re-export common error type
pub use error::{Result, SnapError};
