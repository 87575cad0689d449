//! HTTP client surface for the snaplabel backend.
//!
//! The [`gateway::ApiGateway`] is the single dispatch point for every
//! credentialed request; the typed APIs (`auth`, `media`, `processed`) are
//! thin wrappers over it. The one exception is the signed-URL binary
//! transfer in [`media`], which deliberately bypasses the gateway.

pub mod auth;
pub mod gateway;
pub mod media;
pub mod processed;

pub use auth::{Ack, AuthApi};
pub use gateway::{ApiGateway, RequestOptions};
pub use media::MediaApi;
pub use processed::{
    DetectedLabel, LabelName, ProcessedImage, ProcessedImageSet, ProcessedImagesApi,
};
