//! Processed image retrieval.
//!
//! Fetches the user's processed images together with the label-detection
//! results the backend stored for each upload.

use crate::gateway::{ApiGateway, RequestOptions};
use serde::Deserialize;
use snaplabel_core::error::{Result, SnapError};
use std::sync::Arc;

const PROCESSED_IMAGE_PATH: &str = "/processedImage/get-processed-image";

/// One detected label, in the shape the detection service reports it.
///
/// The backend stores the raw detection response, so field names are
/// PascalCase on the wire. Fields other than these are dropped.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct DetectedLabel {
    pub name: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub categories: Vec<LabelName>,
    #[serde(default)]
    pub aliases: Vec<LabelName>,
}

/// Named sub-entry inside a label (category or alias).
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct LabelName {
    pub name: String,
}

/// One processed upload: the rendered artifact plus its detection results.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedImage {
    pub file_name: String,
    /// Reference to the rendered/processed artifact.
    #[serde(default)]
    pub processed_file: Option<String>,
    /// The raw label-detection response array.
    #[serde(default, rename = "rawAiResponse")]
    pub labels: Vec<DetectedLabel>,
}

/// The `data` payload of a processed-image listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessedImageSet {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub images: Vec<ProcessedImage>,
}

/// Client for the processed-image endpoint.
#[derive(Clone)]
pub struct ProcessedImagesApi {
    gateway: Arc<ApiGateway>,
}

impl ProcessedImagesApi {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self { gateway }
    }

    /// Fetches the processed images recorded for `email`.
    ///
    /// An empty result set is reported as an error with the backend's
    /// wording so the dashboard shows one consistent message.
    pub async fn processed_images(&self, email: &str) -> Result<ProcessedImageSet> {
        if email.trim().is_empty() {
            return Err(SnapError::validation(
                "Email is required to fetch processed images",
            ));
        }

        let set: ProcessedImageSet = self
            .gateway
            .get_data(
                PROCESSED_IMAGE_PATH,
                RequestOptions::with_query(vec![("email".to_string(), email.to_string())]),
            )
            .await?;

        if set.images.is_empty() {
            return Err(SnapError::server(
                404,
                "No processed images found matching the criteria",
            ));
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processed_image_decodes_wire_shape() {
        let json = r#"{
            "count": 1,
            "images": [{
                "fileName": "cat.png.json",
                "processedFile": "https://cdn.example.com/cat-rendered.png",
                "rawAiResponse": [{
                    "Name": "Cat",
                    "Confidence": 98.7,
                    "Categories": [{"Name": "Animals and Pets"}],
                    "Aliases": [{"Name": "Kitten"}]
                }]
            }]
        }"#;
        let set: ProcessedImageSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.count, 1);
        let image = &set.images[0];
        assert_eq!(image.file_name, "cat.png.json");
        assert_eq!(image.labels[0].name, "Cat");
        assert_eq!(image.labels[0].categories[0].name, "Animals and Pets");
        assert!((image.labels[0].confidence - 98.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_label_tolerates_missing_optional_fields() {
        let label: DetectedLabel = serde_json::from_str(r#"{"Name": "Dog"}"#).unwrap();
        assert_eq!(label.name, "Dog");
        assert!(label.categories.is_empty());
        assert!(label.aliases.is_empty());
    }
}
