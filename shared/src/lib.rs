use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Box expressed as fractions of the image dimensions.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// One named horse detection as returned to the client.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DetectedLabel {
    pub name: String,
    /// Percent, 0 to 100.
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResponse {
    pub success: bool,
    pub labels: Vec<DetectedLabel>,
    pub total_labels: usize,
}

impl DetectionResponse {
    pub fn new(labels: Vec<DetectedLabel>) -> Self {
        Self {
            success: true,
            total_labels: labels.len(),
            labels,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Which hosted inference service produces the raw detections.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BackendKind {
    CustomLabels,
    ObjectDetection,
}
