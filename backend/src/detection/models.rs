use serde::{Deserialize, Deserializer};
use serde_json::Value;
use shared::BoundingBox;

/// The uploaded image as received by the handler.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

/// Label from the custom-label detector. Confidence is already 0-100 and the
/// box is already fractional.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedLabel {
    pub name: String,
    pub confidence: f64,
    pub bounding_box: Option<BoundingBox>,
}

/// Annotation from the object-detection endpoint, in pixels.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Annotation {
    #[serde(default, deserialize_with = "deserialize_class_id")]
    pub class_id: Option<u32>,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ImageSize {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub image_size: Option<ImageSize>,
}

/// Body returned by the object-detection endpoint.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ObjectDetectionResponse {
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

/// Raw output of whichever inference backend is configured.
#[derive(Debug, Clone, PartialEq)]
pub enum RawDetections {
    Named(Vec<NamedLabel>),
    Indexed(Vec<Prediction>),
}

impl RawDetections {
    pub fn len(&self) -> usize {
        match self {
            RawDetections::Named(labels) => labels.len(),
            RawDetections::Indexed(predictions) => {
                predictions.iter().map(|p| p.annotations.len()).sum()
            }
        }
    }
}

/// Text found in the image by the text-detection service.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedTextToken {
    pub text: String,
    pub confidence: f64,
}

// The endpoint may emit class ids as `0` or `0.0`. Anything that is not a
// non-negative integral number becomes `None` and never matches the class map.
fn deserialize_class_id<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let class_id = match value {
        Some(Value::Number(n)) => {
            if let Some(id) = n.as_u64() {
                u32::try_from(id).ok()
            } else {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u32::MAX as f64)
                    .map(|f| f as u32)
            }
        }
        Some(Value::String(s)) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    Ok(class_id)
}
