use aws_sdk_rekognition::Client;
use aws_sdk_rekognition::error::SdkError;
use aws_sdk_rekognition::operation::detect_custom_labels::DetectCustomLabelsError;
use aws_sdk_rekognition::primitives::Blob;
use aws_sdk_rekognition::types::{CustomLabel, Image, TextDetection};
use futures::FutureExt;
use futures::future::BoxFuture;
use shared::{BackendKind, BoundingBox};

use super::backend_error;
use crate::config::app_config::CustomLabelsConfig;
use crate::detection::detection_service::{InferenceBackend, TextDetector};
use crate::detection::error::DetectionError;
use crate::detection::models::{DetectedTextToken, ImageUpload, NamedLabel, RawDetections};

/// Rekognition Custom Labels model version that names horses directly.
#[derive(Clone)]
pub struct CustomLabelsService {
    client: Client,
    project_version_arn: String,
    min_confidence: f32,
    max_results: i32,
}

impl CustomLabelsService {
    pub fn new(client: Client, config: &CustomLabelsConfig) -> Self {
        Self {
            client,
            project_version_arn: config.project_version_arn.clone(),
            min_confidence: config.min_confidence,
            max_results: config.max_results,
        }
    }

    pub async fn detect_custom_labels(
        &self,
        image_data: &[u8],
    ) -> Result<Vec<NamedLabel>, DetectionError> {
        let output = self
            .client
            .detect_custom_labels()
            .project_version_arn(&self.project_version_arn)
            .image(image(image_data))
            .min_confidence(self.min_confidence)
            .max_results(self.max_results)
            .send()
            .await
            .map_err(custom_labels_error)?;

        Ok(output.custom_labels().iter().filter_map(named_label).collect())
    }
}

impl InferenceBackend for CustomLabelsService {
    fn kind(&self) -> BackendKind {
        BackendKind::CustomLabels
    }

    fn detect<'a>(
        &'a self,
        image: &'a ImageUpload,
    ) -> BoxFuture<'a, Result<RawDetections, DetectionError>> {
        async move {
            let labels = self.detect_custom_labels(&image.bytes).await?;
            Ok(RawDetections::Named(labels))
        }
        .boxed()
    }
}

/// Rekognition text detection, used to read ID tags.
#[derive(Clone)]
pub struct TextDetectionService {
    client: Client,
}

impl TextDetectionService {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn detect_text(
        &self,
        image_data: &[u8],
    ) -> Result<Vec<DetectedTextToken>, DetectionError> {
        let output = self
            .client
            .detect_text()
            .image(image(image_data))
            .send()
            .await
            .map_err(|e| backend_error(e, |_| false))?;

        Ok(output.text_detections().iter().filter_map(text_token).collect())
    }
}

impl TextDetector for TextDetectionService {
    fn detect_text<'a>(
        &'a self,
        image: &'a ImageUpload,
    ) -> BoxFuture<'a, Result<Vec<DetectedTextToken>, DetectionError>> {
        TextDetectionService::detect_text(self, &image.bytes).boxed()
    }
}

/// A stopped project version surfaces as `ResourceNotReadyException`.
pub(crate) fn custom_labels_error<R>(err: SdkError<DetectCustomLabelsError, R>) -> DetectionError
where
    R: std::fmt::Debug,
{
    backend_error(err, DetectCustomLabelsError::is_resource_not_ready_exception)
}

fn image(image_data: &[u8]) -> Image {
    Image::builder().bytes(Blob::new(image_data.to_vec())).build()
}

fn named_label(label: &CustomLabel) -> Option<NamedLabel> {
    let Some(name) = label.name() else {
        log::warn!("Skipping custom label without a name");
        return None;
    };

    let bounding_box = label
        .geometry()
        .and_then(|geometry| geometry.bounding_box())
        .map(|b| BoundingBox {
            left: b.left().unwrap_or_default() as f64,
            top: b.top().unwrap_or_default() as f64,
            width: b.width().unwrap_or_default() as f64,
            height: b.height().unwrap_or_default() as f64,
        });

    Some(NamedLabel {
        name: name.to_string(),
        confidence: label.confidence().unwrap_or_default() as f64,
        bounding_box,
    })
}

fn text_token(detection: &TextDetection) -> Option<DetectedTextToken> {
    detection.detected_text().map(|text| DetectedTextToken {
        text: text.to_string(),
        confidence: detection.confidence().unwrap_or_default() as f64,
    })
}
