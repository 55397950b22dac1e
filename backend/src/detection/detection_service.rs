use futures::future::BoxFuture;
use shared::{BackendKind, DetectedLabel};
use std::sync::Arc;

use super::error::DetectionError;
use super::id_tag::apply_id_tag_override;
use super::lookup::{ClassMap, HorseIdCodeMap};
use super::models::{DetectedTextToken, ImageUpload, RawDetections};
use super::normalizer::normalize;

/// A hosted model that finds horses in an image.
pub trait InferenceBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    fn detect<'a>(
        &'a self,
        image: &'a ImageUpload,
    ) -> BoxFuture<'a, Result<RawDetections, DetectionError>>;
}

/// A hosted service that reads text in an image.
pub trait TextDetector: Send + Sync {
    fn detect_text<'a>(
        &'a self,
        image: &'a ImageUpload,
    ) -> BoxFuture<'a, Result<Vec<DetectedTextToken>, DetectionError>>;
}

#[derive(Clone)]
pub struct DetectionService {
    inference: Arc<dyn InferenceBackend>,
    text: Arc<dyn TextDetector>,
    classes: Arc<ClassMap>,
    horse_ids: Arc<HorseIdCodeMap>,
    min_confidence: f64,
}

impl DetectionService {
    pub fn new(
        inference: Arc<dyn InferenceBackend>,
        text: Arc<dyn TextDetector>,
        classes: ClassMap,
        horse_ids: HorseIdCodeMap,
        min_confidence: f64,
    ) -> Self {
        Self {
            inference,
            text,
            classes: Arc::new(classes),
            horse_ids: Arc::new(horse_ids),
            min_confidence,
        }
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.inference.kind()
    }

    /// Runs both backends on the image and returns the labels to report.
    pub async fn detect(&self, image: &ImageUpload) -> Result<Vec<DetectedLabel>, DetectionError> {
        let (raw, tokens) = futures::try_join!(
            self.inference.detect(image),
            self.text.detect_text(image)
        )?;

        log::info!(
            "{} returned {} raw detection(s), text service returned {} token(s)",
            self.inference.kind(),
            raw.len(),
            tokens.len()
        );
        if !tokens.is_empty() {
            let texts: Vec<String> = tokens
                .iter()
                .map(|t| format!("{} ({:.1}%)", t.text, t.confidence))
                .collect();
            log::info!("Detected text: {}", texts.join(", "));
        }

        let mut labels = normalize(raw, &self.classes, self.min_confidence);
        let matched = apply_id_tag_override(&mut labels, &tokens, &self.horse_ids);
        if matched > 0 {
            log::info!("{} token(s) matched a known ID tag", matched);
        }

        Ok(labels)
    }
}
