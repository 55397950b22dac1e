use aws_sdk_sagemakerruntime::Client;
use aws_sdk_sagemakerruntime::error::SdkError;
use aws_sdk_sagemakerruntime::operation::invoke_endpoint::InvokeEndpointError;
use aws_sdk_sagemakerruntime::primitives::Blob;
use futures::FutureExt;
use futures::future::BoxFuture;
use shared::BackendKind;

use super::backend_error;
use crate::config::app_config::ObjectDetectionConfig;
use crate::detection::detection_service::InferenceBackend;
use crate::detection::error::DetectionError;
use crate::detection::models::{ImageUpload, ObjectDetectionResponse, RawDetections};

const DEFAULT_CONTENT_TYPE: &str = "application/x-image";

/// SageMaker endpoint hosting an object-detection model trained on the
/// labeled horse images. Returns class indices and pixel boxes.
#[derive(Clone)]
pub struct ObjectDetectionService {
    client: Client,
    endpoint_name: String,
}

impl ObjectDetectionService {
    pub fn new(client: Client, config: &ObjectDetectionConfig) -> Self {
        Self {
            client,
            endpoint_name: config.endpoint_name.clone(),
        }
    }

    pub async fn invoke(
        &self,
        image_data: &[u8],
        content_type: Option<&str>,
    ) -> Result<ObjectDetectionResponse, DetectionError> {
        let output = self
            .client
            .invoke_endpoint()
            .endpoint_name(&self.endpoint_name)
            .content_type(request_content_type(content_type))
            .accept("application/json")
            .body(Blob::new(image_data.to_vec()))
            .send()
            .await
            .map_err(invoke_endpoint_error)?;

        match output.body() {
            Some(body) => parse_response(body.as_ref()),
            None => {
                log::warn!("Endpoint {} returned an empty body", self.endpoint_name);
                Ok(ObjectDetectionResponse::default())
            }
        }
    }
}

impl InferenceBackend for ObjectDetectionService {
    fn kind(&self) -> BackendKind {
        BackendKind::ObjectDetection
    }

    fn detect<'a>(
        &'a self,
        image: &'a ImageUpload,
    ) -> BoxFuture<'a, Result<RawDetections, DetectionError>> {
        async move {
            let response = self
                .invoke(&image.bytes, image.content_type.as_deref())
                .await?;
            Ok(RawDetections::Indexed(response.predictions))
        }
        .boxed()
    }
}

/// An endpoint still scaling up or with no running model surfaces as
/// `ModelNotReadyException`.
pub(crate) fn invoke_endpoint_error<R>(err: SdkError<InvokeEndpointError, R>) -> DetectionError
where
    R: std::fmt::Debug,
{
    backend_error(err, InvokeEndpointError::is_model_not_ready_exception)
}

fn request_content_type(content_type: Option<&str>) -> &str {
    match content_type {
        Some(mime) if mime.starts_with("image/") => mime,
        _ => DEFAULT_CONTENT_TYPE,
    }
}

fn parse_response(body: &[u8]) -> Result<ObjectDetectionResponse, DetectionError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ObjectDetectionResponse::default());
    }
    Ok(serde_json::from_slice(body)?)
}
