pub mod rekognition_service;
pub mod sagemaker_service;

use aws_sdk_rekognition::error::{DisplayErrorContext, SdkError};

use crate::detection::error::DetectionError;

/// Maps an SDK failure to a detection error. `not_ready` recognizes the
/// operation's "model is not running" exception.
pub(crate) fn backend_error<E, R>(err: SdkError<E, R>, not_ready: fn(&E) -> bool) -> DetectionError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    if let Some(service_err) = err.as_service_error() {
        if not_ready(service_err) {
            return DetectionError::BackendUnavailable(
                DisplayErrorContext(service_err).to_string(),
            );
        }
    }
    DetectionError::Backend(DisplayErrorContext(&err).to_string())
}
