use actix_web::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("No image file provided")]
    MissingImage,
    #[error("Image exceeds maximum size of {0} bytes")]
    ImageTooLarge(usize),
    #[error("Failed to read upload: {0}")]
    Upload(String),
    #[error("Inference backend not ready: {0}")]
    BackendUnavailable(String),
    #[error("Inference backend error: {0}")]
    Backend(String),
    #[error("Malformed backend response: {0}")]
    MalformedResponse(#[from] serde_json::Error),
}

impl DetectionError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DetectionError::MissingImage | DetectionError::ImageTooLarge(_) => {
                StatusCode::BAD_REQUEST
            }
            DetectionError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            DetectionError::Upload(_)
            | DetectionError::Backend(_)
            | DetectionError::MalformedResponse(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
