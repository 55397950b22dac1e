use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use futures::{StreamExt, TryStreamExt};
use log::{error, info, warn};
use shared::{DetectionResponse, ErrorResponse};
use uuid::Uuid;

use crate::detection::detection_service::DetectionService;
use crate::detection::error::DetectionError;
use crate::detection::models::ImageUpload;

const IMAGE_FIELD: &str = "image";

#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_upload_bytes: usize,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/detect-horse").route(web::post().to(detect_horse)))
        // legacy path the upload page posts to
        .service(web::resource("/api/rekognition").route(web::post().to(detect_horse)));
}

async fn detect_horse(
    req: HttpRequest,
    detection: web::Data<DetectionService>,
    limits: web::Data<UploadLimits>,
    payload: Multipart,
) -> HttpResponse {
    let request_id = Uuid::new_v4();

    let image = match read_image(&req, payload, limits.max_upload_bytes).await {
        Ok(image) => image,
        Err(e) => return error_response(request_id, &e),
    };

    info!(
        "[{}] Processing image: {}, size: {} bytes, backend: {}",
        request_id,
        image.file_name.as_deref().unwrap_or("<unnamed>"),
        image.bytes.len(),
        detection.backend_kind()
    );

    match detection.detect(&image).await {
        Ok(labels) => {
            let names: Vec<&str> = labels.iter().map(|l| l.name.as_str()).collect();
            info!("[{}] Labels: {}", request_id, names.join(", "));
            HttpResponse::Ok().json(DetectionResponse::new(labels))
        }
        Err(e) => error_response(request_id, &e),
    }
}

/// Pulls the `image` field out of the multipart body. Other fields are read
/// and discarded.
async fn read_image(
    req: &HttpRequest,
    mut payload: Multipart,
    max_upload_bytes: usize,
) -> Result<ImageUpload, DetectionError> {
    let is_multipart = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"));
    if !is_multipart {
        return Err(DetectionError::MissingImage);
    }

    let mut image: Option<ImageUpload> = None;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| DetectionError::Upload(e.to_string()))?
    {
        if field.name() != Some(IMAGE_FIELD) || image.is_some() {
            while let Some(chunk) = field.next().await {
                chunk.map_err(|e| DetectionError::Upload(e.to_string()))?;
            }
            continue;
        }

        let content_type = field.content_type().map(|mime| mime.to_string());
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let data = chunk.map_err(|e| DetectionError::Upload(e.to_string()))?;
            if bytes.len() + data.len() > max_upload_bytes {
                return Err(DetectionError::ImageTooLarge(max_upload_bytes));
            }
            bytes.extend_from_slice(&data);
        }

        image = Some(ImageUpload {
            bytes,
            content_type,
            file_name,
        });
    }

    image
        .filter(|image| !image.bytes.is_empty())
        .ok_or(DetectionError::MissingImage)
}

fn error_response(request_id: Uuid, err: &DetectionError) -> HttpResponse {
    let status = err.status_code();
    let body = match err {
        DetectionError::MissingImage | DetectionError::ImageTooLarge(_) => ErrorResponse {
            error: err.to_string(),
            details: None,
        },
        DetectionError::BackendUnavailable(_) => ErrorResponse {
            error: "Model is not running, please start the model first.".to_string(),
            details: None,
        },
        _ => ErrorResponse {
            error: "Failed to analyze image".to_string(),
            details: Some(err.to_string()),
        },
    };

    if status.is_server_error() {
        error!("[{}] Detection failed: {}", request_id, err);
    } else {
        warn!("[{}] Rejected upload: {}", request_id, err);
    }

    HttpResponse::build(status).json(body)
}
