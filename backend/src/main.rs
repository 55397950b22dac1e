mod aws;
mod config;
mod detection;
mod routes;

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{middleware::Logger, web, App, HttpServer};
use aws::rekognition_service::{CustomLabelsService, TextDetectionService};
use aws::sagemaker_service::ObjectDetectionService;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_rekognition::Client as RekognitionClient;
use aws_sdk_sagemakerruntime::Client as SageMakerClient;
use config::app_config::{AppConfig, ConfigError};
use detection::detection_service::{DetectionService, InferenceBackend};
use routes::{configure_routes, UploadLimits};
use shared::BackendKind;
use std::env;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    } else {
        log::error!("Failed to get the current working directory.");
    }

    let app_config = AppConfig::load().map_err(startup_error)?;
    let classes = app_config.class_map();
    let horse_ids = app_config.horse_id_codes();
    log::info!(
        "Config v{}: backend {}, confidence threshold {}%, {} classes, {} ID codes",
        app_config.version,
        app_config.backend,
        app_config.min_confidence,
        classes.len(),
        horse_ids.len()
    );

    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = app_config.region.clone() {
        loader = loader.region(Region::new(region));
    }
    let aws_config = loader.load().await;

    let rekognition_client = RekognitionClient::new(&aws_config);
    let inference =
        inference_backend(&app_config, &aws_config, &rekognition_client).map_err(startup_error)?;
    let text = Arc::new(TextDetectionService::new(rekognition_client));

    let detection_service = DetectionService::new(
        inference,
        text,
        classes,
        horse_ids,
        app_config.min_confidence,
    );
    let limits = UploadLimits {
        max_upload_bytes: app_config.max_upload_bytes,
    };

    let port = env::var("PORT").unwrap_or_else(|_| "8081".to_string());
    let bind_address = format!("0.0.0.0:{}", port);

    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(cors())
            .app_data(web::Data::new(detection_service.clone()))
            .app_data(web::Data::new(limits))
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}

// The service is unauthenticated, so browsers only need to send the upload.
fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
        .max_age(3600)
}

fn inference_backend(
    app_config: &AppConfig,
    aws_config: &SdkConfig,
    rekognition_client: &RekognitionClient,
) -> Result<Arc<dyn InferenceBackend>, ConfigError> {
    let backend: Arc<dyn InferenceBackend> = match app_config.backend {
        BackendKind::CustomLabels => {
            let section = app_config
                .custom_labels
                .as_ref()
                .ok_or(ConfigError::MissingSection("custom_labels"))?;
            log::info!("Using custom labels model {}", section.project_version_arn);
            Arc::new(CustomLabelsService::new(rekognition_client.clone(), section))
        }
        BackendKind::ObjectDetection => {
            let section = app_config
                .object_detection
                .as_ref()
                .ok_or(ConfigError::MissingSection("object_detection"))?;
            log::info!("Using object detection endpoint {}", section.endpoint_name);
            Arc::new(ObjectDetectionService::new(
                SageMakerClient::new(aws_config),
                section,
            ))
        }
    };
    Ok(backend)
}

fn startup_error(e: ConfigError) -> std::io::Error {
    log::error!("Failed to load detection config: {}", e);
    std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("Config loading failed: {}", e),
    )
}
