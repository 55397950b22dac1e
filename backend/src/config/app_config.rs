use serde::Deserialize;
use shared::BackendKind;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::detection::lookup::{ClassMap, HorseIdCodeMap};

const DEFAULT_CONFIG_PATH: &str = "/usr/src/app/config/detection.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Missing '{0}' section for the selected backend")]
    MissingSection(&'static str),
    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    pub backend: BackendKind,
    #[serde(default)]
    pub region: Option<String>,
    /// Percent. Indexed detections scoring below this are dropped.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default)]
    pub custom_labels: Option<CustomLabelsConfig>,
    #[serde(default)]
    pub object_detection: Option<ObjectDetectionConfig>,
    #[serde(default)]
    pub class_map: HashMap<u32, String>,
    #[serde(default)]
    pub horse_ids: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomLabelsConfig {
    #[serde(default)]
    pub project_version_arn: String,
    /// Passed to the service as-is; the service filters before we see anything.
    #[serde(default)]
    pub min_confidence: f32,
    #[serde(default = "default_max_results")]
    pub max_results: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectDetectionConfig {
    #[serde(default)]
    pub endpoint_name: String,
}

fn default_version() -> u32 {
    1
}

fn default_min_confidence() -> f64 {
    4.0
}

fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_max_results() -> i32 {
    5
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        log::info!("Loading detection config from {}", path.display());

        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("DETECTION_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            return PathBuf::from(format!("{}/../config/detection.yaml", manifest_dir));
        }
        PathBuf::from(DEFAULT_CONFIG_PATH)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&config_str)
    }

    pub fn from_yaml(config_str: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(config_str)?)
    }

    /// Deployment-specific values may come from the environment instead of
    /// the file.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup("DETECTION_BACKEND") {
            self.backend = BackendKind::from_str(backend.trim()).map_err(|_| {
                ConfigError::InvalidValue(format!("unknown DETECTION_BACKEND '{}'", backend))
            })?;
        }
        if let Some(region) = lookup("AWS_REGION") {
            self.region = Some(region);
        }
        if let Some(arn) = lookup("REKOGNITION_PROJECT_VERSION_ARN") {
            self.custom_labels
                .get_or_insert_with(|| CustomLabelsConfig {
                    project_version_arn: String::new(),
                    min_confidence: 0.0,
                    max_results: default_max_results(),
                })
                .project_version_arn = arn;
        }
        if let Some(endpoint) = lookup("SAGEMAKER_ENDPOINT_NAME") {
            self.object_detection
                .get_or_insert_with(|| ObjectDetectionConfig {
                    endpoint_name: String::new(),
                })
                .endpoint_name = endpoint;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=100.0).contains(&self.min_confidence) {
            return Err(ConfigError::InvalidValue(format!(
                "min_confidence must be between 0 and 100, got {}",
                self.min_confidence
            )));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::InvalidValue(
                "max_upload_bytes must be positive".to_string(),
            ));
        }

        match self.backend {
            BackendKind::CustomLabels => {
                let section = self
                    .custom_labels
                    .as_ref()
                    .ok_or(ConfigError::MissingSection("custom_labels"))?;
                if section.project_version_arn.trim().is_empty() {
                    return Err(ConfigError::InvalidValue(
                        "custom_labels.project_version_arn is empty".to_string(),
                    ));
                }
                if section.max_results <= 0 {
                    return Err(ConfigError::InvalidValue(format!(
                        "custom_labels.max_results must be positive, got {}",
                        section.max_results
                    )));
                }
            }
            BackendKind::ObjectDetection => {
                let section = self
                    .object_detection
                    .as_ref()
                    .ok_or(ConfigError::MissingSection("object_detection"))?;
                if section.endpoint_name.trim().is_empty() {
                    return Err(ConfigError::InvalidValue(
                        "object_detection.endpoint_name is empty".to_string(),
                    ));
                }
                if self.class_map.is_empty() {
                    return Err(ConfigError::InvalidValue(
                        "class_map is required for the object_detection backend".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    pub fn class_map(&self) -> ClassMap {
        ClassMap::new(self.class_map.clone())
    }

    pub fn horse_id_codes(&self) -> HorseIdCodeMap {
        HorseIdCodeMap::new(self.horse_ids.clone())
    }
}
