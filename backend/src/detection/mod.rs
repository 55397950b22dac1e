pub mod detection_service;
pub mod error;
pub mod id_tag;
pub mod lookup;
pub mod models;
pub mod normalizer;
