use std::sync::Arc;
use actix_web::web;
use blob_store::BlobStore;
use crate::errors::RelayErr;
use crate::params::RelayConfig;

pub mod health_service;
pub mod video_service;

pub const APP_TYPE_JSON: &str = "application/json";

pub struct AppState {
    pub(crate) config: RelayConfig,
    pub(crate) store: Arc<dyn BlobStore>,
}

impl AppState {
    pub fn new(config: RelayConfig, store: Arc<dyn BlobStore>) -> Self {
        Self { config, store }
    }
}

/// Registers every route; shared by `main` and the handler tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| RelayErr::Validation(err.to_string()).into()),
    )
    .service(health_service::root)
    .service(health_service::health)
    .service(video_service::upload_video)
    .service(video_service::download_video);
}
