mod errors;
mod params;
mod services;

use std::io;
use std::sync::Arc;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use blob_store::LocalFileBlobStore;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use crate::params::{Args, RelayConfig};
use crate::services::AppState;


fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();
    init_tracing();

    let config = RelayConfig::try_from(args).map_err(|e| {
        io::Error::new(io::ErrorKind::InvalidInput, format!("invalid PUBLIC_BASE_URL: {}", e))
    })?;

    let store = LocalFileBlobStore::open(&config.base_dir)
        .await
        .map_err(io::Error::other)?;

    tracing::info!(
        "video relay listening on {}:{}, storing under {}",
        config.host, config.port, config.base_dir.display()
    );

    let bind_addr = (config.host.clone(), config.port);
    let shared_state = web::Data::new(AppState::new(config, Arc::new(store)));

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(shared_state.clone())
            .configure(services::configure)
    })
    .bind(bind_addr)?
    .run()
    .await
}
