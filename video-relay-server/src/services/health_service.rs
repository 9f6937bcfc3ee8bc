use actix_web::{get, web, HttpResponse, Responder};
use serde::Serialize;
use crate::services::{AppState, APP_TYPE_JSON};

pub const SERVICE_NAME: &str = "video-downloader";

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    #[serde(rename = "baseDir")]
    base_dir: String,
}

fn health_report(shared_state: &AppState) -> HttpResponse {
    let resp = HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
        base_dir: shared_state.config.base_dir.display().to_string(),
    };
    HttpResponse::Ok().content_type(APP_TYPE_JSON).json(resp)
}

// Load balancers probe the root path.
#[get("/")]
async fn root(shared_state: web::Data<AppState>) -> impl Responder {
    health_report(&shared_state)
}

#[get("/health")]
async fn health(shared_state: web::Data<AppState>) -> impl Responder {
    health_report(&shared_state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use actix_web::{test, App};
    use blob_store::LocalFileBlobStore;
    use crate::params::RelayConfig;
    use crate::services::{configure, AppState};
    use super::*;

    #[actix_web::test]
    async fn test_health_routes() {
        let config = RelayConfig::new("127.0.0.1", 3000, "/srv/videos", None).unwrap();
        let store = Arc::new(LocalFileBlobStore::new("/srv/videos"));
        let state = web::Data::new(AppState::new(config, store));
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        for uri in ["/", "/health"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body["status"], "ok", "{}", uri);
            assert_eq!(body["service"], SERVICE_NAME);
            assert_eq!(body["baseDir"], "/srv/videos");
        }
    }
}
