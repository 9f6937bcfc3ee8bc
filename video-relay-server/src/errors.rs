use actix_multipart::MultipartError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use blob_store::StoreError;
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;


#[derive(Debug, Error)]
pub enum RelayErr {
    #[error("{0}")]
    Validation(String),

    #[error("Malformed multipart body")]
    Multipart(#[from] MultipartError),

    #[error("Video not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("An unexpected I/O error occurred")]
    Io(#[from] std::io::Error),
}

impl From<ValidationErrors> for RelayErr {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors.field_errors().keys().map(|field| field.to_string()).collect();
        fields.sort_unstable();
        RelayErr::Validation(format!("{} required", fields.join(" and ")))
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl RelayErr {
    /// Message safe to show the caller. Internal causes stay in the logs.
    fn public_message(&self) -> String {
        let status = self.status_code();
        if status.is_server_error() {
            "Internal error".to_string()
        } else if status == StatusCode::NOT_FOUND {
            "Video not found".to_string()
        } else {
            self.to_string()
        }
    }
}

impl ResponseError for RelayErr {
    fn status_code(&self) -> StatusCode {
        match self {
            RelayErr::Validation(_) | RelayErr::Multipart(_) => StatusCode::BAD_REQUEST,
            RelayErr::NotFound => StatusCode::NOT_FOUND,
            RelayErr::Store(StoreError::InvalidKey { .. }) => StatusCode::BAD_REQUEST,
            RelayErr::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            RelayErr::Store(StoreError::Io(_)) | RelayErr::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("request failed: {:?}", self);
        } else if let RelayErr::Multipart(e) = self {
            tracing::debug!("rejected multipart body: {}", e);
        }
        let message = self.public_message();
        HttpResponse::build(status).json(ErrorBody { error: &message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use actix_web::body::to_bytes;

    async fn body_of(err: RelayErr) -> (StatusCode, serde_json::Value) {
        let resp = err.error_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn test_validation_is_bad_request() {
        let (status, body) = body_of(RelayErr::Validation("schema and worker_id required".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "schema and worker_id required");
    }

    #[actix_web::test]
    async fn test_invalid_key_is_bad_request() {
        let err = RelayErr::from(StoreError::InvalidKey { field: "schema", reason: "must not start with '.'".into() });
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid schema: must not start with '.'");
    }

    #[actix_web::test]
    async fn test_store_not_found_hides_path() {
        let err = RelayErr::from(StoreError::NotFound(PathBuf::from("/secret/a/a_w_1_full.mp4")));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Video not found");
    }

    #[actix_web::test]
    async fn test_io_error_is_generic() {
        let err = RelayErr::from(StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "permission denied on /secret",
        )));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal error");
    }
}
