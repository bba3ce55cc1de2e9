use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors an endpoint can surface. Remote failures keep the upstream
/// message text verbatim; nothing here retries or reclassifies.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Gateway(#[from] GatewayError),
    #[error("{0}")]
    Validation(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Gateway(GatewayError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Gateway(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Same envelope shape as success responses, with no data.
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "status": "error",
            "message": self.to_string(),
            "data": null,
        }))
    }
}
