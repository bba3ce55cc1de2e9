pub mod community_handlers;
pub mod post_handlers;

use actix_web::{get, web, HttpResponse};
use serde::Serialize;

use crate::error::ApiError;
use crate::AppState;

/// Response envelope shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: &str, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            data: Some(data),
        }
    }
}

/// Connectivity probe: one cheap row query against the remote.
#[get("/test/gateway")]
pub async fn test_gateway(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let rows: Vec<serde_json::Value> = state
        .gateway
        .from("communities")
        .select("id")
        .limit(1)
        .fetch()
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        "Gateway reachable",
        serde_json::json!({ "probed_rows": rows.len() }),
    )))
}
