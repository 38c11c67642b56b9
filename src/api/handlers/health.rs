use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

use crate::AppState;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub storage_provider: String,
    pub bucket: String,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let provider = state.gateway.provider();

    Json(HealthResponse {
        status: "ok".to_string(),
        storage_provider: provider.name().to_string(),
        bucket: provider.bucket().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
