use axum::Json;
use shelfcure_shared::types::api::HealthResponse;

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy("shelfcure-notification", env!("CARGO_PKG_VERSION")))
}
