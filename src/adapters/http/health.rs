use super::response::ApiResponse;
use super::AppState;
use crate::error::AppError;
use axum::extract::State;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
}

/// Liveness of the backing store.
pub async fn healthcheck(State(state): State<AppState>) -> Result<ApiResponse<Health>, AppError> {
    state.services.health.check().await?;
    Ok(ApiResponse::ok(Health { status: "OK" }, "Health check passed"))
}
