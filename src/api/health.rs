//! Liveness and readiness probes

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, AppState};

/// Probe answer
#[derive(Debug, Serialize, ToSchema)]
pub struct ProbeStatus {
    /// `up` (process alive) or `ready` (storage reachable)
    pub status: String,
    pub version: String,
}

impl ProbeStatus {
    fn reply(status: &str) -> Json<Self> {
        Json(Self {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }
}

/// Process liveness; never touches storage
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Process is running", body = ProbeStatus)
    )
)]
pub async fn health_check() -> Json<ProbeStatus> {
    ProbeStatus::reply("up")
}

/// Readiness: the booking storage must answer a round trip
#[utoipa::path(
    get,
    path = "/ready",
    tag = "health",
    responses(
        (status = 200, description = "Storage reachable", body = ProbeStatus),
        (status = 503, description = "Storage unavailable", body = crate::error::ErrorResponse)
    )
)]
pub async fn readiness_check(State(state): State<AppState>) -> AppResult<Json<ProbeStatus>> {
    if let Err(e) = state.services.bookings.check_storage().await {
        tracing::warn!("Readiness check failed: {}", e);
        return Err(e);
    }
    Ok(ProbeStatus::reply("ready"))
}
