//! HTTP adapter for the ShareIt booking endpoints

pub mod bookings;
pub mod health;
pub mod openapi;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, AppState};

/// Header carrying the already-authenticated caller id
pub const USER_ID_HEADER: &str = "X-Sharer-User-Id";

/// Extractor for the acting user id
#[derive(Debug, Clone, Copy)]
pub struct ActorId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for ActorId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::Validation(format!("Missing {} header", USER_ID_HEADER)))?
            .to_str()
            .map_err(|_| AppError::Validation(format!("Malformed {} header", USER_ID_HEADER)))?;

        raw.trim()
            .parse::<i64>()
            .map(ActorId)
            .map_err(|_| AppError::Validation(format!("Invalid {} header: {}", USER_ID_HEADER, raw)))
    }
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Bookings
        .route(
            "/bookings",
            get(bookings::list_by_booker).post(bookings::create_booking),
        )
        .route("/bookings/owner", get(bookings::list_by_owner))
        .route(
            "/bookings/:id",
            get(bookings::get_booking).patch(bookings::decide_booking),
        )
        // Item booking summary
        .route("/items/:id/bookings/summary", get(bookings::item_booking_summary))
        .with_state(state);

    Router::new()
        .merge(api)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
