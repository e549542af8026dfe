//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{bookings, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ShareIt API",
        version = "0.1.0",
        description = "Item sharing and booking REST API"
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Bookings
        bookings::create_booking,
        bookings::decide_booking,
        bookings::get_booking,
        bookings::list_by_booker,
        bookings::list_by_owner,
        bookings::item_booking_summary,
    ),
    components(
        schemas(
            bookings::CreateBookingRequest,
            crate::models::BookingDetails,
            crate::models::BookingStatus,
            crate::models::BookingFilter,
            crate::models::ItemBookingSummary,
            crate::models::booking::BookingShort,
            crate::models::ItemShort,
            crate::models::UserRef,
            health::ProbeStatus,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "bookings", description = "Booking lifecycle")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
