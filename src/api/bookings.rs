//! Booking endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{BookingDetails, BookingFilter, ItemBookingSummary, Page},
    AppState,
};

use super::ActorId;

/// Create booking request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    /// Item to book
    pub item_id: i64,
    /// Start of the booking (inclusive)
    pub start: DateTime<Utc>,
    /// End of the booking (exclusive)
    pub end: DateTime<Utc>,
}

/// Owner decision on a waiting booking
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DecisionQuery {
    /// `true` approves, `false` rejects
    pub approved: bool,
}

/// Listing parameters shared by booker and owner listings
#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookingListQuery {
    /// ALL, CURRENT, PAST, FUTURE, WAITING or REJECTED (default: ALL)
    pub state: Option<String>,
    /// Number of bookings to skip (default: 0)
    #[validate(range(min = 0, message = "from must not be negative"))]
    pub from: Option<i64>,
    /// Page size
    #[validate(range(min = 1, message = "size must be positive"))]
    pub size: Option<i64>,
}

impl BookingListQuery {
    fn resolve(&self, default_size: i64) -> AppResult<(BookingFilter, Page)> {
        self.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let filter = self.state.as_deref().unwrap_or("ALL").parse::<BookingFilter>()?;
        let page = Page::new(self.from.unwrap_or(0), self.size.unwrap_or(default_size))?;
        Ok((filter, page))
    }
}

/// Request a booking
#[utoipa::path(
    post,
    path = "/bookings",
    tag = "bookings",
    params(("X-Sharer-User-Id" = i64, Header, description = "Acting user")),
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created, waiting for approval", body = BookingDetails),
        (status = 400, description = "Item unavailable or invalid period"),
        (status = 403, description = "Owner cannot book own item"),
        (status = 404, description = "User or item not found"),
        (status = 409, description = "Period overlaps an existing booking")
    )
)]
pub async fn create_booking(
    State(state): State<AppState>,
    ActorId(actor_id): ActorId,
    Json(request): Json<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<BookingDetails>)> {
    let booking = state
        .services
        .bookings
        .create_booking(actor_id, request.item_id, request.start, request.end)
        .await?;

    Ok((StatusCode::CREATED, Json(booking)))
}

/// Approve or reject a booking
#[utoipa::path(
    patch,
    path = "/bookings/{id}",
    tag = "bookings",
    params(
        ("id" = i64, Path, description = "Booking ID"),
        ("X-Sharer-User-Id" = i64, Header, description = "Acting user"),
        DecisionQuery
    ),
    responses(
        (status = 200, description = "Booking decided", body = BookingDetails),
        (status = 400, description = "Booking already decided"),
        (status = 403, description = "Caller does not own the item"),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn decide_booking(
    State(state): State<AppState>,
    ActorId(actor_id): ActorId,
    Path(booking_id): Path<i64>,
    Query(decision): Query<DecisionQuery>,
) -> AppResult<Json<BookingDetails>> {
    let booking = state
        .services
        .bookings
        .decide_booking(actor_id, booking_id, decision.approved)
        .await?;

    Ok(Json(booking))
}

/// Get a booking (booker or item owner only)
#[utoipa::path(
    get,
    path = "/bookings/{id}",
    tag = "bookings",
    params(
        ("id" = i64, Path, description = "Booking ID"),
        ("X-Sharer-User-Id" = i64, Header, description = "Acting user")
    ),
    responses(
        (status = 200, description = "Booking details", body = BookingDetails),
        (status = 403, description = "Caller is neither booker nor owner"),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn get_booking(
    State(state): State<AppState>,
    ActorId(actor_id): ActorId,
    Path(booking_id): Path<i64>,
) -> AppResult<Json<BookingDetails>> {
    let booking = state.services.bookings.get_booking(actor_id, booking_id).await?;
    Ok(Json(booking))
}

/// List bookings made by the caller
#[utoipa::path(
    get,
    path = "/bookings",
    tag = "bookings",
    params(
        ("X-Sharer-User-Id" = i64, Header, description = "Acting user"),
        BookingListQuery
    ),
    responses(
        (status = 200, description = "Bookings, newest start first", body = Vec<BookingDetails>),
        (status = 400, description = "Unknown state or bad paging"),
        (status = 404, description = "User not found")
    )
)]
pub async fn list_by_booker(
    State(state): State<AppState>,
    ActorId(actor_id): ActorId,
    Query(query): Query<BookingListQuery>,
) -> AppResult<Json<Vec<BookingDetails>>> {
    let (filter, page) = query.resolve(state.config.bookings.default_page_size)?;
    let bookings = state
        .services
        .bookings
        .list_by_booker(actor_id, filter, page)
        .await?;

    Ok(Json(bookings))
}

/// List bookings on items owned by the caller
#[utoipa::path(
    get,
    path = "/bookings/owner",
    tag = "bookings",
    params(
        ("X-Sharer-User-Id" = i64, Header, description = "Acting user"),
        BookingListQuery
    ),
    responses(
        (status = 200, description = "Bookings, newest start first", body = Vec<BookingDetails>),
        (status = 400, description = "Unknown state or bad paging"),
        (status = 404, description = "User not found")
    )
)]
pub async fn list_by_owner(
    State(state): State<AppState>,
    ActorId(actor_id): ActorId,
    Query(query): Query<BookingListQuery>,
) -> AppResult<Json<Vec<BookingDetails>>> {
    let (filter, page) = query.resolve(state.config.bookings.default_page_size)?;
    let bookings = state
        .services
        .bookings
        .list_by_owner(actor_id, filter, page)
        .await?;

    Ok(Json(bookings))
}

/// Last and next approved bookings of an item (owner only)
#[utoipa::path(
    get,
    path = "/items/{id}/bookings/summary",
    tag = "bookings",
    params(
        ("id" = i64, Path, description = "Item ID"),
        ("X-Sharer-User-Id" = i64, Header, description = "Acting user")
    ),
    responses(
        (status = 200, description = "Booking summary; empty for non-owners", body = ItemBookingSummary),
        (status = 404, description = "Item not found")
    )
)]
pub async fn item_booking_summary(
    State(state): State<AppState>,
    ActorId(actor_id): ActorId,
    Path(item_id): Path<i64>,
) -> AppResult<Json<ItemBookingSummary>> {
    let summary = state
        .services
        .bookings
        .item_booking_summary(actor_id, item_id)
        .await?;

    Ok(Json(summary))
}
