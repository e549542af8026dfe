//! Bookings repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use super::{BookingStore, StatusUpdate};
use crate::{
    error::{AppError, AppResult},
    models::{Booking, BookingFilter, BookingQuery, BookingRole, BookingStatus, NewBooking},
};

/// SQLSTATE raised by the `bookings_no_overlap` exclusion constraint
const EXCLUSION_VIOLATION: &str = "23P01";

const BOOKING_COLUMNS: &str = "b.id, b.start_date, b.end_date, b.item_id, b.booker_id, b.status";

#[derive(Clone)]
pub struct BookingsRepository {
    pool: Pool<Postgres>,
}

impl BookingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// SQL predicate for a listing filter; `$2` is the reference instant.
/// Returns whether the predicate references `$2`.
fn filter_clause(filter: BookingFilter) -> (&'static str, bool) {
    match filter {
        BookingFilter::All => ("TRUE", false),
        BookingFilter::Current => ("b.start_date <= $2 AND b.end_date > $2", true),
        BookingFilter::Past => ("b.end_date <= $2 AND b.status = 'APPROVED'", true),
        BookingFilter::Future => ("b.start_date > $2", true),
        BookingFilter::Waiting => ("b.status = 'WAITING'", false),
        BookingFilter::Rejected => ("b.status IN ('REJECTED', 'CANCELED')", false),
    }
}

fn scope_clause(role: BookingRole) -> (&'static str, &'static str) {
    match role {
        BookingRole::Booker => ("", "b.booker_id = $1"),
        BookingRole::Owner => ("JOIN items i ON i.id = b.item_id", "i.owner_id = $1"),
    }
}

fn listing_sql(query: &BookingQuery) -> (String, bool) {
    let (join, scope) = scope_clause(query.role);
    let (predicate, uses_now) = filter_clause(query.filter);
    let sql = format!(
        "SELECT {} FROM bookings b {} WHERE {} AND {} ORDER BY b.start_date DESC, b.id DESC LIMIT {} OFFSET {}",
        BOOKING_COLUMNS, join, scope, predicate, query.page.limit, query.page.offset
    );
    (sql, uses_now)
}

fn map_insert_error(e: sqlx::Error, booking: &NewBooking) -> AppError {
    if let sqlx::Error::Database(ref db) = e {
        if db.code().as_deref() == Some(EXCLUSION_VIOLATION) {
            return AppError::Conflict(format!(
                "Item {} is already booked between {} and {}",
                booking.item_id, booking.start, booking.end
            ));
        }
    }
    AppError::Database(e)
}

#[async_trait]
impl BookingStore for BookingsRepository {
    /// Create a new booking
    async fn insert(&self, booking: NewBooking) -> AppResult<Booking> {
        sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings AS b (start_date, end_date, item_id, booker_id, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING b.id, b.start_date, b.end_date, b.item_id, b.booker_id, b.status
            "#,
        )
        .bind(booking.start)
        .bind(booking.end)
        .bind(booking.item_id)
        .bind(booking.booker_id)
        .bind(booking.status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, &booking))
    }

    /// Get booking by ID
    async fn find_by_id(&self, booking_id: i64) -> AppResult<Option<Booking>> {
        let sql = format!("SELECT {} FROM bookings b WHERE b.id = $1", BOOKING_COLUMNS);
        let booking = sqlx::query_as::<_, Booking>(&sql)
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(booking)
    }

    /// Live bookings on the item whose period intersects `[start, end)`
    async fn find_overlapping(
        &self,
        item_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Booking>> {
        let sql = format!(
            "SELECT {} FROM bookings b \
             WHERE b.item_id = $1 AND b.status IN ('WAITING', 'APPROVED') \
             AND b.start_date < $3 AND b.end_date > $2",
            BOOKING_COLUMNS
        );
        let bookings = sqlx::query_as::<_, Booking>(&sql)
            .bind(item_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;
        Ok(bookings)
    }

    async fn find_approved_by_item(&self, item_id: i64) -> AppResult<Vec<Booking>> {
        let sql = format!(
            "SELECT {} FROM bookings b WHERE b.item_id = $1 AND b.status = 'APPROVED'",
            BOOKING_COLUMNS
        );
        let bookings = sqlx::query_as::<_, Booking>(&sql)
            .bind(item_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(bookings)
    }

    /// Guarded status transition (`WHERE status = expected`)
    async fn update_status(
        &self,
        booking_id: i64,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> AppResult<StatusUpdate> {
        let updated = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings AS b SET status = $1
            WHERE b.id = $2 AND b.status = $3
            RETURNING b.id, b.start_date, b.end_date, b.item_id, b.booker_id, b.status
            "#,
        )
        .bind(next)
        .bind(booking_id)
        .bind(expected)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(booking) = updated {
            return Ok(StatusUpdate::Applied(booking));
        }

        let current: Option<BookingStatus> =
            sqlx::query_scalar("SELECT status FROM bookings WHERE id = $1")
                .bind(booking_id)
                .fetch_optional(&self.pool)
                .await?;

        current
            .map(StatusUpdate::Stale)
            .ok_or_else(|| AppError::NotFound(format!("Booking with id {} not found", booking_id)))
    }

    async fn find_for_subject(&self, query: BookingQuery) -> AppResult<Vec<Booking>> {
        let (sql, uses_now) = listing_sql(&query);

        let mut builder = sqlx::query_as::<_, Booking>(&sql).bind(query.subject_id);
        if uses_now {
            builder = builder.bind(query.now);
        }

        let bookings = builder.fetch_all(&self.pool).await?;
        Ok(bookings)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
