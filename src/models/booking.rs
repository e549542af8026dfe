//! Booking model, status state machine and listing filters

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::item::ItemShort;
use super::user::UserRef;
use crate::error::AppError;

/// Booking status.
///
/// `Waiting` moves to `Approved` or `Rejected` exactly once. `Canceled` is
/// terminal and only ever written by tooling outside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "booking_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Waiting,
    Approved,
    Rejected,
    Canceled,
}

impl BookingStatus {
    /// Whether a booking in this status still holds its time slot on the item.
    pub fn blocks_item(self) -> bool {
        matches!(self, BookingStatus::Waiting | BookingStatus::Approved)
    }

    /// Status reached by an owner decision.
    pub fn decided(approve: bool) -> Self {
        if approve {
            BookingStatus::Approved
        } else {
            BookingStatus::Rejected
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BookingStatus::Waiting => "WAITING",
            BookingStatus::Approved => "APPROVED",
            BookingStatus::Rejected => "REJECTED",
            BookingStatus::Canceled => "CANCELED",
        };
        f.write_str(label)
    }
}

/// Booking record from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: i64,
    #[sqlx(rename = "start_date")]
    pub start: DateTime<Utc>,
    #[sqlx(rename = "end_date")]
    pub end: DateTime<Utc>,
    pub item_id: i64,
    pub booker_id: i64,
    pub status: BookingStatus,
}

impl Booking {
    pub fn window(&self, now: DateTime<Utc>) -> TimeWindow {
        TimeWindow::of(self.start, self.end, now)
    }
}

/// Booking to be inserted; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub item_id: i64,
    pub booker_id: i64,
    pub status: BookingStatus,
}

/// Position of a booking interval relative to an instant.
/// Exactly one variant holds for any `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    Past,
    Current,
    Future,
}

impl TimeWindow {
    pub fn of(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if end <= now {
            TimeWindow::Past
        } else if start > now {
            TimeWindow::Future
        } else {
            TimeWindow::Current
        }
    }
}

/// Named selection of bookings for listings (`state` query parameter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingFilter {
    All,
    Current,
    Past,
    Future,
    Waiting,
    Rejected,
}

impl BookingFilter {
    pub const VARIANTS: [BookingFilter; 6] = [
        BookingFilter::All,
        BookingFilter::Current,
        BookingFilter::Past,
        BookingFilter::Future,
        BookingFilter::Waiting,
        BookingFilter::Rejected,
    ];

    pub fn matches(
        self,
        status: BookingStatus,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> bool {
        match self {
            BookingFilter::All => true,
            BookingFilter::Current => TimeWindow::of(start, end, now) == TimeWindow::Current,
            // elapsed bookings only count once they were approved
            BookingFilter::Past => {
                TimeWindow::of(start, end, now) == TimeWindow::Past
                    && status == BookingStatus::Approved
            }
            BookingFilter::Future => TimeWindow::of(start, end, now) == TimeWindow::Future,
            BookingFilter::Waiting => status == BookingStatus::Waiting,
            BookingFilter::Rejected => {
                matches!(status, BookingStatus::Rejected | BookingStatus::Canceled)
            }
        }
    }

    pub fn matches_booking(self, booking: &Booking, now: DateTime<Utc>) -> bool {
        self.matches(booking.status, booking.start, booking.end, now)
    }
}

impl FromStr for BookingFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookingFilter::VARIANTS
            .into_iter()
            .find(|filter| filter.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::UnsupportedFilter(s.to_string()))
    }
}

impl fmt::Display for BookingFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BookingFilter::All => "ALL",
            BookingFilter::Current => "CURRENT",
            BookingFilter::Past => "PAST",
            BookingFilter::Future => "FUTURE",
            BookingFilter::Waiting => "WAITING",
            BookingFilter::Rejected => "REJECTED",
        };
        f.write_str(label)
    }
}

/// Which side of a booking a listing is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingRole {
    Booker,
    Owner,
}

/// Offset/limit window over an ordered listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: i64,
    pub limit: i64,
}

impl Page {
    pub fn new(offset: i64, limit: i64) -> Result<Self, AppError> {
        if offset < 0 {
            return Err(AppError::Validation(format!("offset must not be negative, got {}", offset)));
        }
        if limit <= 0 {
            return Err(AppError::Validation(format!("limit must be positive, got {}", limit)));
        }
        Ok(Self { offset, limit })
    }
}

/// Role-scoped, time-windowed listing request passed to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingQuery {
    pub subject_id: i64,
    pub role: BookingRole,
    pub filter: BookingFilter,
    pub now: DateTime<Utc>,
    pub page: Page,
}

/// Listing order: newest start first, then highest id.
pub fn listing_order(a: &Booking, b: &Booking) -> std::cmp::Ordering {
    b.start.cmp(&a.start).then_with(|| b.id.cmp(&a.id))
}

/// Booking as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetails {
    pub id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: BookingStatus,
    pub item: ItemShort,
    pub booker: UserRef,
}

impl BookingDetails {
    pub fn new(booking: Booking, item: ItemShort) -> Self {
        Self {
            id: booking.id,
            start: booking.start,
            end: booking.end,
            status: booking.status,
            item,
            booker: UserRef { id: booking.booker_id },
        }
    }
}

/// Minimal booking reference shown on an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingShort {
    pub id: i64,
    pub booker_id: i64,
}

impl From<&Booking> for BookingShort {
    fn from(booking: &Booking) -> Self {
        Self {
            id: booking.id,
            booker_id: booking.booker_id,
        }
    }
}

/// Last and next approved bookings of an item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemBookingSummary {
    pub last_booking: Option<BookingShort>,
    pub next_booking: Option<BookingShort>,
}

impl ItemBookingSummary {
    pub fn from_bookings(bookings: &[Booking], now: DateTime<Utc>) -> Self {
        let approved = || bookings.iter().filter(|b| b.status == BookingStatus::Approved);

        let last = approved()
            .filter(|b| b.start <= now)
            .max_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
        let next = approved()
            .filter(|b| b.start > now)
            .min_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));

        Self {
            last_booking: last.map(BookingShort::from),
            next_booking: next.map(BookingShort::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap()
    }

    fn booking(id: i64, start_h: i64, end_h: i64, status: BookingStatus) -> Booking {
        Booking {
            id,
            start: t0() + Duration::hours(start_h),
            end: t0() + Duration::hours(end_h),
            item_id: 1,
            booker_id: 2,
            status,
        }
    }

    #[test]
    fn test_filter_parsing() {
        assert_eq!("ALL".parse::<BookingFilter>().unwrap(), BookingFilter::All);
        assert_eq!("current".parse::<BookingFilter>().unwrap(), BookingFilter::Current);
        assert_eq!("Rejected".parse::<BookingFilter>().unwrap(), BookingFilter::Rejected);

        match "UNSUPPORTED_STATUS".parse::<BookingFilter>() {
            Err(AppError::UnsupportedFilter(name)) => assert_eq!(name, "UNSUPPORTED_STATUS"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_time_window_boundaries() {
        let start = t0();
        let end = t0() + Duration::hours(1);

        assert_eq!(TimeWindow::of(start, end, start - Duration::seconds(1)), TimeWindow::Future);
        assert_eq!(TimeWindow::of(start, end, start), TimeWindow::Current);
        assert_eq!(TimeWindow::of(start, end, end - Duration::seconds(1)), TimeWindow::Current);
        assert_eq!(TimeWindow::of(start, end, end), TimeWindow::Past);
    }

    #[test]
    fn test_window_filters_partition_all() {
        let statuses = [
            BookingStatus::Waiting,
            BookingStatus::Approved,
            BookingStatus::Rejected,
            BookingStatus::Canceled,
        ];
        let now = t0();
        for status in statuses {
            for (start_h, end_h) in [(-3, -1), (-1, 0), (-1, 1), (0, 2), (1, 3)] {
                let b = booking(1, start_h, end_h, status);
                assert!(BookingFilter::All.matches_booking(&b, now));

                let hits = [TimeWindow::Past, TimeWindow::Current, TimeWindow::Future]
                    .into_iter()
                    .filter(|w| b.window(now) == *w)
                    .count();
                assert_eq!(hits, 1);

                assert_eq!(
                    BookingFilter::Current.matches_booking(&b, now),
                    b.window(now) == TimeWindow::Current
                );
                assert_eq!(
                    BookingFilter::Future.matches_booking(&b, now),
                    b.window(now) == TimeWindow::Future
                );
            }
        }
    }

    #[test]
    fn test_past_filter_requires_approval() {
        let now = t0();
        assert!(BookingFilter::Past.matches_booking(&booking(1, -3, -1, BookingStatus::Approved), now));
        assert!(!BookingFilter::Past.matches_booking(&booking(1, -3, -1, BookingStatus::Waiting), now));
        assert!(!BookingFilter::Past.matches_booking(&booking(1, -3, -1, BookingStatus::Rejected), now));
    }

    #[test]
    fn test_status_filters() {
        let now = t0();
        assert!(BookingFilter::Waiting.matches_booking(&booking(1, 1, 2, BookingStatus::Waiting), now));
        assert!(!BookingFilter::Waiting.matches_booking(&booking(1, 1, 2, BookingStatus::Approved), now));
        assert!(BookingFilter::Rejected.matches_booking(&booking(1, 1, 2, BookingStatus::Rejected), now));
        assert!(BookingFilter::Rejected.matches_booking(&booking(1, 1, 2, BookingStatus::Canceled), now));
        assert!(!BookingFilter::Rejected.matches_booking(&booking(1, 1, 2, BookingStatus::Waiting), now));
    }

    #[test]
    fn test_listing_order() {
        let mut bookings = vec![
            booking(1, 1, 2, BookingStatus::Waiting),
            booking(2, 5, 6, BookingStatus::Waiting),
            booking(3, 1, 3, BookingStatus::Approved),
        ];
        bookings.sort_by(listing_order);
        let ids: Vec<i64> = bookings.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_page_bounds() {
        assert!(Page::new(0, 20).is_ok());
        assert!(matches!(Page::new(-1, 20), Err(AppError::Validation(_))));
        assert!(matches!(Page::new(0, 0), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_item_summary_picks_approved_neighbours() {
        let now = t0();
        let bookings = vec![
            booking(1, -10, -8, BookingStatus::Approved),
            booking(2, -2, 1, BookingStatus::Approved),
            booking(3, -1, 0, BookingStatus::Rejected),
            booking(4, 2, 3, BookingStatus::Waiting),
            booking(5, 4, 5, BookingStatus::Approved),
            booking(6, 9, 10, BookingStatus::Approved),
        ];
        let summary = ItemBookingSummary::from_bookings(&bookings, now);
        assert_eq!(summary.last_booking, Some(BookingShort { id: 2, booker_id: 2 }));
        assert_eq!(summary.next_booking, Some(BookingShort { id: 5, booker_id: 2 }));

        let empty = ItemBookingSummary::from_bookings(&[], now);
        assert_eq!(empty, ItemBookingSummary::default());
    }
}
