//! Repository layer: collaborator contracts used by the booking engine and
//! their PostgreSQL / in-memory implementations.

pub mod bookings;
pub mod items;
pub mod memory;
pub mod users;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{Booking, BookingQuery, BookingStatus, Item, NewBooking, User},
};

/// Resolves items by id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemDirectory: Send + Sync {
    async fn find_by_id(&self, item_id: i64) -> AppResult<Option<Item>>;
}

/// Resolves users by id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, user_id: i64) -> AppResult<Option<User>>;
}

/// Outcome of a status compare-and-swap
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    /// The guard matched and the new status was written.
    Applied(Booking),
    /// Another writer got there first; carries the status found instead.
    Stale(BookingStatus),
}

/// Persistence for booking records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Insert a booking and return it with its assigned id.
    async fn insert(&self, booking: NewBooking) -> AppResult<Booking>;

    async fn find_by_id(&self, booking_id: i64) -> AppResult<Option<Booking>>;

    /// Waiting or approved bookings on an item that intersect `[start, end)`.
    async fn find_overlapping(
        &self,
        item_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Booking>>;

    /// Approved bookings on an item, in no particular order.
    async fn find_approved_by_item(&self, item_id: i64) -> AppResult<Vec<Booking>>;

    /// Set `next` only if the stored status is still `expected`.
    /// Fails with `NotFound` if the booking no longer exists.
    async fn update_status(
        &self,
        booking_id: i64,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> AppResult<StatusUpdate>;

    /// Role-scoped, filtered listing ordered by start then id, both descending.
    async fn find_for_subject(&self, query: BookingQuery) -> AppResult<Vec<Booking>>;

    /// Round trip to the backing storage, used by readiness checks.
    async fn ping(&self) -> AppResult<()>;
}

/// Collaborators shared by all services
#[derive(Clone)]
pub struct Repository {
    pub items: Arc<dyn ItemDirectory>,
    pub users: Arc<dyn UserDirectory>,
    pub bookings: Arc<dyn BookingStore>,
}

impl Repository {
    /// Create a repository backed by the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            items: Arc::new(items::ItemsRepository::new(pool.clone())),
            users: Arc::new(users::UsersRepository::new(pool.clone())),
            bookings: Arc::new(bookings::BookingsRepository::new(pool)),
        }
    }

    pub fn from_parts(
        items: Arc<dyn ItemDirectory>,
        users: Arc<dyn UserDirectory>,
        bookings: Arc<dyn BookingStore>,
    ) -> Self {
        Self { items, users, bookings }
    }

    /// Create a repository where one in-memory store plays every role
    pub fn in_memory(store: Arc<memory::InMemoryStore>) -> Self {
        Self {
            items: store.clone(),
            users: store.clone(),
            bookings: store,
        }
    }
}
