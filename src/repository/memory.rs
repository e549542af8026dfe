//! In-memory implementation of the collaborator contracts, used by tests and
//! for running the engine without a database.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{BookingStore, ItemDirectory, StatusUpdate, UserDirectory};
use crate::{
    error::{AppError, AppResult},
    models::{
        booking::listing_order, Booking, BookingQuery, BookingRole, BookingStatus, Item,
        NewBooking, User,
    },
    services::overlap::overlaps,
};

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<i64, User>,
    items: BTreeMap<i64, Item>,
    bookings: BTreeMap<i64, Booking>,
    last_user_id: i64,
    last_item_id: i64,
    last_booking_id: i64,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, name: &str, email: &str) -> User {
        let mut state = self.state.write().await;
        state.last_user_id += 1;
        let user = User {
            id: state.last_user_id,
            name: name.to_string(),
            email: email.to_string(),
        };
        state.users.insert(user.id, user.clone());
        user
    }

    pub async fn add_item(&self, owner_id: i64, name: &str, available: bool) -> Item {
        let mut state = self.state.write().await;
        state.last_item_id += 1;
        let item = Item {
            id: state.last_item_id,
            name: name.to_string(),
            description: String::new(),
            available,
            owner_id,
        };
        state.items.insert(item.id, item.clone());
        item
    }

    pub async fn set_available(&self, item_id: i64, available: bool) -> AppResult<()> {
        let mut state = self.state.write().await;
        let item = state
            .items
            .get_mut(&item_id)
            .ok_or_else(|| AppError::NotFound(format!("Item with id {} not found", item_id)))?;
        item.available = available;
        Ok(())
    }

    /// Overwrite a status without any guard, e.g. to cancel a booking.
    pub async fn set_status(&self, booking_id: i64, status: BookingStatus) -> AppResult<()> {
        let mut state = self.state.write().await;
        let booking = state
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| AppError::NotFound(format!("Booking with id {} not found", booking_id)))?;
        booking.status = status;
        Ok(())
    }

    pub async fn booking_count(&self) -> usize {
        self.state.read().await.bookings.len()
    }
}

#[async_trait]
impl ItemDirectory for InMemoryStore {
    async fn find_by_id(&self, item_id: i64) -> AppResult<Option<Item>> {
        Ok(self.state.read().await.items.get(&item_id).cloned())
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn find_by_id(&self, user_id: i64) -> AppResult<Option<User>> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }
}

#[async_trait]
impl BookingStore for InMemoryStore {
    async fn insert(&self, booking: NewBooking) -> AppResult<Booking> {
        let mut state = self.state.write().await;
        state.last_booking_id += 1;
        let stored = Booking {
            id: state.last_booking_id,
            start: booking.start,
            end: booking.end,
            item_id: booking.item_id,
            booker_id: booking.booker_id,
            status: booking.status,
        };
        state.bookings.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, booking_id: i64) -> AppResult<Option<Booking>> {
        Ok(self.state.read().await.bookings.get(&booking_id).cloned())
    }

    async fn find_overlapping(
        &self,
        item_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Booking>> {
        let state = self.state.read().await;
        Ok(state
            .bookings
            .values()
            .filter(|b| b.item_id == item_id && b.status.blocks_item())
            .filter(|b| overlaps(b.start, b.end, start, end))
            .cloned()
            .collect())
    }

    async fn find_approved_by_item(&self, item_id: i64) -> AppResult<Vec<Booking>> {
        let state = self.state.read().await;
        Ok(state
            .bookings
            .values()
            .filter(|b| b.item_id == item_id && b.status == BookingStatus::Approved)
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        booking_id: i64,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> AppResult<StatusUpdate> {
        let mut state = self.state.write().await;
        let booking = state
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| AppError::NotFound(format!("Booking with id {} not found", booking_id)))?;

        if booking.status != expected {
            return Ok(StatusUpdate::Stale(booking.status));
        }
        booking.status = next;
        Ok(StatusUpdate::Applied(booking.clone()))
    }

    async fn find_for_subject(&self, query: BookingQuery) -> AppResult<Vec<Booking>> {
        let state = self.state.read().await;

        let mut matching: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| match query.role {
                BookingRole::Booker => b.booker_id == query.subject_id,
                BookingRole::Owner => state
                    .items
                    .get(&b.item_id)
                    .map_or(false, |item| item.owner_id == query.subject_id),
            })
            .filter(|b| query.filter.matches_booking(b, query.now))
            .cloned()
            .collect();
        matching.sort_by(listing_order);

        Ok(matching
            .into_iter()
            .skip(query.page.offset as usize)
            .take(query.page.limit as usize)
            .collect())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
