//! Booking lifecycle service: reservation requests, owner decisions and
//! role-scoped listings.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{locks::ItemLocks, overlap};
use crate::{
    clock::Clock,
    error::{AppError, AppResult},
    models::{
        Booking, BookingDetails, BookingFilter, BookingQuery, BookingRole, BookingStatus, Item,
        ItemBookingSummary, ItemShort, NewBooking, Page,
    },
    repository::{Repository, StatusUpdate},
};

#[derive(Clone)]
pub struct BookingsService {
    repository: Repository,
    clock: Arc<dyn Clock>,
    locks: ItemLocks,
}

fn item_not_found(item_id: i64) -> AppError {
    AppError::NotFound(format!("Item with id {} not found", item_id))
}

fn user_not_found(user_id: i64) -> AppError {
    AppError::NotFound(format!("User with id {} not found", user_id))
}

fn booking_not_found(booking_id: i64) -> AppError {
    AppError::NotFound(format!("Booking with id {} not found", booking_id))
}

fn already_processed(booking_id: i64, status: BookingStatus) -> AppError {
    AppError::InvalidState(format!(
        "Booking {} has already been processed and has status {}",
        booking_id, status
    ))
}

impl BookingsService {
    pub fn new(repository: Repository, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            clock,
            locks: ItemLocks::new(),
        }
    }

    /// Request a booking of `item_id` over `[start, end)`. The new booking waits
    /// for the owner's decision.
    pub async fn create_booking(
        &self,
        actor_id: i64,
        item_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<BookingDetails> {
        let item = self.load_item(item_id).await?;
        self.ensure_user(actor_id).await?;

        if item.is_owned_by(actor_id) {
            return Err(AppError::Forbidden(format!(
                "User {} owns item {} and cannot book it",
                actor_id, item_id
            )));
        }
        if !item.available {
            return Err(AppError::InvalidState(format!(
                "Item {} is not available for booking",
                item_id
            )));
        }
        self.validate_interval(start, end)?;

        // check and insert must not interleave with another request on this item
        let _guard = self.locks.acquire(item_id).await;

        let existing = self
            .repository
            .bookings
            .find_overlapping(item_id, start, end)
            .await?;
        if let Some(conflict) = overlap::find_conflict(&existing, start, end) {
            tracing::warn!(
                "Booking request by user {} on item {} overlaps booking {}",
                actor_id,
                item_id,
                conflict.id
            );
            return Err(AppError::Conflict(format!(
                "Requested period overlaps an existing booking on item '{}'",
                item.name
            )));
        }

        let booking = self
            .repository
            .bookings
            .insert(NewBooking {
                start,
                end,
                item_id,
                booker_id: actor_id,
                status: BookingStatus::Waiting,
            })
            .await?;

        tracing::info!(
            "Booking {} created: item={} booker={} [{}, {})",
            booking.id,
            item_id,
            actor_id,
            start,
            end
        );
        Ok(BookingDetails::new(booking, item.short()))
    }

    /// Owner approves or rejects a waiting booking. Only the first decision wins.
    pub async fn decide_booking(
        &self,
        actor_id: i64,
        booking_id: i64,
        approve: bool,
    ) -> AppResult<BookingDetails> {
        let booking = self.load_booking(booking_id).await?;
        let item = self.load_item(booking.item_id).await?;

        if !item.is_owned_by(actor_id) {
            return Err(AppError::Forbidden(format!(
                "User {} is not the owner of item {} and cannot decide on booking {}",
                actor_id, item.id, booking_id
            )));
        }
        if booking.status != BookingStatus::Waiting {
            return Err(already_processed(booking_id, booking.status));
        }

        let next = BookingStatus::decided(approve);
        match self
            .repository
            .bookings
            .update_status(booking_id, BookingStatus::Waiting, next)
            .await?
        {
            StatusUpdate::Applied(updated) => {
                tracing::info!("Booking {} set to {} by owner {}", booking_id, next, actor_id);
                Ok(BookingDetails::new(updated, item.short()))
            }
            StatusUpdate::Stale(current) => {
                tracing::warn!(
                    "Booking {} decision to {} lost to a concurrent decision ({})",
                    booking_id,
                    next,
                    current
                );
                Err(already_processed(booking_id, current))
            }
        }
    }

    /// Get a booking visible to its booker or to the item's owner
    pub async fn get_booking(&self, actor_id: i64, booking_id: i64) -> AppResult<BookingDetails> {
        let booking = self.load_booking(booking_id).await?;
        let item = self.load_item(booking.item_id).await?;

        if booking.booker_id != actor_id && !item.is_owned_by(actor_id) {
            return Err(AppError::Forbidden(format!(
                "User {} is neither the booker nor the owner of booking {}",
                actor_id, booking_id
            )));
        }

        Ok(BookingDetails::new(booking, item.short()))
    }

    /// Bookings made by the actor
    pub async fn list_by_booker(
        &self,
        actor_id: i64,
        filter: BookingFilter,
        page: Page,
    ) -> AppResult<Vec<BookingDetails>> {
        self.list(actor_id, BookingRole::Booker, filter, page).await
    }

    /// Bookings on items owned by the actor
    pub async fn list_by_owner(
        &self,
        actor_id: i64,
        filter: BookingFilter,
        page: Page,
    ) -> AppResult<Vec<BookingDetails>> {
        self.list(actor_id, BookingRole::Owner, filter, page).await
    }

    /// Last and next approved bookings of an item; empty unless the actor owns it.
    pub async fn item_booking_summary(
        &self,
        actor_id: i64,
        item_id: i64,
    ) -> AppResult<ItemBookingSummary> {
        let item = self.load_item(item_id).await?;
        if !item.is_owned_by(actor_id) {
            return Ok(ItemBookingSummary::default());
        }

        let bookings = self.repository.bookings.find_approved_by_item(item_id).await?;
        Ok(ItemBookingSummary::from_bookings(&bookings, self.clock.now()))
    }

    /// Fails when the booking storage does not answer.
    pub async fn check_storage(&self) -> AppResult<()> {
        self.repository.bookings.ping().await
    }

    async fn list(
        &self,
        actor_id: i64,
        role: BookingRole,
        filter: BookingFilter,
        page: Page,
    ) -> AppResult<Vec<BookingDetails>> {
        self.ensure_user(actor_id).await?;

        let query = BookingQuery {
            subject_id: actor_id,
            role,
            filter,
            now: self.clock.now(),
            page,
        };
        tracing::debug!("Listing bookings: {:?}", query);

        let bookings = self.repository.bookings.find_for_subject(query).await?;
        self.with_items(bookings).await
    }

    /// Attach item references, resolving each distinct item once.
    async fn with_items(&self, bookings: Vec<Booking>) -> AppResult<Vec<BookingDetails>> {
        let mut items: HashMap<i64, ItemShort> = HashMap::new();
        let mut result = Vec::with_capacity(bookings.len());

        for booking in bookings {
            let item = match items.get(&booking.item_id) {
                Some(item) => item.clone(),
                None => {
                    let item = self.load_item(booking.item_id).await?.short();
                    items.insert(item.id, item.clone());
                    item
                }
            };
            result.push(BookingDetails::new(booking, item));
        }

        Ok(result)
    }

    fn validate_interval(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<()> {
        if start >= end {
            return Err(AppError::Validation(format!(
                "Booking start {} must be before its end {}",
                start, end
            )));
        }
        let now = self.clock.now();
        if start < now {
            return Err(AppError::Validation(format!(
                "Booking start {} is in the past (now {})",
                start, now
            )));
        }
        Ok(())
    }

    async fn load_item(&self, item_id: i64) -> AppResult<Item> {
        self.repository
            .items
            .find_by_id(item_id)
            .await?
            .ok_or_else(|| item_not_found(item_id))
    }

    async fn load_booking(&self, booking_id: i64) -> AppResult<Booking> {
        self.repository
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| booking_not_found(booking_id))
    }

    async fn ensure_user(&self, user_id: i64) -> AppResult<()> {
        self.repository
            .users
            .find_by_id(user_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| user_not_found(user_id))
    }
}
