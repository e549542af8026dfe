//! Business logic services

pub mod bookings;
pub mod locks;
pub mod overlap;

use std::sync::Arc;

use crate::{clock::Clock, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub bookings: bookings::BookingsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, clock: Arc<dyn Clock>) -> Self {
        Self {
            bookings: bookings::BookingsService::new(repository, clock),
        }
    }
}
