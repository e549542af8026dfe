//! Data models for ShareIt

pub mod booking;
pub mod item;
pub mod user;

// Re-export commonly used types
pub use booking::{
    Booking, BookingDetails, BookingFilter, BookingQuery, BookingRole, BookingStatus,
    ItemBookingSummary, NewBooking, Page,
};
pub use item::{Item, ItemShort};
pub use user::{User, UserRef};
