//! ShareIt item sharing server
//!
//! Users list items for temporary loan; other users request a time window on
//! an item and the owner approves or rejects the request. This crate holds the
//! booking lifecycle engine and a REST JSON API in front of it.

use std::sync::Arc;

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
