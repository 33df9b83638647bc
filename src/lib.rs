//! Jigyasa Library Lending System
//!
//! A Rust implementation of the Jigyasa library lending server, providing a
//! REST JSON API over a pluggable catalog/ledger store: search books and
//! members, lend books, and record returns.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
