//! Book (catalog entry) model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A catalog book with its lendable-copy counter.
///
/// `available_copies` is mutated only by the lending engine and never goes
/// below zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub available_copies: i32,
}
