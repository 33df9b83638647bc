//! Lending transaction model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A ledger entry for one lent copy.
///
/// Created only by `lend`; the sole later mutation is `return_book` setting
/// `return_date`, a one-way transition. Never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Transaction {
    pub id: i64,
    pub member_id: i64,
    pub book_id: i64,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
}

impl Transaction {
    /// An open transaction represents one outstanding copy of its book.
    pub fn is_open(&self) -> bool {
        self.return_date.is_none()
    }
}

/// Transaction joined with book title and member name, for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionDetails {
    pub id: i64,
    pub member_name: String,
    pub book_title: String,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub is_overdue: bool,
}

/// Aggregate counters for the stats endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LibraryStats {
    pub books: usize,
    pub members: usize,
    pub active_loans: usize,
    pub overdue_loans: usize,
}
