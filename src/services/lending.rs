//! Lending engine: the lend/return transaction rules
//!
//! Both operations issue two writes against a store with no multi-row
//! transaction: the ledger write first, the copy-count write second. All
//! validation happens strictly before the first write, so a failed operation
//! leaves no observable state change and the copy count can never go
//! negative. A crash between the two writes can only over-count the loan;
//! that failure is surfaced as [`AppError::PartialWrite`] rather than plain
//! success or plain failure.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};

use crate::{
    error::{AppError, AppResult},
    models::Transaction,
    storage::DynStorage,
};

use super::cache::CatalogCache;

/// Loan period applied to every lend
pub const LOAN_PERIOD_DAYS: i64 = 14;

pub struct LendingService {
    storage: DynStorage,
    cache: Arc<CatalogCache>,
    // Serializes the read-validate-write critical section of both
    // operations, id assignment included
    write_lock: tokio::sync::Mutex<()>,
}

impl LendingService {
    pub fn new(storage: DynStorage, cache: Arc<CatalogCache>) -> Self {
        Self {
            storage,
            cache,
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Lend a book to a member
    ///
    /// Creates a ledger entry due `LOAN_PERIOD_DAYS` after `today` and
    /// decrements the book's available-copy count.
    pub async fn lend(
        &self,
        book_id: i64,
        member_id: i64,
        today: NaiveDate,
    ) -> AppResult<Transaction> {
        let _guard = self.write_lock.lock().await;

        let book = self.storage.get_book(book_id).await?;
        self.storage.get_member(member_id).await?;

        if book.available_copies <= 0 {
            return Err(AppError::NoCopiesAvailable { book_id });
        }

        let tx = Transaction {
            id: self.next_transaction_id().await?,
            member_id,
            book_id,
            borrow_date: today,
            due_date: today + Duration::days(LOAN_PERIOD_DAYS),
            return_date: None,
        };

        let id = self.storage.append_transaction(&tx).await?;

        let result = self
            .storage
            .update_available_copies(book_id, book.available_copies - 1)
            .await;
        self.cache.invalidate_writes().await;

        if let Err(e) = result {
            return Err(AppError::PartialWrite(format!(
                "Transaction {} recorded but available_copies of book {} was not decremented: {}",
                id, book_id, e
            )));
        }

        tracing::info!(
            transaction_id = id,
            book_id,
            member_id,
            due_date = %tx.due_date,
            "Book lent"
        );

        Ok(tx)
    }

    /// Mark a transaction returned
    ///
    /// Sets the return date and increments the book's available-copy count.
    /// Rejected with `AlreadyReturned` if the transaction is closed; a
    /// second call must never increment the count again.
    pub async fn return_book(
        &self,
        transaction_id: i64,
        today: NaiveDate,
    ) -> AppResult<Transaction> {
        let _guard = self.write_lock.lock().await;

        let mut tx = self.storage.get_transaction(transaction_id).await?;

        if tx.return_date.is_some() {
            return Err(AppError::AlreadyReturned { transaction_id });
        }

        let book = self.storage.get_book(tx.book_id).await?;

        self.storage.set_return_date(transaction_id, today).await?;
        tx.return_date = Some(today);

        let result = self
            .storage
            .update_available_copies(tx.book_id, book.available_copies + 1)
            .await;
        self.cache.invalidate_writes().await;

        if let Err(e) = result {
            return Err(AppError::PartialWrite(format!(
                "Transaction {} marked returned but available_copies of book {} was not incremented: {}",
                transaction_id, tx.book_id, e
            )));
        }

        tracing::info!(transaction_id, book_id = tx.book_id, "Book returned");

        Ok(tx)
    }

    /// Next ledger id: one past the current maximum, 1 for an empty ledger
    async fn next_transaction_id(&self) -> AppResult<i64> {
        let transactions = self.storage.list_transactions().await?;
        Ok(transactions.iter().map(|t| t.id).max().unwrap_or(0) + 1)
    }
}
