//! Read-only projections over the ledger

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::{
    error::AppResult,
    models::{LibraryStats, Transaction, TransactionDetails},
    storage::DynStorage,
};

use super::cache::CatalogCache;

pub struct QueryService {
    storage: DynStorage,
    cache: Arc<CatalogCache>,
}

impl QueryService {
    pub fn new(storage: DynStorage, cache: Arc<CatalogCache>) -> Self {
        Self { storage, cache }
    }

    /// Most recent transactions, joined with book title and member name
    ///
    /// Ordered by borrow date descending, newest ledger entry first among
    /// ties. Entries whose book or member no longer resolves are omitted.
    pub async fn recent_transactions(
        &self,
        limit: usize,
        today: NaiveDate,
    ) -> AppResult<Vec<TransactionDetails>> {
        let transactions = self.load_transactions().await?;

        let books: HashMap<i64, String> = self
            .cache
            .books
            .get_or_load(|| self.storage.list_books())
            .await?
            .iter()
            .map(|b| (b.id, b.title.clone()))
            .collect();
        let members: HashMap<i64, String> = self
            .cache
            .members
            .get_or_load(|| self.storage.list_members())
            .await?
            .iter()
            .map(|m| (m.id, m.name.clone()))
            .collect();

        let mut ordered: Vec<&Transaction> = transactions.iter().collect();
        ordered.sort_by(|a, b| {
            b.borrow_date
                .cmp(&a.borrow_date)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(ordered
            .into_iter()
            .filter_map(|tx| {
                let book_title = books.get(&tx.book_id)?.clone();
                let member_name = members.get(&tx.member_id)?.clone();
                Some(TransactionDetails {
                    id: tx.id,
                    member_name,
                    book_title,
                    borrow_date: tx.borrow_date,
                    due_date: tx.due_date,
                    return_date: tx.return_date,
                    is_overdue: tx.is_open() && tx.due_date < today,
                })
            })
            .take(limit)
            .collect())
    }

    /// All open transactions, soonest due first
    pub async fn outstanding_loans(&self) -> AppResult<Vec<Transaction>> {
        let transactions = self.load_transactions().await?;
        let mut open: Vec<Transaction> = transactions
            .iter()
            .filter(|tx| tx.is_open())
            .cloned()
            .collect();
        open.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.id.cmp(&b.id)));
        Ok(open)
    }

    /// Aggregate counters for the stats endpoint
    pub async fn stats(&self, today: NaiveDate) -> AppResult<LibraryStats> {
        let books = self
            .cache
            .books
            .get_or_load(|| self.storage.list_books())
            .await?;
        let members = self
            .cache
            .members
            .get_or_load(|| self.storage.list_members())
            .await?;
        let transactions = self.load_transactions().await?;

        let active_loans = transactions.iter().filter(|tx| tx.is_open()).count();
        let overdue_loans = transactions
            .iter()
            .filter(|tx| tx.is_open() && tx.due_date < today)
            .count();

        Ok(LibraryStats {
            books: books.len(),
            members: members.len(),
            active_loans,
            overdue_loans,
        })
    }

    pub async fn get_transaction(&self, id: i64) -> AppResult<Transaction> {
        self.storage.get_transaction(id).await
    }

    async fn load_transactions(&self) -> AppResult<Arc<Vec<Transaction>>> {
        self.cache
            .transactions
            .get_or_load(|| self.storage.list_transactions())
            .await
    }
}
