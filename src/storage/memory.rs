//! In-process storage backend, for tests and demos

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    error::{AppError, AppResult, Entity},
    models::{Book, Member, Transaction},
};

use super::Storage;

#[derive(Default)]
struct Inner {
    books: BTreeMap<i64, Book>,
    members: BTreeMap<i64, Member>,
    transactions: BTreeMap<i64, Transaction>,
}

#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_book(&self, book: Book) {
        let mut inner = self.inner.lock().unwrap();
        inner.books.insert(book.id, book);
    }

    pub fn seed_member(&self, member: Member) {
        let mut inner = self.inner.lock().unwrap();
        inner.members.insert(member.id, member);
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_book(&self, id: i64) -> AppResult<Book> {
        let inner = self.inner.lock().unwrap();
        inner.books.get(&id).cloned().ok_or(AppError::NotFound {
            entity: Entity::Book,
            id,
        })
    }

    async fn get_member(&self, id: i64) -> AppResult<Member> {
        let inner = self.inner.lock().unwrap();
        inner.members.get(&id).cloned().ok_or(AppError::NotFound {
            entity: Entity::Member,
            id,
        })
    }

    async fn update_available_copies(&self, book_id: i64, new_value: i32) -> AppResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let book = inner.books.get_mut(&book_id).ok_or(AppError::NotFound {
            entity: Entity::Book,
            id: book_id,
        })?;
        book.available_copies = new_value;
        Ok(())
    }

    async fn append_transaction(&self, tx: &Transaction) -> AppResult<i64> {
        let mut inner = self.inner.lock().unwrap();
        inner.transactions.insert(tx.id, tx.clone());
        Ok(tx.id)
    }

    async fn get_transaction(&self, id: i64) -> AppResult<Transaction> {
        let inner = self.inner.lock().unwrap();
        inner
            .transactions
            .get(&id)
            .cloned()
            .ok_or(AppError::NotFound {
                entity: Entity::Transaction,
                id,
            })
    }

    async fn set_return_date(&self, tx_id: i64, date: NaiveDate) -> AppResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let tx = inner
            .transactions
            .get_mut(&tx_id)
            .ok_or(AppError::NotFound {
                entity: Entity::Transaction,
                id: tx_id,
            })?;
        tx.return_date = Some(date);
        Ok(())
    }

    async fn list_transactions(&self) -> AppResult<Vec<Transaction>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.transactions.values().cloned().collect())
    }

    async fn list_books(&self) -> AppResult<Vec<Book>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.books.values().cloned().collect())
    }

    async fn list_members(&self) -> AppResult<Vec<Member>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.members.values().cloned().collect())
    }
}
