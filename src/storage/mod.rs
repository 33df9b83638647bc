//! Storage layer: the catalog/ledger abstraction and its backends
//!
//! The lending engine talks to storage only through [`Storage`]; backends
//! resolve record locations from logical ids internally, so no storage-layout
//! detail leaks upward.

pub mod memory;
pub mod postgres;
pub mod sheet;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    config::{StorageBackend, StorageConfig},
    error::AppResult,
    models::{Book, Member, Transaction},
};

/// Catalog store + transaction ledger operations
///
/// `append_transaction` persists an engine-assembled record and echoes the
/// assigned id; id generation itself belongs to the engine.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get_book(&self, id: i64) -> AppResult<Book>;

    async fn get_member(&self, id: i64) -> AppResult<Member>;

    async fn update_available_copies(&self, book_id: i64, new_value: i32) -> AppResult<()>;

    async fn append_transaction(&self, tx: &Transaction) -> AppResult<i64>;

    async fn get_transaction(&self, id: i64) -> AppResult<Transaction>;

    async fn set_return_date(&self, tx_id: i64, date: NaiveDate) -> AppResult<()>;

    async fn list_transactions(&self) -> AppResult<Vec<Transaction>>;

    async fn list_books(&self) -> AppResult<Vec<Book>>;

    async fn list_members(&self) -> AppResult<Vec<Member>>;
}

/// Shared handle to the configured storage backend
pub type DynStorage = Arc<dyn Storage>;

/// Open the storage backend selected by configuration
pub async fn connect(config: &StorageConfig) -> AppResult<DynStorage> {
    match config.backend {
        StorageBackend::Postgres => {
            let storage = postgres::PgStorage::connect(config).await?;
            Ok(Arc::new(storage))
        }
        StorageBackend::Sheet => {
            let storage = sheet::SheetStorage::open(&config.sheet_dir).await?;
            Ok(Arc::new(storage))
        }
        StorageBackend::Memory => Ok(Arc::new(memory::MemoryStorage::new())),
    }
}
