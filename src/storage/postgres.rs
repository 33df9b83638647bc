//! Relational storage backend (PostgreSQL)

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

use crate::{
    config::StorageConfig,
    error::{AppError, AppResult, Entity},
    models::{Book, Member, Transaction},
};

use super::Storage;

#[derive(Clone)]
pub struct PgStorage {
    pool: Pool<Postgres>,
}

impl PgStorage {
    /// Connect to the database and apply pending migrations
    pub async fn connect(config: &StorageConfig) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(&config.url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::Storage(format!("Migration failed: {}", e)))?;

        Ok(Self { pool })
    }

    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn get_book(&self, id: i64) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT id, title, available_copies FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound {
                entity: Entity::Book,
                id,
            })
    }

    async fn get_member(&self, id: i64) -> AppResult<Member> {
        sqlx::query_as::<_, Member>("SELECT id, name FROM members WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound {
                entity: Entity::Member,
                id,
            })
    }

    async fn update_available_copies(&self, book_id: i64, new_value: i32) -> AppResult<()> {
        let result = sqlx::query("UPDATE books SET available_copies = $2 WHERE id = $1")
            .bind(book_id)
            .bind(new_value)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound {
                entity: Entity::Book,
                id: book_id,
            });
        }

        Ok(())
    }

    async fn append_transaction(&self, tx: &Transaction) -> AppResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO transactions (id, member_id, book_id, borrow_date, due_date, return_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(tx.id)
        .bind(tx.member_id)
        .bind(tx.book_id)
        .bind(tx.borrow_date)
        .bind(tx.due_date)
        .bind(tx.return_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn get_transaction(&self, id: i64) -> AppResult<Transaction> {
        sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound {
                entity: Entity::Transaction,
                id,
            })
    }

    async fn set_return_date(&self, tx_id: i64, date: NaiveDate) -> AppResult<()> {
        let result = sqlx::query("UPDATE transactions SET return_date = $2 WHERE id = $1")
            .bind(tx_id)
            .bind(date)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound {
                entity: Entity::Transaction,
                id: tx_id,
            });
        }

        Ok(())
    }

    async fn list_transactions(&self) -> AppResult<Vec<Transaction>> {
        let transactions =
            sqlx::query_as::<_, Transaction>("SELECT * FROM transactions ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(transactions)
    }

    async fn list_books(&self) -> AppResult<Vec<Book>> {
        let books =
            sqlx::query_as::<_, Book>("SELECT id, title, available_copies FROM books ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(books)
    }

    async fn list_members(&self) -> AppResult<Vec<Member>> {
        let members = sqlx::query_as::<_, Member>("SELECT id, name FROM members ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(members)
    }
}
