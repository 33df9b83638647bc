//! Catalog search and listing

use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{Book, Member},
    storage::DynStorage,
};

use super::cache::CatalogCache;

pub struct CatalogService {
    storage: DynStorage,
    cache: Arc<CatalogCache>,
}

impl CatalogService {
    pub fn new(storage: DynStorage, cache: Arc<CatalogCache>) -> Self {
        Self { storage, cache }
    }

    /// Title-prefix search over books with at least one lendable copy
    pub async fn search_books(&self, prefix: &str) -> AppResult<Vec<Book>> {
        let prefix = prefix.to_lowercase();
        let books = self.list_books().await?;
        Ok(books
            .into_iter()
            .filter(|b| b.available_copies > 0 && b.title.to_lowercase().starts_with(&prefix))
            .collect())
    }

    /// Name-prefix search over members
    pub async fn search_members(&self, prefix: &str) -> AppResult<Vec<Member>> {
        let prefix = prefix.to_lowercase();
        let members = self.list_members().await?;
        Ok(members
            .into_iter()
            .filter(|m| m.name.to_lowercase().starts_with(&prefix))
            .collect())
    }

    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        let books = self
            .cache
            .books
            .get_or_load(|| self.storage.list_books())
            .await?;
        Ok(books.as_ref().clone())
    }

    pub async fn list_members(&self) -> AppResult<Vec<Member>> {
        let members = self
            .cache
            .members
            .get_or_load(|| self.storage.list_members())
            .await?;
        Ok(members.as_ref().clone())
    }

    pub async fn get_book(&self, id: i64) -> AppResult<Book> {
        self.storage.get_book(id).await
    }

    pub async fn get_member(&self, id: i64) -> AppResult<Member> {
        self.storage.get_member(id).await
    }
}
