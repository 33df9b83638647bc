//! Business logic services

pub mod cache;
pub mod catalog;
pub mod confirm;
pub mod lending;
pub mod queries;

use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::{CacheConfig, ConfirmConfig},
    storage::DynStorage,
};

/// Container for all services
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub lending: lending::LendingService,
    pub queries: queries::QueryService,
    pub confirm: confirm::ConfirmService,
}

impl Services {
    /// Create all services over the given storage handle
    pub fn new(
        storage: DynStorage,
        cache_config: &CacheConfig,
        confirm_config: &ConfirmConfig,
    ) -> Self {
        let cache = Arc::new(cache::CatalogCache::new(Duration::from_secs(
            cache_config.ttl_seconds,
        )));

        Self {
            catalog: catalog::CatalogService::new(storage.clone(), cache.clone()),
            lending: lending::LendingService::new(storage.clone(), cache.clone()),
            queries: queries::QueryService::new(storage, cache),
            confirm: confirm::ConfirmService::new(Duration::from_secs(
                confirm_config.token_ttl_seconds,
            )),
        }
    }
}
