//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::db::{InMemoryOrderRepository, OrderRepository, PgOrderRepository};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the order repository and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: Option<PgPool>,
    orders: Arc<dyn OrderRepository>,
}

impl AppState {
    /// Create state backed by `PostgreSQL`.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let orders = Arc::new(PgOrderRepository::new(pool.clone()));
        Self::from_parts(config, Some(pool), orders)
    }

    /// Create state that keeps orders in process memory.
    #[must_use]
    pub fn in_memory(config: StorefrontConfig) -> Self {
        Self::from_parts(config, None, Arc::new(InMemoryOrderRepository::new()))
    }

    /// Create state around any order repository.
    #[must_use]
    pub fn with_orders(config: StorefrontConfig, orders: Arc<dyn OrderRepository>) -> Self {
        Self::from_parts(config, None, orders)
    }

    fn from_parts(
        config: StorefrontConfig,
        pool: Option<PgPool>,
        orders: Arc<dyn OrderRepository>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                orders,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get the database pool, if one is configured.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Get the order repository.
    #[must_use]
    pub fn orders(&self) -> &dyn OrderRepository {
        self.inner.orders.as_ref()
    }
}
