//! Storage access traits for the eatery directory and order store.
//!
//! The traits are the swappable seam between the services and a concrete
//! backend: [`mongo`] talks to a MongoDB cluster whose indexes answer the
//! spatial query, [`memory`] keeps everything in process behind an
//! r*-tree for tests and demos.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::models::{Eatery, LocatedEatery, Location, Order, RepositoryResult};

pub mod memory;
pub mod mongo;

pub use memory::{InMemoryEateryRepository, InMemoryOrderRepository};
pub use mongo::{MongoEateryRepository, MongoOrderRepository};

/// Meters per mile used for distance annotations; matches the divisor
/// the stored data was calibrated against.
pub const METERS_PER_MILE: f64 = 1600.0;

/// One spatial directory query: cuisine predicate, origin point and a
/// page window.  `cuisine` is already case-folded by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoQuery {
    pub cuisine: String,
    pub origin: Location,
    pub offset: usize,
    pub limit: usize,
}

/// Data access for eatery records.
///
/// `find_near` must be answered from the backend's cuisine and spatial
/// indexes, never by scanning the whole collection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EateryRepository: Send + Sync {
    /// Eateries matching the query's cuisine, sorted ascending by
    /// great-circle distance from the origin, windowed by
    /// `offset`/`limit`.  No matches is an empty vec, not an error.
    async fn find_near(&self, query: &GeoQuery) -> RepositoryResult<Vec<LocatedEatery>>;

    /// Exact-key lookup by public eatery id.
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Eatery>>;

    /// Bulk replace: clear all records, rebuild the cuisine and spatial
    /// indexes, insert every record in `eateries`.  A failed insert
    /// aborts the load and may leave the directory partially loaded;
    /// callers recover by retrying the full reload.
    async fn replace_all(&self, eateries: Vec<Eatery>) -> RepositoryResult<()>;
}

/// Data access for order records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert(&self, order: Order) -> RepositoryResult<()>;

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Order>>;

    /// Delete by id; `false` when no record matched.
    async fn delete(&self, id: &str) -> RepositoryResult<bool>;

    /// Persist the full items mapping for an order; `false` when the
    /// order no longer exists.
    async fn save_items(&self, id: &str, items: &BTreeMap<String, u32>) -> RepositoryResult<bool>;
}
