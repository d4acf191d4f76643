//! In-process repositories backed by per-cuisine r*-trees.
//!
//! This backend answers the same contract as the MongoDB one without a
//! running cluster, which is what the integration tests and local demos
//! use.  `replace_all` rebuilds one `RTree` per case-folded cuisine;
//! `find_near` walks the matching tree's nearest-neighbour iterator and
//! annotates hits with the haversine distance in miles.

use async_trait::async_trait;
use geo::{Distance, Haversine, Point};
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use tracing::{info, instrument};

use super::{EateryRepository, GeoQuery, OrderRepository, METERS_PER_MILE};
use crate::models::{
    Eatery, LocatedEatery, Location, Order, RepositoryError, RepositoryResult,
};

/// Entry stored inside a cuisine's spatial index: id plus `[lng, lat]`.
#[derive(Debug, Clone)]
struct IndexedEatery {
    id: String,
    point: [f64; 2],
}

impl RTreeObject for IndexedEatery {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for IndexedEatery {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Great-circle distance between two locations, in miles.
fn haversine_miles(a: &Location, b: &Location) -> f64 {
    let meters = Haversine.distance(Point::new(a.lng, a.lat), Point::new(b.lng, b.lat));
    meters / METERS_PER_MILE
}

#[derive(Default)]
struct DirectoryIndex {
    by_id: HashMap<String, Eatery>,
    by_cuisine: HashMap<String, RTree<IndexedEatery>>,
}

/// In-memory implementation of the [`EateryRepository`] trait.
#[derive(Default)]
pub struct InMemoryEateryRepository {
    inner: RwLock<DirectoryIndex>,
}

impl InMemoryEateryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(_: impl std::fmt::Debug) -> RepositoryError {
    RepositoryError::Driver {
        message: "directory lock poisoned".to_string(),
    }
}

#[async_trait]
impl EateryRepository for InMemoryEateryRepository {
    #[instrument(skip(self), fields(cuisine = %query.cuisine, offset = query.offset, limit = query.limit))]
    async fn find_near(&self, query: &GeoQuery) -> RepositoryResult<Vec<LocatedEatery>> {
        let index = self.inner.read().map_err(poisoned)?;

        let Some(tree) = index.by_cuisine.get(&query.cuisine) else {
            return Ok(Vec::new());
        };

        let origin = [query.origin.lng, query.origin.lat];
        let mut located: Vec<LocatedEatery> = tree
            .nearest_neighbor_iter(&origin)
            .filter_map(|entry| index.by_id.get(&entry.id))
            .map(|eatery| LocatedEatery {
                id: eatery.id.clone(),
                name: eatery.name.clone(),
                cuisine: eatery.cuisine.clone(),
                loc: eatery.loc,
                dist: haversine_miles(&query.origin, &eatery.loc),
            })
            .collect();

        // The tree iterates in planar-degree order; the contract is
        // great-circle order, so settle ties and edge cases here.
        located.sort_by(|a, b| {
            a.dist
                .partial_cmp(&b.dist)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(located
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Eatery>> {
        let index = self.inner.read().map_err(poisoned)?;
        Ok(index.by_id.get(id).cloned())
    }

    #[instrument(skip(self, eateries), fields(count = eateries.len()))]
    async fn replace_all(&self, eateries: Vec<Eatery>) -> RepositoryResult<()> {
        let mut buckets: HashMap<String, Vec<IndexedEatery>> = HashMap::new();
        let mut by_id = HashMap::with_capacity(eateries.len());

        for eatery in eateries {
            buckets
                .entry(eatery.cuisine.to_lowercase())
                .or_default()
                .push(IndexedEatery {
                    id: eatery.id.clone(),
                    point: [eatery.loc.lng, eatery.loc.lat],
                });
            by_id.insert(eatery.id.clone(), eatery);
        }

        let by_cuisine = buckets
            .into_iter()
            .map(|(cuisine, entries)| (cuisine, RTree::bulk_load(entries)))
            .collect();

        let mut index = self.inner.write().map_err(poisoned)?;
        *index = DirectoryIndex { by_id, by_cuisine };
        info!("Eatery directory reloaded");
        Ok(())
    }
}

/// In-memory implementation of the [`OrderRepository`] trait.
#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<String, Order>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    #[instrument(skip(self, order), fields(id = %order.id))]
    async fn insert(&self, order: Order) -> RepositoryResult<()> {
        let mut orders = self.orders.write().map_err(poisoned)?;
        orders.insert(order.id.clone(), order);
        Ok(())
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Order>> {
        let orders = self.orders.read().map_err(poisoned)?;
        Ok(orders.get(id).cloned())
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete(&self, id: &str) -> RepositoryResult<bool> {
        let mut orders = self.orders.write().map_err(poisoned)?;
        Ok(orders.remove(id).is_some())
    }

    #[instrument(skip(self, items), fields(id = %id, item_count = items.len()))]
    async fn save_items(&self, id: &str, items: &BTreeMap<String, u32>) -> RepositoryResult<bool> {
        let mut orders = self.orders.write().map_err(poisoned)?;
        match orders.get_mut(id) {
            Some(order) => {
                order.items = items.clone();
                order.updated_at = chrono::Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
