//! MongoDB-backed repositories.
//!
//! Eatery documents carry two storage-internal fields next to the public
//! record: `_cuisine` (case-folded, under a hashed index) and `_location`
//! (GeoJSON point, under a `2dsphere` index).  `locate` queries run as a
//! `$geoNear` aggregation against those indexes; nothing here scans the
//! collection.  The internal fields are stripped before a record leaves
//! the repository.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{self, doc, Bson};
use mongodb::{Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

use super::{EateryRepository, GeoQuery, OrderRepository, METERS_PER_MILE};
use crate::models::{
    Eatery, LocatedEatery, Location, MenuItem, Order, RepositoryError, RepositoryResult,
};

pub const EATERIES_COLLECTION: &str = "eateries";
pub const ORDERS_COLLECTION: &str = "orders";

/// Derive a storage key from a public id, folding characters the store
/// disallows in keys.
pub(crate) fn storage_key(id: &str) -> String {
    id.replace('.', "_")
}

fn to_bson_value<T: Serialize>(value: &T) -> RepositoryResult<Bson> {
    bson::to_bson(value).map_err(|e| RepositoryError::InvalidDocument {
        message: e.to_string(),
    })
}

/// GeoJSON point as the `2dsphere` index expects it: `[lng, lat]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeoJsonPoint {
    #[serde(rename = "type")]
    kind: String,
    coordinates: [f64; 2],
}

impl GeoJsonPoint {
    fn new(loc: &Location) -> Self {
        Self {
            kind: "Point".to_string(),
            coordinates: [loc.lng, loc.lat],
        }
    }
}

/// Stored eatery document: the public record plus index-only fields.
#[derive(Debug, Serialize, Deserialize)]
struct EateryDoc {
    #[serde(rename = "_id")]
    key: String,
    id: String,
    name: String,
    cuisine: String,
    loc: Location,
    #[serde(default)]
    menu_categories: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    menu_items: BTreeMap<String, MenuItem>,
    #[serde(rename = "_cuisine")]
    cuisine_folded: String,
    #[serde(rename = "_location")]
    location: GeoJsonPoint,
}

impl From<Eatery> for EateryDoc {
    fn from(eatery: Eatery) -> Self {
        Self {
            key: storage_key(&eatery.id),
            cuisine_folded: eatery.cuisine.to_lowercase(),
            location: GeoJsonPoint::new(&eatery.loc),
            id: eatery.id,
            name: eatery.name,
            cuisine: eatery.cuisine,
            loc: eatery.loc,
            menu_categories: eatery.menu_categories,
            menu_items: eatery.menu_items,
        }
    }
}

impl EateryDoc {
    /// Drop the storage-internal fields and return the public record.
    fn into_eatery(self) -> Eatery {
        Eatery {
            id: self.id,
            name: self.name,
            cuisine: self.cuisine,
            loc: self.loc,
            menu_categories: self.menu_categories,
            menu_items: self.menu_items,
        }
    }
}

/// MongoDB implementation of the [`EateryRepository`] trait.
pub struct MongoEateryRepository {
    collection: Collection<EateryDoc>,
}

impl MongoEateryRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(EATERIES_COLLECTION),
        }
    }
}

#[async_trait]
impl EateryRepository for MongoEateryRepository {
    #[instrument(skip(self), fields(cuisine = %query.cuisine, offset = query.offset, limit = query.limit))]
    async fn find_near(&self, query: &GeoQuery) -> RepositoryResult<Vec<LocatedEatery>> {
        let pipeline = vec![
            doc! {
                "$geoNear": {
                    "near": {
                        "type": "Point",
                        "coordinates": [query.origin.lng, query.origin.lat],
                    },
                    "spherical": true,
                    "query": { "_cuisine": &query.cuisine },
                    "distanceField": "dist",
                    "distanceMultiplier": 1.0 / METERS_PER_MILE,
                }
            },
            doc! { "$skip": query.offset as i64 },
            doc! { "$limit": query.limit.max(1) as i64 },
            doc! { "$project": { "_id": 0, "id": 1, "name": 1, "cuisine": 1, "loc": 1, "dist": 1 } },
        ];

        let mut cursor = self.collection.aggregate(pipeline).await?;
        let mut eateries = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            match bson::from_document::<LocatedEatery>(document) {
                Ok(eatery) => eateries.push(eatery),
                Err(e) => {
                    warn!("Skipping malformed eatery document: {}", e);
                    continue;
                }
            }
        }

        info!("Found {} eateries", eateries.len());
        Ok(eateries)
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Eatery>> {
        let found = self
            .collection
            .find_one(doc! { "_id": storage_key(id) })
            .await?;
        Ok(found.map(EateryDoc::into_eatery))
    }

    #[instrument(skip(self, eateries), fields(count = eateries.len()))]
    async fn replace_all(&self, eateries: Vec<Eatery>) -> RepositoryResult<()> {
        self.collection.delete_many(doc! {}).await?;

        // Indexes are rebuilt on every reload, never patched.
        self.collection
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "_cuisine": "hashed" })
                    .build(),
            )
            .await?;
        self.collection
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "_location": "2dsphere" })
                    .build(),
            )
            .await?;

        // A failed insert aborts the load; the directory may be left
        // partially loaded and callers must retry the full reload.
        for eatery in eateries {
            let document = EateryDoc::from(eatery);
            self.collection.insert_one(&document).await?;
        }

        info!("Eatery directory reloaded");
        Ok(())
    }
}

/// Stored order document; `_id` doubles as the public order id.
#[derive(Debug, Serialize, Deserialize)]
struct OrderDoc {
    #[serde(rename = "_id")]
    key: String,
    id: String,
    eatery_id: String,
    #[serde(default)]
    items: BTreeMap<String, u32>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Order> for OrderDoc {
    fn from(order: Order) -> Self {
        Self {
            key: order.id.clone(),
            id: order.id,
            eatery_id: order.eatery_id,
            items: order.items,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

impl OrderDoc {
    fn into_order(self) -> Order {
        Order {
            id: self.id,
            eatery_id: self.eatery_id,
            items: self.items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// MongoDB implementation of the [`OrderRepository`] trait.
pub struct MongoOrderRepository {
    collection: Collection<OrderDoc>,
}

impl MongoOrderRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(ORDERS_COLLECTION),
        }
    }
}

#[async_trait]
impl OrderRepository for MongoOrderRepository {
    #[instrument(skip(self, order), fields(id = %order.id, eatery_id = %order.eatery_id))]
    async fn insert(&self, order: Order) -> RepositoryResult<()> {
        let document = OrderDoc::from(order);
        self.collection.insert_one(&document).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Order>> {
        let found = self.collection.find_one(doc! { "_id": id }).await?;
        Ok(found.map(OrderDoc::into_order))
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete(&self, id: &str) -> RepositoryResult<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    #[instrument(skip(self, items), fields(id = %id, item_count = items.len()))]
    async fn save_items(&self, id: &str, items: &BTreeMap<String, u32>) -> RepositoryResult<bool> {
        let items_bson = to_bson_value(items)?;
        let updated_at = to_bson_value(&chrono::Utc::now())?;
        let result = self
            .collection
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "items": items_bson, "updated_at": updated_at } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }
}
