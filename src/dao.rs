use std::sync::Arc;

use mongodb::{bson::doc, Client};
use tracing::{info, instrument};

use crate::config::Config;
use crate::models::{
    DaoResult, Eatery, EateryPage, ErrorCode, Errors, Location, Order,
};
use crate::repositories::{
    InMemoryEateryRepository, InMemoryOrderRepository, MongoEateryRepository,
    MongoOrderRepository,
};
use crate::services::{EateryService, OrderIdGenerator, OrderService};

enum Backend {
    Mongo(Client),
    Memory,
}

/// Single entry point over the eatery directory and the order store.
///
/// Every operation returns either a value or an [`Errors`] carrier with
/// at least one `{message, code}` entry; nothing here panics on bad
/// input or a downed store.
pub struct ChowDao {
    eateries: EateryService,
    orders: OrderService,
    backend: Backend,
    default_origin: Location,
    default_count: usize,
}

impl ChowDao {
    /// Connect to MongoDB and validate the connection with a ping.
    pub async fn connect(config: &Config) -> DaoResult<Self> {
        let client = Client::with_uri_str(&config.database.url)
            .await
            .map_err(|e| connect_error(&config.database.url, &e.to_string()))?;

        let database = client.database(&config.database.database_name);
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| connect_error(&config.database.url, &e.to_string()))?;

        info!(
            "Connected to database {} at {}",
            config.database.database_name, config.database.url
        );

        let eatery_repo = Arc::new(MongoEateryRepository::new(&database));
        let order_repo = Arc::new(MongoOrderRepository::new(&database));
        let id_generator = Arc::new(OrderIdGenerator::new(config.orders.id_suffix_len));

        Ok(Self {
            eateries: EateryService::new(eatery_repo),
            orders: OrderService::new(order_repo, id_generator),
            backend: Backend::Mongo(client),
            default_origin: config.default_origin(),
            default_count: config.search.default_count,
        })
    }

    /// Build a DAO over the in-process backend.  Used by tests and
    /// demos; persists nothing.
    pub fn in_memory(config: &Config) -> Self {
        let eatery_repo = Arc::new(InMemoryEateryRepository::new());
        let order_repo = Arc::new(InMemoryOrderRepository::new());
        let id_generator = Arc::new(OrderIdGenerator::new(config.orders.id_suffix_len));

        Self {
            eateries: EateryService::new(eatery_repo),
            orders: OrderService::new(order_repo, id_generator),
            backend: Backend::Memory,
            default_origin: config.default_origin(),
            default_count: config.search.default_count,
        }
    }

    /// Release the underlying connection.  Consumes the DAO so the
    /// connection is released exactly once.
    pub async fn close(self) {
        match self.backend {
            Backend::Mongo(client) => {
                client.shutdown().await;
                info!("Database connection closed");
            }
            Backend::Memory => {}
        }
    }

    /// Page of eateries with the given cuisine, nearest first.
    /// `origin` and `count` fall back to the configured defaults.
    #[instrument(skip(self))]
    pub async fn locate_eateries(
        &self,
        cuisine: &str,
        origin: Option<Location>,
        offset: usize,
        count: Option<usize>,
    ) -> DaoResult<EateryPage> {
        let origin = origin.unwrap_or(self.default_origin);
        let count = count.unwrap_or(self.default_count);
        let page = self.eateries.locate(cuisine, origin, offset, count).await?;
        Ok(page)
    }

    #[instrument(skip(self))]
    pub async fn get_eatery(&self, id: &str) -> DaoResult<Eatery> {
        let eatery = self.eateries.get_eatery(id).await?;
        Ok(eatery)
    }

    /// Replace the whole directory with `eateries`.  A failure part way
    /// through can leave a partial load; callers recover by reloading.
    #[instrument(skip(self, eateries))]
    pub async fn load_eateries(&self, eateries: Vec<Eatery>) -> DaoResult<()> {
        self.eateries.load_eateries(eateries).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn new_order(&self, eatery_id: &str) -> DaoResult<Order> {
        let order = self.orders.new_order(eatery_id).await?;
        Ok(order)
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, id: &str) -> DaoResult<Order> {
        let order = self.orders.get_order(id).await?;
        Ok(order)
    }

    #[instrument(skip(self))]
    pub async fn remove_order(&self, id: &str) -> DaoResult<()> {
        self.orders.remove_order(id).await?;
        Ok(())
    }

    /// Adjust the quantity of `item_id` on an order by a signed `delta`
    /// and return the updated order.
    #[instrument(skip(self))]
    pub async fn edit_order(&self, id: &str, item_id: &str, delta: i64) -> DaoResult<Order> {
        let order = self.orders.edit_order(id, item_id, delta).await?;
        Ok(order)
    }
}

fn connect_error(url: &str, message: &str) -> Errors {
    Errors::single(
        format!("Cannot connect to {}: {}", url, message),
        ErrorCode::Db,
    )
}
