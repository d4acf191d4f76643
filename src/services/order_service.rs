use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::models::{Order, ServiceError, ServiceResult};
use crate::repositories::OrderRepository;
use crate::services::OrderIdGenerator;

/// The eatery reference rejected by `new_order`; stands in for a real
/// foreign-key check against the directory.
pub const INVALID_EATERY_REF: &str = "0";

/// Owns the order lifecycle: creation, lookup, deletion and relative
/// quantity edits.  No other component mutates order state.
pub struct OrderService {
    repository: Arc<dyn OrderRepository>,
    id_generator: Arc<OrderIdGenerator>,
}

impl OrderService {
    pub fn new(repository: Arc<dyn OrderRepository>, id_generator: Arc<OrderIdGenerator>) -> Self {
        Self {
            repository,
            id_generator,
        }
    }

    /// Create an empty order for `eatery_id` under a fresh id.
    ///
    /// The id counter is not rolled back if the insert fails; the id
    /// space stays sparse, which has no correctness impact.
    #[instrument(skip(self), fields(eatery_id = %eatery_id))]
    pub async fn new_order(&self, eatery_id: &str) -> ServiceResult<Order> {
        if eatery_id == INVALID_EATERY_REF {
            warn!("Rejecting order for invalid eatery reference");
            return Err(ServiceError::InvalidEateryRef {
                id: eatery_id.to_string(),
            });
        }

        let order = Order::new(self.id_generator.next_id(), eatery_id.to_string());
        self.repository.insert(order.clone()).await?;

        info!(id = %order.id, "Order created");
        Ok(order)
    }

    /// Exact lookup by order id.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_order(&self, id: &str) -> ServiceResult<Order> {
        match self.repository.find_by_id(id).await? {
            Some(order) => Ok(order),
            None => Err(ServiceError::OrderNotFound { id: id.to_string() }),
        }
    }

    /// Delete an order; an id that matched nothing is NOT_FOUND.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn remove_order(&self, id: &str) -> ServiceResult<()> {
        if self.repository.delete(id).await? {
            info!("Order removed");
            Ok(())
        } else {
            Err(ServiceError::OrderNotFound { id: id.to_string() })
        }
    }

    /// Change the quantity of `item_id` by `delta`, relative to its
    /// current value (zero if the item is not yet present).  A result
    /// below zero or past `u32::MAX` is rejected and leaves the stored
    /// order unchanged; a result of exactly zero removes the item.
    /// Returns the updated order.
    ///
    /// Two concurrent edits of the same order race and the later write
    /// wins; lost updates are accepted here, not prevented.
    #[instrument(skip(self), fields(id = %id, item_id = %item_id, delta = delta))]
    pub async fn edit_order(&self, id: &str, item_id: &str, delta: i64) -> ServiceResult<Order> {
        let mut order = self.get_order(id).await?;

        if order.apply_delta(item_id, delta).is_none() {
            warn!("Edit would drive quantity out of range");
            return Err(ServiceError::NegativeQuantity {
                order_id: id.to_string(),
                item_id: item_id.to_string(),
                delta,
            });
        }

        // The store may have lost the order since the read; surface
        // that as the same NOT_FOUND the initial load would have given.
        if !self.repository.save_items(id, &order.items).await? {
            return Err(ServiceError::OrderNotFound { id: id.to_string() });
        }

        info!(quantity = order.quantity(item_id), "Order edited");
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RepositoryError;
    use crate::repositories::{InMemoryOrderRepository, MockOrderRepository};
    use mockall::predicate::*;

    fn service() -> OrderService {
        OrderService::new(
            Arc::new(InMemoryOrderRepository::new()),
            Arc::new(OrderIdGenerator::new(2)),
        )
    }

    #[tokio::test]
    async fn test_new_order_returns_id_and_eatery() {
        let service = service();
        let order = service.new_order("12.75").await.unwrap();

        assert_eq!(order.eatery_id, "12.75");
        assert!(order.items.is_empty());
        assert!(order.id.contains('_'));
    }

    #[tokio::test]
    async fn test_new_order_rejects_sentinel_eatery() {
        let service = service();
        let error = service.new_order(INVALID_EATERY_REF).await.unwrap_err();
        assert!(matches!(error, ServiceError::InvalidEateryRef { .. }));
        assert_eq!(error.code(), crate::models::ErrorCode::Db);
    }

    #[tokio::test]
    async fn test_get_order_round_trips() {
        let service = service();
        let created = service.new_order("12.75").await.unwrap();
        let fetched = service.get_order(&created.id).await.unwrap();
        assert_eq!(created, fetched);
    }

    #[tokio::test]
    async fn test_get_missing_order_is_not_found() {
        let service = service();
        let error = service.get_order("0_56").await.unwrap_err();
        assert!(matches!(error, ServiceError::OrderNotFound { .. }));
    }

    #[tokio::test]
    async fn test_remove_order_then_get_fails() {
        let service = service();
        let created = service.new_order("12.75").await.unwrap();

        service.remove_order(&created.id).await.unwrap();
        let error = service.get_order(&created.id).await.unwrap_err();
        assert!(matches!(error, ServiceError::OrderNotFound { .. }));
    }

    #[tokio::test]
    async fn test_remove_missing_order_is_not_found() {
        let service = service();
        let error = service.remove_order("0_56").await.unwrap_err();
        assert!(matches!(error, ServiceError::OrderNotFound { .. }));
    }

    #[tokio::test]
    async fn test_edit_adds_item_from_zero() {
        let service = service();
        let created = service.new_order("12.75").await.unwrap();

        let edited = service.edit_order(&created.id, "wonton", 5).await.unwrap();
        assert_eq!(edited.quantity("wonton"), 5);

        let stored = service.get_order(&created.id).await.unwrap();
        assert_eq!(stored.quantity("wonton"), 5);
    }

    #[tokio::test]
    async fn test_edit_down_to_zero_removes_item() {
        let service = service();
        let created = service.new_order("12.75").await.unwrap();

        service.edit_order(&created.id, "wonton", 5).await.unwrap();
        let edited = service.edit_order(&created.id, "wonton", -5).await.unwrap();

        assert!(!edited.items.contains_key("wonton"));
        let stored = service.get_order(&created.id).await.unwrap();
        assert!(stored.items.is_empty());
    }

    #[tokio::test]
    async fn test_edit_underflow_is_bad_request_and_keeps_state() {
        let service = service();
        let created = service.new_order("12.75").await.unwrap();
        service.edit_order(&created.id, "wonton", 2).await.unwrap();

        let error = service
            .edit_order(&created.id, "wonton", -3)
            .await
            .unwrap_err();
        assert!(matches!(error, ServiceError::NegativeQuantity { .. }));
        assert_eq!(error.code(), crate::models::ErrorCode::BadRequest);

        let stored = service.get_order(&created.id).await.unwrap();
        assert_eq!(stored.quantity("wonton"), 2);
    }

    #[tokio::test]
    async fn test_edit_past_u32_max_is_bad_request_and_keeps_state() {
        let service = service();
        let created = service.new_order("12.75").await.unwrap();
        service.edit_order(&created.id, "wonton", 2).await.unwrap();

        let error = service
            .edit_order(&created.id, "wonton", 1 << 32)
            .await
            .unwrap_err();
        assert!(matches!(error, ServiceError::NegativeQuantity { .. }));
        assert_eq!(error.code(), crate::models::ErrorCode::BadRequest);

        let stored = service.get_order(&created.id).await.unwrap();
        assert_eq!(stored.quantity("wonton"), 2);
    }

    #[tokio::test]
    async fn test_edit_missing_order_is_not_found() {
        let service = service();
        let error = service.edit_order("0_56", "wonton", 1).await.unwrap_err();
        assert!(matches!(error, ServiceError::OrderNotFound { .. }));
    }

    #[tokio::test]
    async fn test_edit_surfaces_lost_order_between_read_and_write() {
        let mut repository = MockOrderRepository::new();
        repository
            .expect_find_by_id()
            .with(eq("1_77"))
            .returning(|id| Ok(Some(Order::new(id.to_string(), "12.75".to_string()))));
        repository.expect_save_items().returning(|_, _| Ok(false));

        let service = OrderService::new(Arc::new(repository), Arc::new(OrderIdGenerator::new(2)));
        let error = service.edit_order("1_77", "wonton", 1).await.unwrap_err();
        assert!(matches!(error, ServiceError::OrderNotFound { .. }));
    }

    #[tokio::test]
    async fn test_insert_failure_surfaces_as_db_error() {
        let mut repository = MockOrderRepository::new();
        repository.expect_insert().returning(|_| {
            Err(RepositoryError::Driver {
                message: "socket closed".to_string(),
            })
        });

        let service = OrderService::new(Arc::new(repository), Arc::new(OrderIdGenerator::new(2)));
        let error = service.new_order("12.75").await.unwrap_err();
        assert_eq!(error.code(), crate::models::ErrorCode::Db);
    }
}
