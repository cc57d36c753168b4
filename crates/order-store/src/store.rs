use async_trait::async_trait;
use common::OrderId;

use crate::{NewOrder, Order, Result, ShippingWrite, StatusWrite, StockAdjustment};

/// Decides, inside the status-change transaction, which stock adjustments the
/// change requires.
///
/// The planner sees the order as loaded in the transaction, before the write.
/// Returning an error aborts the transaction with nothing applied. Planners
/// may run more than once when the operation is retried, so they must not
/// have side effects.
pub type ChangePlan<'a> = &'a (dyn Fn(&Order) -> Result<Vec<StockAdjustment>> + Send + Sync);

/// Core trait for order store implementations.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts an order and its items. The order starts `PENDING`.
    async fn create_order(&self, order: NewOrder) -> Result<Order>;

    /// Loads an order with its items.
    ///
    /// Returns None if the order doesn't exist.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists all orders, newest first.
    async fn list_orders(&self) -> Result<Vec<Order>>;

    /// Applies a status change atomically.
    ///
    /// Within one transaction the order is loaded, `plan` is consulted, every
    /// returned adjustment is subtracted from its product's stock, and the
    /// status/payment fields are written with a fresh `updated_at`. Either
    /// everything applies or nothing does.
    async fn update_status(
        &self,
        id: OrderId,
        write: StatusWrite,
        plan: ChangePlan<'_>,
    ) -> Result<Order>;

    /// Writes the shipping metadata of an order.
    async fn update_shipping(&self, id: OrderId, write: ShippingWrite) -> Result<Order>;

    /// Hard-deletes an order together with its items.
    async fn delete_order(&self, id: OrderId) -> Result<()>;

    /// Re-establishes connectivity after a transient failure.
    ///
    /// The default does nothing, for stores without a connection.
    async fn reconnect(&self) -> Result<()> {
        Ok(())
    }
}

/// Extension trait providing convenience methods for order stores.
#[async_trait]
pub trait OrderStoreExt: OrderStore {
    /// Loads an order, turning absence into `StoreError::NotFound`.
    async fn require_order(&self, id: OrderId) -> Result<Order> {
        self.get_order(id)
            .await?
            .ok_or_else(|| crate::StoreError::order_not_found(id))
    }
}

// Blanket implementation for all OrderStore implementations
impl<T: OrderStore + ?Sized> OrderStoreExt for T {}
