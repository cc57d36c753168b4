use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, OrderStatus, ProductId};
use tokio::sync::RwLock;

use crate::{
    ChangePlan, NewOrder, Order, OrderItem, Product, Result, ShippingDetails, ShippingWrite,
    StatusWrite, StoreError, store::OrderStore,
};

#[derive(Default)]
struct MemoryState {
    orders: BTreeMap<OrderId, Order>,
    products: HashMap<ProductId, Product>,
    next_order_id: i64,
    next_item_id: i64,
    /// Messages of failures to raise on upcoming calls, oldest first.
    injected_failures: VecDeque<String>,
    /// Messages of failures to raise after the next writes have been applied.
    lost_commits: VecDeque<String>,
    calls: u32,
    reconnects: u32,
}

impl MemoryState {
    /// Counts the call and pops an injected failure, if one is queued.
    fn begin_call(&mut self) -> Result<()> {
        self.calls += 1;
        match self.injected_failures.pop_front() {
            Some(message) => Err(StoreError::Backend(message)),
            None => Ok(()),
        }
    }

    /// Pops a queued commit failure once a write has been applied.
    fn finish_write(&mut self) -> Result<()> {
        match self.lost_commits.pop_front() {
            Some(message) => Err(StoreError::commit_failed(StoreError::Backend(message))),
            None => Ok(()),
        }
    }
}

/// In-memory order store implementation for testing and local runs.
///
/// This implementation keeps orders and products in memory and provides
/// the same interface as the PostgreSQL implementation, including
/// all-or-nothing status changes. Failures can be injected to exercise the
/// retry layer.
///
/// Product references are not checked when an order is created; a dangling
/// reference only surfaces when completion tries to decrement its stock.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a catalog product.
    pub async fn insert_product(&self, id: ProductId, name: impl Into<String>, stock: i32) {
        let product = Product {
            id,
            name: name.into(),
            stock,
        };
        self.state.write().await.products.insert(id, product);
    }

    /// Removes a catalog product, clearing the references held by order items.
    pub async fn remove_product(&self, id: ProductId) {
        let mut state = self.state.write().await;
        state.products.remove(&id);
        for order in state.orders.values_mut() {
            for item in &mut order.items {
                if item.product_id == Some(id) {
                    item.product_id = None;
                }
            }
        }
    }

    /// Returns the current stock of a product.
    pub async fn product_stock(&self, id: ProductId) -> Option<i32> {
        self.state.read().await.products.get(&id).map(|p| p.stock)
    }

    /// Stores an order verbatim, bypassing placement.
    ///
    /// Lets tests seed orders with arbitrary ids, statuses or item references,
    /// including references to products that do not exist.
    pub async fn seed_order(&self, order: Order) {
        let mut state = self.state.write().await;
        state.next_order_id = state.next_order_id.max(order.id.as_i64());
        let max_item = order.items.iter().map(|i| i.id).max().unwrap_or(0);
        state.next_item_id = state.next_item_id.max(max_item);
        state.orders.insert(order.id, order);
    }

    /// Makes each of the next `times` store calls fail with `message`.
    pub async fn fail_next(&self, times: usize, message: impl Into<String>) {
        let message = message.into();
        let mut state = self.state.write().await;
        state
            .injected_failures
            .extend(std::iter::repeat_n(message, times));
    }

    /// Makes the next write apply its change and then fail with `message`,
    /// as if the commit acknowledgement was lost.
    pub async fn lose_next_commit(&self, message: impl Into<String>) {
        self.state.write().await.lost_commits.push_back(message.into());
    }

    /// Total number of store calls made, including failed ones.
    pub async fn call_count(&self) -> u32 {
        self.state.read().await.calls
    }

    /// Number of times `reconnect` was invoked.
    pub async fn reconnect_count(&self) -> u32 {
        self.state.read().await.reconnects
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create_order(&self, new: NewOrder) -> Result<Order> {
        let mut state = self.state.write().await;
        state.begin_call()?;

        let now = Utc::now();
        state.next_order_id += 1;
        let id = OrderId::new(state.next_order_id);

        let mut items = Vec::with_capacity(new.items.len());
        for line in new.items {
            state.next_item_id += 1;
            items.push(OrderItem {
                id: state.next_item_id,
                product_id: Some(line.product_id),
                quantity: line.quantity,
                price: line.price,
                selected_color: line.selected_color,
                selected_size: line.selected_size,
                created_at: now,
                updated_at: now,
            });
        }

        let order = Order {
            id,
            status: OrderStatus::Pending,
            charges: new.charges,
            address: new.address,
            payment_method: new.payment_method,
            payment_info: new.payment_info,
            shipping: ShippingDetails::default(),
            coupon_code: new.coupon_code,
            items,
            created_at: now,
            updated_at: now,
        };
        state.orders.insert(id, order.clone());
        state.finish_write()?;
        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let mut state = self.state.write().await;
        state.begin_call()?;
        Ok(state.orders.get(&id).cloned())
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let mut state = self.state.write().await;
        state.begin_call()?;
        let mut orders: Vec<Order> = state.orders.values().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn update_status(
        &self,
        id: OrderId,
        write: StatusWrite,
        plan: ChangePlan<'_>,
    ) -> Result<Order> {
        let mut state = self.state.write().await;
        state.begin_call()?;

        let current = state
            .orders
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::order_not_found(id))?;

        // Stage every change before touching shared state.
        let adjustments = plan(&current)?;
        let mut staged: HashMap<ProductId, i32> = HashMap::new();
        for adjustment in &adjustments {
            let stock = match staged.get(&adjustment.product_id) {
                Some(stock) => *stock,
                None => state
                    .products
                    .get(&adjustment.product_id)
                    .map(|p| p.stock)
                    .ok_or_else(|| StoreError::product_not_found(adjustment.product_id))?,
            };
            staged.insert(adjustment.product_id, stock - adjustment.amount);
        }

        for (product_id, stock) in staged {
            if let Some(product) = state.products.get_mut(&product_id) {
                product.stock = stock;
            }
        }

        let mut order = current;
        order.status = write.status;
        if let Some(method) = write.payment_method {
            order.payment_method = Some(method);
        }
        order.payment_info = write.payment_info;
        order.updated_at = Utc::now();
        state.orders.insert(id, order.clone());
        state.finish_write()?;
        Ok(order)
    }

    async fn update_shipping(&self, id: OrderId, write: ShippingWrite) -> Result<Order> {
        let mut state = self.state.write().await;
        state.begin_call()?;

        let order = state
            .orders
            .get_mut(&id)
            .ok_or_else(|| StoreError::order_not_found(id))?;
        order.shipping = ShippingDetails {
            shipping_method: Some(write.shipping_method),
            shipping_terms: Some(write.shipping_terms),
            shipment_date: Some(write.shipment_date),
            delivery_date: Some(write.delivery_date),
        };
        order.updated_at = Utc::now();
        let order = order.clone();
        state.finish_write()?;
        Ok(order)
    }

    async fn delete_order(&self, id: OrderId) -> Result<()> {
        let mut state = self.state.write().await;
        state.begin_call()?;
        state
            .orders
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::order_not_found(id))
    }

    async fn reconnect(&self) -> Result<()> {
        self.state.write().await.reconnects += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Charges, NewOrderItem, ShippingAddress, StockAdjustment};
    use rust_decimal_macros::dec;

    fn new_order(items: Vec<(i64, i32)>) -> NewOrder {
        NewOrder {
            charges: Charges::new(dec!(30), dec!(0), dec!(0), dec!(0), dec!(0)),
            address: ShippingAddress {
                email: Some("buyer@example.com".to_string()),
                ..Default::default()
            },
            payment_method: Some("Cash on Delivery".to_string()),
            payment_info: None,
            coupon_code: None,
            items: items
                .into_iter()
                .map(|(product, quantity)| NewOrderItem {
                    product_id: ProductId::new(product),
                    quantity,
                    price: dec!(5),
                    selected_color: None,
                    selected_size: None,
                })
                .collect(),
        }
    }

    fn write(status: OrderStatus) -> StatusWrite {
        StatusWrite {
            status,
            payment_method: None,
            payment_info: None,
        }
    }

    fn decrement_all(order: &Order) -> Result<Vec<StockAdjustment>> {
        Ok(order
            .items
            .iter()
            .filter_map(|item| {
                item.product_id.map(|product_id| StockAdjustment {
                    product_id,
                    amount: item.quantity,
                })
            })
            .collect())
    }

    fn no_stock(_: &Order) -> Result<Vec<StockAdjustment>> {
        Ok(vec![])
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids_and_pending_status() {
        let store = InMemoryOrderStore::new();
        let first = store.create_order(new_order(vec![(1, 1)])).await.unwrap();
        let second = store.create_order(new_order(vec![(1, 2)])).await.unwrap();

        assert_eq!(first.id, OrderId::new(1));
        assert_eq!(second.id, OrderId::new(2));
        assert_eq!(first.status, OrderStatus::Pending);
        assert_eq!(first.items[0].product_id, Some(ProductId::new(1)));
        assert_eq!(store.order_count().await, 2);
    }

    #[tokio::test]
    async fn update_status_applies_adjustments_with_status() {
        let store = InMemoryOrderStore::new();
        store.insert_product(ProductId::new(1), "Mug", 10).await;
        store.insert_product(ProductId::new(2), "Cap", 5).await;
        let order = store
            .create_order(new_order(vec![(1, 2), (2, 5)]))
            .await
            .unwrap();

        let updated = store
            .update_status(order.id, write(OrderStatus::Completed), &decrement_all)
            .await
            .unwrap();

        assert_eq!(updated.status, OrderStatus::Completed);
        assert!(updated.updated_at >= order.updated_at);
        assert_eq!(store.product_stock(ProductId::new(1)).await, Some(8));
        assert_eq!(store.product_stock(ProductId::new(2)).await, Some(0));
    }

    #[tokio::test]
    async fn repeated_product_lines_accumulate() {
        let store = InMemoryOrderStore::new();
        store.insert_product(ProductId::new(1), "Mug", 3).await;
        let order = store
            .create_order(new_order(vec![(1, 2), (1, 2)]))
            .await
            .unwrap();

        store
            .update_status(order.id, write(OrderStatus::Completed), &decrement_all)
            .await
            .unwrap();

        assert_eq!(store.product_stock(ProductId::new(1)).await, Some(-1));
    }

    #[tokio::test]
    async fn missing_product_rolls_back_everything() {
        let store = InMemoryOrderStore::new();
        store.insert_product(ProductId::new(1), "Mug", 10).await;
        let order = store
            .create_order(new_order(vec![(1, 2), (99, 1)]))
            .await
            .unwrap();

        let err = store
            .update_status(order.id, write(OrderStatus::Completed), &decrement_all)
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::NotFound { entity: "Product", id: 99 }));
        assert_eq!(store.product_stock(ProductId::new(1)).await, Some(10));
        let reloaded = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn absent_payment_method_keeps_stored_value() {
        let store = InMemoryOrderStore::new();
        let order = store.create_order(new_order(vec![(1, 1)])).await.unwrap();

        let updated = store
            .update_status(order.id, write(OrderStatus::Paid), &no_stock)
            .await
            .unwrap();

        assert_eq!(updated.payment_method.as_deref(), Some("Cash on Delivery"));
        assert_eq!(updated.payment_info, None);
    }

    #[tokio::test]
    async fn planner_rejection_leaves_order_untouched() {
        let store = InMemoryOrderStore::new();
        let order = store.create_order(new_order(vec![(1, 1)])).await.unwrap();

        let reject = |current: &Order| -> Result<Vec<StockAdjustment>> {
            Err(StoreError::InvalidTransition {
                from: current.status,
                to: OrderStatus::Completed,
            })
        };
        let err = store
            .update_status(order.id, write(OrderStatus::Completed), &reject)
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::InvalidTransition { .. }));
        let reloaded = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(reloaded, order);
    }

    #[tokio::test]
    async fn update_unknown_order_is_not_found() {
        let store = InMemoryOrderStore::new();
        let err = store
            .update_status(OrderId::new(404), write(OrderStatus::Paid), &no_stock)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "Order", id: 404 }));
    }

    #[tokio::test]
    async fn removing_a_product_clears_item_references() {
        let store = InMemoryOrderStore::new();
        store.insert_product(ProductId::new(1), "Mug", 10).await;
        let order = store.create_order(new_order(vec![(1, 1)])).await.unwrap();

        store.remove_product(ProductId::new(1)).await;

        let reloaded = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(reloaded.items[0].product_id, None);
        assert_eq!(reloaded.items[0].quantity, 1);
    }

    #[tokio::test]
    async fn delete_removes_order() {
        let store = InMemoryOrderStore::new();
        let order = store.create_order(new_order(vec![(1, 1)])).await.unwrap();

        store.delete_order(order.id).await.unwrap();

        assert!(store.get_order(order.id).await.unwrap().is_none());
        assert!(matches!(
            store.delete_order(order.id).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn injected_failures_are_consumed_in_order() {
        let store = InMemoryOrderStore::new();
        store.fail_next(2, "connection refused").await;

        assert!(store.list_orders().await.is_err());
        assert!(store.list_orders().await.is_err());
        assert!(store.list_orders().await.is_ok());
        assert_eq!(store.call_count().await, 3);
    }
}
