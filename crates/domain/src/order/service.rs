//! Order service coordinating persistence, lifecycle rules and notifications.

use common::OrderId;
use notify::{NotificationDispatcher, ShippingNotice, StatusNotice};
use order_store::{
    Order, OrderStore, ResilientStore, RetryPolicy, StatusWrite, StockAdjustment, StoreError,
};

use crate::error::DomainError;

use super::payment::retained_payment_info;
use super::stock::adjustments_for;
use super::{PlaceOrder, TransitionPolicy, UpdateOrderStatus, UpdateShippingInfo};

/// Service for managing orders.
///
/// Every store call goes through a [`ResilientStore`], so transient
/// connection failures are retried and reported uniformly. Notifications are
/// handed to the dispatcher after the write commits and never affect the
/// result of an operation.
pub struct OrderService<S: OrderStore> {
    store: ResilientStore<S>,
    notifier: NotificationDispatcher,
    policy: TransitionPolicy,
}

impl<S: OrderStore> OrderService<S> {
    /// Creates a new order service with the permissive transition policy.
    pub fn new(store: S, notifier: NotificationDispatcher) -> Self {
        Self {
            store: ResilientStore::new(store),
            notifier,
            policy: TransitionPolicy::default(),
        }
    }

    /// Replaces the transition policy.
    pub fn with_policy(mut self, policy: TransitionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces the connection-retry settings.
    pub fn with_retry_policy(self, retry: RetryPolicy) -> Self {
        let OrderService {
            store,
            notifier,
            policy,
        } = self;
        let inner = store.into_inner();
        Self {
            store: ResilientStore::with_policy(inner, retry),
            notifier,
            policy,
        }
    }

    /// Returns the resilient store the service writes through.
    pub fn store(&self) -> &ResilientStore<S> {
        &self.store
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Checks that the store answers, without retrying.
    pub async fn ping(&self) -> Result<(), DomainError> {
        Ok(self.store.reconnect().await?)
    }

    /// Changes the status of an order.
    ///
    /// Completion decrements the stock of every referenced product in the same
    /// transaction as the status write. Payment details are kept only for
    /// credit card payments. A notification goes out once the change is
    /// committed.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id, status = %cmd.status))]
    pub async fn update_order_status(&self, cmd: UpdateOrderStatus) -> Result<Order, DomainError> {
        let target = cmd.status;
        let policy = self.policy;

        let payment_info =
            retained_payment_info(cmd.payment_method.as_deref(), cmd.payment_info.as_ref())?;
        let write = StatusWrite {
            status: target,
            payment_method: cmd.payment_method,
            payment_info,
        };

        let plan = move |order: &Order| -> order_store::Result<Vec<StockAdjustment>> {
            if !policy.is_legal(order.status, target) {
                return Err(StoreError::InvalidTransition {
                    from: order.status,
                    to: target,
                });
            }
            Ok(adjustments_for(order, target))
        };

        let order = self
            .store
            .update_status(cmd.order_id, write, &plan)
            .await?;

        metrics::counter!("order_status_updates_total", "status" => target.as_str()).increment(1);
        let decremented = adjustments_for(&order, target).len();
        if decremented > 0 {
            metrics::counter!("order_stock_decrements_total").increment(decremented as u64);
        }
        tracing::info!(stock_adjustments = decremented, "order status updated");

        self.notifier.notify_status_change(StatusNotice {
            order_id: order.id,
            email: order.email().map(str::to_string),
            recipient_name: order.recipient_name().map(str::to_string),
            status: order.status,
        });

        Ok(order)
    }

    /// Records shipping method, terms and dates for an order and tells the
    /// customer.
    #[tracing::instrument(skip(self, cmd))]
    pub async fn update_shipping_info(
        &self,
        cmd: UpdateShippingInfo,
    ) -> Result<Order, DomainError> {
        let update = cmd.validate()?;
        let Some(order_id) = update.order.id() else {
            return Err(DomainError::order_not_found());
        };

        let write = update.write.clone();
        let order = self.store.update_shipping(order_id, update.write).await?;
        tracing::info!(%order_id, "shipping info updated");

        self.notifier.notify_shipping_update(ShippingNotice {
            order_id,
            email: update.email,
            shipping_method: write.shipping_method,
            shipping_terms: write.shipping_terms,
            shipment_date: write.shipment_date,
            delivery_date: write.delivery_date,
        });

        Ok(order)
    }

    /// Places a new order in `PENDING`.
    #[tracing::instrument(skip(self, cmd))]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<Order, DomainError> {
        let new = cmd.into_new_order()?;
        let order = self.store.create_order(new).await?;
        tracing::info!(order_id = %order.id, items = order.items.len(), "order placed");
        Ok(order)
    }

    /// Loads an order by ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order, DomainError> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or_else(DomainError::order_not_found)
    }

    /// Lists all orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, DomainError> {
        Ok(self.store.list_orders().await?)
    }

    /// Deletes an order and its items.
    #[tracing::instrument(skip(self))]
    pub async fn delete_order(&self, order_id: OrderId) -> Result<(), DomainError> {
        self.store.delete_order(order_id).await?;
        tracing::info!(%order_id, "order deleted");
        Ok(())
    }
}
