use async_trait::async_trait;
use common::OrderId;

use crate::retry::{RetryPolicy, retry_on_connection_error};
use crate::{ChangePlan, NewOrder, Order, Result, ShippingWrite, StatusWrite, store::OrderStore};

/// Decorator that routes every call of an inner store through the
/// connection-retry layer.
///
/// `ResilientStore` implements [`OrderStore`] itself, so callers receive it in
/// place of the raw store and never opt in per call. Transient connection
/// failures are retried with backoff and a reconnect in between; once the
/// budget is spent callers see [`crate::StoreError::Unavailable`] rather than
/// the driver error. A write whose commit was cut off is reported as
/// unavailable at once; it is not replayed.
#[derive(Clone)]
pub struct ResilientStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: OrderStore> ResilientStore<S> {
    /// Wraps `inner` with the default retry policy.
    pub fn new(inner: S) -> Self {
        Self::with_policy(inner, RetryPolicy::default())
    }

    pub fn with_policy(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Unwraps the decorator, returning the inner store.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[async_trait]
impl<S: OrderStore> OrderStore for ResilientStore<S> {
    async fn create_order(&self, order: NewOrder) -> Result<Order> {
        retry_on_connection_error(
            &self.policy,
            "create_order",
            || self.inner.create_order(order.clone()),
            || self.inner.reconnect(),
        )
        .await
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        retry_on_connection_error(
            &self.policy,
            "get_order",
            || self.inner.get_order(id),
            || self.inner.reconnect(),
        )
        .await
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        retry_on_connection_error(
            &self.policy,
            "list_orders",
            || self.inner.list_orders(),
            || self.inner.reconnect(),
        )
        .await
    }

    async fn update_status(
        &self,
        id: OrderId,
        write: StatusWrite,
        plan: ChangePlan<'_>,
    ) -> Result<Order> {
        retry_on_connection_error(
            &self.policy,
            "update_status",
            || self.inner.update_status(id, write.clone(), plan),
            || self.inner.reconnect(),
        )
        .await
    }

    async fn update_shipping(&self, id: OrderId, write: ShippingWrite) -> Result<Order> {
        retry_on_connection_error(
            &self.policy,
            "update_shipping",
            || self.inner.update_shipping(id, write.clone()),
            || self.inner.reconnect(),
        )
        .await
    }

    async fn delete_order(&self, id: OrderId) -> Result<()> {
        retry_on_connection_error(
            &self.policy,
            "delete_order",
            || self.inner.delete_order(id),
            || self.inner.reconnect(),
        )
        .await
    }

    async fn reconnect(&self) -> Result<()> {
        self.inner.reconnect().await
    }
}
