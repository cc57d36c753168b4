//! Integration tests for the order lifecycle.
//!
//! These tests drive the service end to end over the in-memory store and
//! mailer: status changes with their stock and payment effects, shipping
//! updates, notification isolation and connection retries.

use std::sync::Arc;
use std::time::Duration;

use common::{OrderStatus, ProductId};
use domain::{
    DomainError, OrderService, PlaceOrder, TransitionPolicy, UpdateOrderStatus, UpdateShippingInfo,
};
use notify::{InMemoryMailer, NotificationDispatcher};
use order_store::{
    InMemoryOrderStore, NewOrderItem, Order, RetryPolicy, ShippingAddress, UNAVAILABLE_MESSAGE,
};
use rust_decimal_macros::dec;
use serde_json::json;

const WAIT: Duration = Duration::from_secs(2);

struct Harness {
    store: InMemoryOrderStore,
    mailer: InMemoryMailer,
    service: OrderService<InMemoryOrderStore>,
}

/// Helper to create a test order service
fn harness() -> Harness {
    let store = InMemoryOrderStore::new();
    let mailer = InMemoryMailer::new();
    let service = OrderService::new(
        store.clone(),
        NotificationDispatcher::new(Arc::new(mailer.clone())),
    )
    .with_retry_policy(RetryPolicy::with_base_delay(Duration::from_millis(1)));

    Harness {
        store,
        mailer,
        service,
    }
}

fn checkout(lines: &[(i64, i32)], payment_method: &str) -> PlaceOrder {
    PlaceOrder {
        total: dec!(100),
        delivery_charge: dec!(5),
        address: ShippingAddress {
            recipient_name: Some("Ada Lovelace".to_string()),
            email: Some("ada@example.com".to_string()),
            ..Default::default()
        },
        payment_method: Some(payment_method.to_string()),
        items: lines
            .iter()
            .map(|&(product, quantity)| NewOrderItem {
                product_id: ProductId::new(product),
                quantity,
                price: dec!(10),
                selected_color: None,
                selected_size: None,
            })
            .collect(),
        ..Default::default()
    }
}

fn shipping_for(order: &Order) -> UpdateShippingInfo {
    UpdateShippingInfo {
        email: Some("ada@example.com".to_string()),
        order_id: Some(json!(order.id.as_i64())),
        shipping_method: Some("DHL Express".to_string()),
        shipping_terms: Some("DAP".to_string()),
        shipment_date: Some("2025-01-05".to_string()),
        delivery_date: Some("2025-01-09".to_string()),
    }
}

mod status_changes {
    use super::*;

    #[tokio::test]
    async fn shipping_a_cash_order_leaves_stock_alone() {
        let h = harness();
        h.store.insert_product(ProductId::new(1), "Mug", 10).await;
        let order = h
            .service
            .place_order(checkout(&[(1, 2)], "Cash on Delivery"))
            .await
            .unwrap();

        let updated = h
            .service
            .update_order_status(UpdateOrderStatus::new(order.id, OrderStatus::Shipped))
            .await
            .unwrap();

        assert_eq!(updated.status, OrderStatus::Shipped);
        assert_eq!(updated.payment_info, None);
        assert_eq!(h.store.product_stock(ProductId::new(1)).await, Some(10));

        assert!(h.mailer.wait_for_attempts(1, WAIT).await);
        let sent = h.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ada@example.com");
        assert!(sent[0].html.contains("SHIPPED"));
        assert!(sent[0].html.contains("Ada Lovelace"));
    }

    #[tokio::test]
    async fn completion_decrements_every_line() {
        let h = harness();
        h.store.insert_product(ProductId::new(1), "Mug", 10).await;
        h.store.insert_product(ProductId::new(2), "Cap", 5).await;
        let order = h
            .service
            .place_order(checkout(&[(1, 2), (2, 5)], "Cash on Delivery"))
            .await
            .unwrap();

        let updated = h
            .service
            .update_order_status(UpdateOrderStatus::new(order.id, OrderStatus::Completed))
            .await
            .unwrap();

        assert_eq!(updated.status, OrderStatus::Completed);
        assert_eq!(h.store.product_stock(ProductId::new(1)).await, Some(8));
        assert_eq!(h.store.product_stock(ProductId::new(2)).await, Some(0));
    }

    #[tokio::test]
    async fn completion_may_drive_stock_negative() {
        let h = harness();
        h.store.insert_product(ProductId::new(1), "Mug", 1).await;
        let order = h
            .service
            .place_order(checkout(&[(1, 3)], "Cash on Delivery"))
            .await
            .unwrap();

        h.service
            .update_order_status(UpdateOrderStatus::new(order.id, OrderStatus::Completed))
            .await
            .unwrap();

        assert_eq!(h.store.product_stock(ProductId::new(1)).await, Some(-2));
    }

    #[tokio::test]
    async fn missing_product_aborts_the_whole_completion() {
        let h = harness();
        h.store.insert_product(ProductId::new(1), "Mug", 10).await;
        let order = h
            .service
            .place_order(checkout(&[(1, 2), (99, 1)], "Cash on Delivery"))
            .await
            .unwrap();

        let err = h
            .service
            .update_order_status(UpdateOrderStatus::new(order.id, OrderStatus::Completed))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::NotFound { entity: "Product" }));
        assert_eq!(h.store.product_stock(ProductId::new(1)).await, Some(10));
        let reloaded = h.service.get_order(order.id).await.unwrap();
        assert_eq!(reloaded.status, OrderStatus::Pending);
        assert_eq!(reloaded.updated_at, order.updated_at);
    }

    #[tokio::test]
    async fn deleted_product_lines_are_skipped() {
        let h = harness();
        h.store.insert_product(ProductId::new(1), "Mug", 10).await;
        h.store.insert_product(ProductId::new(2), "Cap", 5).await;
        let order = h
            .service
            .place_order(checkout(&[(1, 2), (2, 1)], "Cash on Delivery"))
            .await
            .unwrap();
        h.store.remove_product(ProductId::new(1)).await;

        h.service
            .update_order_status(UpdateOrderStatus::new(order.id, OrderStatus::Completed))
            .await
            .unwrap();

        assert_eq!(h.store.product_stock(ProductId::new(2)).await, Some(4));
    }

    #[tokio::test]
    async fn non_completion_transitions_never_touch_stock() {
        let h = harness();
        h.store.insert_product(ProductId::new(1), "Mug", 10).await;
        let order = h
            .service
            .place_order(checkout(&[(1, 4)], "Cash on Delivery"))
            .await
            .unwrap();

        for status in [
            OrderStatus::Paid,
            OrderStatus::Shipped,
            OrderStatus::Cancelled,
            OrderStatus::Pending,
        ] {
            h.service
                .update_order_status(UpdateOrderStatus::new(order.id, status))
                .await
                .unwrap();
            assert_eq!(h.store.product_stock(ProductId::new(1)).await, Some(10));
        }
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let h = harness();

        let err = h
            .service
            .update_order_status(UpdateOrderStatus::new(
                common::OrderId::new(404),
                OrderStatus::Paid,
            ))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Order not found");
        assert_eq!(h.mailer.attempts(), 0);
    }

    #[tokio::test]
    async fn strict_policy_blocks_illegal_edges() {
        let h = harness();
        let service = h.service.with_policy(TransitionPolicy::Strict);
        h.store.insert_product(ProductId::new(1), "Mug", 10).await;
        let order = service
            .place_order(checkout(&[(1, 1)], "Cash on Delivery"))
            .await
            .unwrap();

        for status in [OrderStatus::Paid, OrderStatus::Shipped, OrderStatus::Completed] {
            service
                .update_order_status(UpdateOrderStatus::new(order.id, status))
                .await
                .unwrap();
        }

        let err = service
            .update_order_status(UpdateOrderStatus::new(order.id, OrderStatus::Cancelled))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
        assert_eq!(h.store.product_stock(ProductId::new(1)).await, Some(9));
    }
}

mod payment_details {
    use super::*;

    async fn paid_with(method: &str) -> Option<String> {
        let h = harness();
        h.store.insert_product(ProductId::new(1), "Mug", 10).await;
        let order = h
            .service
            .place_order(checkout(&[(1, 1)], "Cash on Delivery"))
            .await
            .unwrap();

        h.service
            .update_order_status(
                UpdateOrderStatus::new(order.id, OrderStatus::Paid)
                    .with_payment(method, Some(json!({"last4": "4242", "brand": "visa"}))),
            )
            .await
            .unwrap()
            .payment_info
    }

    #[tokio::test]
    async fn credit_card_details_are_kept() {
        let stored = paid_with("Credit Card").await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&stored).unwrap();
        assert_eq!(parsed, json!({"last4": "4242", "brand": "visa"}));
    }

    #[tokio::test]
    async fn other_methods_drop_details() {
        assert_eq!(paid_with("Cash on Delivery").await, None);
        assert_eq!(paid_with("PayPal").await, None);
        assert_eq!(paid_with("credit card").await, None);
    }

    #[tokio::test]
    async fn later_update_without_method_clears_details() {
        let h = harness();
        h.store.insert_product(ProductId::new(1), "Mug", 10).await;
        let order = h
            .service
            .place_order(checkout(&[(1, 1)], "Cash on Delivery"))
            .await
            .unwrap();
        h.service
            .update_order_status(
                UpdateOrderStatus::new(order.id, OrderStatus::Paid)
                    .with_payment("Credit Card", Some(json!("tok_1"))),
            )
            .await
            .unwrap();

        let shipped = h
            .service
            .update_order_status(UpdateOrderStatus::new(order.id, OrderStatus::Shipped))
            .await
            .unwrap();

        assert_eq!(shipped.payment_method.as_deref(), Some("Credit Card"));
        assert_eq!(shipped.payment_info, None);
    }
}

mod shipping {
    use super::*;

    #[tokio::test]
    async fn shipping_info_is_persisted_and_announced() {
        let h = harness();
        h.store.insert_product(ProductId::new(1), "Mug", 10).await;
        let order = h
            .service
            .place_order(checkout(&[(1, 1)], "Cash on Delivery"))
            .await
            .unwrap();

        let updated = h.service.update_shipping_info(shipping_for(&order)).await.unwrap();

        assert_eq!(
            updated.shipping.shipping_method.as_deref(),
            Some("DHL Express")
        );
        assert_eq!(updated.shipping.shipping_terms.as_deref(), Some("DAP"));
        assert!(updated.shipping.shipment_date.is_some());
        assert!(updated.updated_at >= order.updated_at);

        assert!(h.mailer.wait_for_attempts(1, WAIT).await);
        let sent = h.mailer.sent();
        assert!(sent[0].html.contains("January 5, 2025"));
        assert!(sent[0].html.contains("January 9, 2025"));
    }

    #[tokio::test]
    async fn string_order_id_is_accepted() {
        let h = harness();
        h.store.insert_product(ProductId::new(1), "Mug", 10).await;
        let order = h
            .service
            .place_order(checkout(&[(1, 1)], "Cash on Delivery"))
            .await
            .unwrap();

        let cmd = UpdateShippingInfo {
            order_id: Some(json!(order.id.to_string())),
            ..shipping_for(&order)
        };
        assert!(h.service.update_shipping_info(cmd).await.is_ok());
    }

    #[tokio::test]
    async fn missing_field_is_rejected_without_changes() {
        let h = harness();
        h.store.insert_product(ProductId::new(1), "Mug", 10).await;
        let order = h
            .service
            .place_order(checkout(&[(1, 1)], "Cash on Delivery"))
            .await
            .unwrap();

        let cmd = UpdateShippingInfo {
            shipping_terms: None,
            ..shipping_for(&order)
        };
        let err = h.service.update_shipping_info(cmd).await.unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        let reloaded = h.service.get_order(order.id).await.unwrap();
        assert_eq!(reloaded, order);
        assert_eq!(h.mailer.attempts(), 0);
    }
}

mod notifications {
    use super::*;

    #[tokio::test]
    async fn failing_mail_transport_does_not_fail_updates() {
        let h = harness();
        h.mailer.set_fail_on_send(true);
        h.store.insert_product(ProductId::new(1), "Mug", 10).await;
        let order = h
            .service
            .place_order(checkout(&[(1, 1)], "Cash on Delivery"))
            .await
            .unwrap();

        let updated = h
            .service
            .update_order_status(UpdateOrderStatus::new(order.id, OrderStatus::Paid))
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Paid);

        let shipped = h.service.update_shipping_info(shipping_for(&order)).await;
        assert!(shipped.is_ok());

        assert!(h.mailer.wait_for_attempts(2, WAIT).await);
        assert!(h.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn missing_email_skips_notification() {
        let h = harness();
        h.store.insert_product(ProductId::new(1), "Mug", 10).await;
        let mut cmd = checkout(&[(1, 1)], "Cash on Delivery");
        cmd.address.email = None;
        let order = h.service.place_order(cmd).await.unwrap();

        h.service
            .update_order_status(UpdateOrderStatus::new(order.id, OrderStatus::Paid))
            .await
            .unwrap();

        assert!(!h.mailer.wait_for_attempts(1, Duration::from_millis(100)).await);
    }
}

mod resilience {
    use super::*;

    #[tokio::test]
    async fn two_connection_failures_then_success() {
        let h = harness();
        h.store.insert_product(ProductId::new(1), "Mug", 10).await;
        let order = h
            .service
            .place_order(checkout(&[(1, 2)], "Cash on Delivery"))
            .await
            .unwrap();
        h.store.fail_next(2, "Can't reach database server").await;

        let updated = h
            .service
            .update_order_status(UpdateOrderStatus::new(order.id, OrderStatus::Completed))
            .await
            .unwrap();

        assert_eq!(updated.status, OrderStatus::Completed);
        assert_eq!(h.store.product_stock(ProductId::new(1)).await, Some(8));
        assert_eq!(h.store.reconnect_count().await, 2);
    }

    #[tokio::test]
    async fn exhausted_retries_are_normalized() {
        let h = harness();
        h.store.fail_next(3, "connection refused").await;

        let err = h.service.list_orders().await.unwrap_err();

        assert!(matches!(err, DomainError::Unavailable(_)));
        assert_eq!(err.to_string(), UNAVAILABLE_MESSAGE);
        assert_eq!(h.store.call_count().await, 3);
    }

    #[tokio::test]
    async fn other_failures_are_not_retried() {
        let h = harness();
        h.store
            .fail_next(1, "null value in column \"status\" violates not-null constraint")
            .await;

        let err = h.service.list_orders().await.unwrap_err();

        assert!(matches!(err, DomainError::Store(_)));
        assert_eq!(h.store.call_count().await, 1);
        assert_eq!(h.store.reconnect_count().await, 0);
    }
}
