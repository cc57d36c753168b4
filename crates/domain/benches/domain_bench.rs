use std::sync::Arc;

use common::{OrderStatus, ProductId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{OrderService, PlaceOrder, UpdateOrderStatus, UpdateShippingInfo};
use notify::{InMemoryMailer, NotificationDispatcher};
use order_store::{InMemoryOrderStore, NewOrderItem};
use rust_decimal_macros::dec;
use serde_json::json;

fn checkout(lines: i64) -> PlaceOrder {
    PlaceOrder {
        total: dec!(100),
        items: (1..=lines)
            .map(|product| NewOrderItem {
                product_id: ProductId::new(product),
                quantity: 1,
                price: dec!(10),
                selected_color: None,
                selected_size: None,
            })
            .collect(),
        ..Default::default()
    }
}

async fn service_with_products(lines: i64) -> OrderService<InMemoryOrderStore> {
    let store = InMemoryOrderStore::new();
    for product in 1..=lines {
        store
            .insert_product(ProductId::new(product), "Widget", 1_000_000)
            .await;
    }
    // Unconfigured mailer: notifications are skipped before any send
    OrderService::new(
        store,
        NotificationDispatcher::new(Arc::new(InMemoryMailer::unconfigured())),
    )
}

fn bench_place_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = rt.block_on(service_with_products(5));

    c.bench_function("domain/place_order_5_lines", |b| {
        b.iter(|| {
            rt.block_on(async {
                service.place_order(checkout(5)).await.unwrap();
            });
        });
    });
}

fn bench_complete_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = rt.block_on(service_with_products(10));

    c.bench_function("domain/place_and_complete_10_lines", |b| {
        b.iter(|| {
            rt.block_on(async {
                let order = service.place_order(checkout(10)).await.unwrap();
                service
                    .update_order_status(UpdateOrderStatus::new(order.id, OrderStatus::Completed))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_validate_shipping(c: &mut Criterion) {
    let cmd = UpdateShippingInfo {
        email: Some("ada@example.com".to_string()),
        order_id: Some(json!("42")),
        shipping_method: Some("DHL".to_string()),
        shipping_terms: Some("DAP".to_string()),
        shipment_date: Some("2025-01-05".to_string()),
        delivery_date: Some("2025-01-09T10:00:00Z".to_string()),
    };

    c.bench_function("domain/validate_shipping_info", |b| {
        b.iter(|| cmd.validate().unwrap());
    });
}

criterion_group!(
    benches,
    bench_place_order,
    bench_complete_order,
    bench_validate_shipping
);
criterion_main!(benches);
