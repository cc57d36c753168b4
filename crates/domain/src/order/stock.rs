//! Inventory effects of a status change.

use common::OrderStatus;
use order_store::{Order, StockAdjustment};

/// Stock to take away when `order` moves to `target`.
///
/// Only a move to `Completed` consumes stock: one adjustment per item, by the
/// item quantity. Items whose product was deleted no longer reference it and
/// are skipped. There is no floor; stock may go negative.
pub fn adjustments_for(order: &Order, target: OrderStatus) -> Vec<StockAdjustment> {
    if target != OrderStatus::Completed {
        return Vec::new();
    }

    order
        .items
        .iter()
        .filter_map(|item| {
            item.product_id.map(|product_id| StockAdjustment {
                product_id,
                amount: item.quantity,
            })
        })
        .collect()
}
