//! Email subjects and bodies.

use chrono::{DateTime, Utc};
use common::{OrderId, OrderStatus};

/// Formats a timestamp as a long human-readable date, e.g. `January 5, 2025`.
pub fn format_long_date(date: &DateTime<Utc>) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Escapes text for inclusion in HTML.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Subject and body announcing a new order status.
pub fn status_changed(order_id: OrderId, recipient_name: &str, status: OrderStatus) -> (String, String) {
    let subject = format!("Order #{order_id} status update");
    let html = format!(
        "<p>Dear {name},</p>\
         <p>The status of your order <strong>#{order_id}</strong> is now <strong>{status}</strong>.</p>\
         <p>Thank you for shopping with us.</p>",
        name = escape_html(recipient_name),
    );
    (subject, html)
}

/// Subject and body announcing shipment details.
pub fn shipping_updated(
    order_id: OrderId,
    shipping_method: &str,
    shipping_terms: &str,
    shipment_date: &DateTime<Utc>,
    delivery_date: &DateTime<Utc>,
) -> (String, String) {
    let subject = format!("Your order #{order_id} is on its way");
    let html = format!(
        "<p>Good news! Your order <strong>#{order_id}</strong> has been scheduled for shipment.</p>\
         <ul>\
         <li>Shipping method: {method}</li>\
         <li>Shipping terms: {terms}</li>\
         <li>Shipment date: {shipped}</li>\
         <li>Estimated delivery: {delivered}</li>\
         </ul>\
         <p>Thank you for shopping with us.</p>",
        method = escape_html(shipping_method),
        terms = escape_html(shipping_terms),
        shipped = format_long_date(shipment_date),
        delivered = format_long_date(delivery_date),
    );
    (subject, html)
}
