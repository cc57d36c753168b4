//! Persisted shapes of the order aggregate.

use chrono::{DateTime, Utc};
use common::{OrderId, OrderStatus, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Monetary breakdown of an order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Charges {
    pub total: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
    pub delivery_charge: Decimal,
    pub extra_delivery_charge: Decimal,
    pub net_total: Decimal,
}

impl Charges {
    /// Builds a breakdown whose `net_total` is derived from the other fields.
    pub fn new(
        total: Decimal,
        discount: Decimal,
        tax: Decimal,
        delivery_charge: Decimal,
        extra_delivery_charge: Decimal,
    ) -> Self {
        let mut charges = Self {
            total,
            discount,
            tax,
            delivery_charge,
            extra_delivery_charge,
            net_total: Decimal::ZERO,
        };
        charges.net_total = charges.expected_net_total();
        charges
    }

    /// `total - discount + tax + delivery_charge + extra_delivery_charge`.
    pub fn expected_net_total(&self) -> Decimal {
        self.total - self.discount + self.tax + self.delivery_charge + self.extra_delivery_charge
    }

    /// Returns true when the stored net total matches the breakdown.
    pub fn is_balanced(&self) -> bool {
        self.net_total == self.expected_net_total()
    }

    /// Returns the name of the first negative field, if any.
    pub fn first_negative(&self) -> Option<&'static str> {
        [
            ("total", self.total),
            ("discount", self.discount),
            ("tax", self.tax),
            ("deliveryCharge", self.delivery_charge),
            ("extraDeliveryCharge", self.extra_delivery_charge),
            ("netTotal", self.net_total),
        ]
        .into_iter()
        .find(|(_, amount)| *amount < Decimal::ZERO)
        .map(|(name, _)| name)
    }

    /// Returns the name of the first field with more than [`MONEY_SCALE`]
    /// decimal places, if any.
    pub fn first_sub_cent(&self) -> Option<&'static str> {
        [
            ("total", self.total),
            ("discount", self.discount),
            ("tax", self.tax),
            ("deliveryCharge", self.delivery_charge),
            ("extraDeliveryCharge", self.extra_delivery_charge),
        ]
        .into_iter()
        .find(|(_, amount)| !fits_money_scale(*amount))
        .map(|(name, _)| name)
    }
}

/// Decimal places kept by the money columns.
pub const MONEY_SCALE: u32 = 2;

/// Returns true when `amount` is stored without rounding.
///
/// Trailing zeros do not count, so `10.500` fits.
pub fn fits_money_scale(amount: Decimal) -> bool {
    amount.normalize().scale() <= MONEY_SCALE
}

/// Where the order ships to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub recipient_name: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Carrier details filled in after the order is placed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingDetails {
    pub shipping_method: Option<String>,
    pub shipping_terms: Option<String>,
    pub shipment_date: Option<DateTime<Utc>>,
    pub delivery_date: Option<DateTime<Utc>>,
}

/// One product line of an order.
///
/// `product_id` is a weak reference: the product may be deleted later
/// without invalidating the historical line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: i64,
    pub product_id: Option<ProductId>,
    pub quantity: i32,
    /// Unit price at the time of ordering.
    pub price: Decimal,
    pub selected_color: Option<String>,
    pub selected_size: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order with its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    #[serde(flatten)]
    pub charges: Charges,
    #[serde(flatten)]
    pub address: ShippingAddress,
    pub payment_method: Option<String>,
    pub payment_info: Option<String>,
    #[serde(flatten)]
    pub shipping: ShippingDetails,
    pub coupon_code: Option<String>,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Contact email from the shipping address, if any.
    pub fn email(&self) -> Option<&str> {
        self.address.email.as_deref()
    }

    /// Recipient name from the shipping address, if any.
    pub fn recipient_name(&self) -> Option<&str> {
        self.address.recipient_name.as_deref()
    }
}

/// A line to create together with a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: i32,
    pub price: Decimal,
    #[serde(default)]
    pub selected_color: Option<String>,
    #[serde(default)]
    pub selected_size: Option<String>,
}

/// Everything needed to insert an order at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub charges: Charges,
    pub address: ShippingAddress,
    pub payment_method: Option<String>,
    pub payment_info: Option<String>,
    pub coupon_code: Option<String>,
    pub items: Vec<NewOrderItem>,
}

/// Catalog product, as far as this service is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub stock: i32,
}

/// Stock to take away from one product inside a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockAdjustment {
    pub product_id: ProductId,
    pub amount: i32,
}

/// Fields written by a status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusWrite {
    pub status: OrderStatus,
    /// `None` leaves the stored payment method untouched.
    pub payment_method: Option<String>,
    /// Always written; `None` clears the column.
    pub payment_info: Option<String>,
}

/// Fields written by a shipping-info update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingWrite {
    pub shipping_method: String,
    pub shipping_terms: String,
    pub shipment_date: DateTime<Utc>,
    pub delivery_date: DateTime<Utc>,
}
