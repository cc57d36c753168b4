//! Order commands.

use chrono::{DateTime, NaiveDate, Utc};
use common::{OrderId, OrderStatus};
use order_store::{
    Charges, MONEY_SCALE, NewOrder, NewOrderItem, ShippingAddress, ShippingWrite,
    fits_money_scale,
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use serde_json::Value;

use crate::error::DomainError;

use super::payment::retained_payment_info;

/// Command to change the status of an order.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOrderStatus {
    /// The order to update.
    pub order_id: OrderId,

    /// The status to assign.
    pub status: OrderStatus,

    /// New payment method; `None` keeps the stored one.
    pub payment_method: Option<String>,

    /// Payment details, kept only for credit card payments.
    pub payment_info: Option<Value>,
}

impl UpdateOrderStatus {
    /// Creates a status change without payment details.
    pub fn new(order_id: OrderId, status: OrderStatus) -> Self {
        Self {
            order_id,
            status,
            payment_method: None,
            payment_info: None,
        }
    }

    /// Sets the payment method and details sent along with the change.
    pub fn with_payment(mut self, method: impl Into<String>, info: Option<Value>) -> Self {
        self.payment_method = Some(method.into());
        self.payment_info = info;
        self
    }
}

/// How a request refers to an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderRef {
    /// A well-formed order id.
    Id(OrderId),

    /// A value that is not an order id and so matches no order.
    Unresolved(String),
}

impl OrderRef {
    /// Coerces a loosely typed JSON value into an order reference.
    ///
    /// Whole numbers written with a zero fraction, such as `5.0` or `"5.0"`,
    /// count as ids. Returns `None` when the value is absent or blank.
    pub fn from_json(value: &Value) -> Option<Self> {
        let resolved = match value {
            Value::Null => return None,
            Value::String(s) if s.trim().is_empty() => return None,
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().and_then(whole_f64))
                .map(OrderId::new),
            Value::String(s) => s.parse::<OrderId>().ok().or_else(|| {
                s.trim()
                    .parse::<Decimal>()
                    .ok()
                    .filter(|d| d.fract().is_zero())
                    .and_then(|d| d.to_i64())
                    .map(OrderId::new)
            }),
            _ => None,
        };

        Some(match resolved {
            Some(id) => OrderRef::Id(id),
            None => match value {
                Value::String(s) => OrderRef::Unresolved(s.clone()),
                other => OrderRef::Unresolved(other.to_string()),
            },
        })
    }

    pub fn id(&self) -> Option<OrderId> {
        match self {
            OrderRef::Id(id) => Some(*id),
            OrderRef::Unresolved(_) => None,
        }
    }
}

/// Converts a float without fractional part into an `i64`.
fn whole_f64(value: f64) -> Option<i64> {
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (value.fract() == 0.0 && in_range).then_some(value as i64)
}

/// Command to record shipping details, as received from a client.
///
/// Every field is required. Use [`UpdateShippingInfo::validate`] to check the
/// request and turn it into typed values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShippingInfo {
    pub email: Option<String>,
    /// Order id as a JSON number or string.
    pub order_id: Option<Value>,
    pub shipping_method: Option<String>,
    pub shipping_terms: Option<String>,
    pub shipment_date: Option<String>,
    pub delivery_date: Option<String>,
}

/// A validated shipping update.
#[derive(Debug, Clone, PartialEq)]
pub struct ShippingUpdate {
    pub order: OrderRef,
    pub email: String,
    pub write: ShippingWrite,
}

impl UpdateShippingInfo {
    /// Checks that every field is present and well formed.
    pub fn validate(&self) -> Result<ShippingUpdate, DomainError> {
        let order = self.order_id.as_ref().and_then(OrderRef::from_json);

        let mut missing = Vec::new();
        if order.is_none() {
            missing.push("orderId");
        }
        for (name, value) in [
            ("email", &self.email),
            ("shippingMethod", &self.shipping_method),
            ("shippingTerms", &self.shipping_terms),
            ("shipmentDate", &self.shipment_date),
            ("deliveryDate", &self.delivery_date),
        ] {
            if present(value).is_none() {
                missing.push(name);
            }
        }

        let (
            Some(order),
            Some(email),
            Some(method),
            Some(terms),
            Some(shipment_date),
            Some(delivery_date),
        ) = (
            order,
            present(&self.email),
            present(&self.shipping_method),
            present(&self.shipping_terms),
            present(&self.shipment_date),
            present(&self.delivery_date),
        )
        else {
            return Err(DomainError::validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        };

        Ok(ShippingUpdate {
            order,
            email: email.to_string(),
            write: ShippingWrite {
                shipping_method: method.to_string(),
                shipping_terms: terms.to_string(),
                shipment_date: parse_date("shipmentDate", shipment_date)?,
                delivery_date: parse_date("deliveryDate", delivery_date)?,
            },
        })
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Parses an RFC 3339 timestamp or a plain `YYYY-MM-DD` date (midnight UTC).
pub fn parse_date(field: &str, value: &str) -> Result<DateTime<Utc>, DomainError> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| DomainError::validation(format!("Invalid date for {field}: {value}")))
}

/// Command to place an order at checkout.
///
/// The net total is derived from the breakdown, never taken from the client.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    pub total: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub tax: Decimal,
    #[serde(default)]
    pub delivery_charge: Decimal,
    #[serde(default)]
    pub extra_delivery_charge: Decimal,
    #[serde(flatten)]
    pub address: ShippingAddress,
    pub payment_method: Option<String>,
    pub payment_info: Option<Value>,
    pub coupon_code: Option<String>,
    pub items: Vec<NewOrderItem>,
}

impl PlaceOrder {
    /// Validates the checkout data and builds the order to insert.
    pub fn into_new_order(self) -> Result<NewOrder, DomainError> {
        if self.items.is_empty() {
            return Err(DomainError::validation("An order needs at least one item"));
        }
        if let Some(item) = self.items.iter().find(|item| item.quantity < 1) {
            return Err(DomainError::validation(format!(
                "Quantity for product {} must be at least 1",
                item.product_id
            )));
        }
        if let Some(item) = self.items.iter().find(|item| item.price < Decimal::ZERO) {
            return Err(DomainError::validation(format!(
                "Price for product {} must not be negative",
                item.product_id
            )));
        }
        if let Some(item) = self.items.iter().find(|item| !fits_money_scale(item.price)) {
            return Err(DomainError::validation(format!(
                "Price for product {} has more than {MONEY_SCALE} decimal places",
                item.product_id
            )));
        }

        let charges = Charges::new(
            self.total,
            self.discount,
            self.tax,
            self.delivery_charge,
            self.extra_delivery_charge,
        );
        if let Some(field) = charges.first_negative() {
            return Err(DomainError::validation(format!("{field} must not be negative")));
        }
        if let Some(field) = charges.first_sub_cent() {
            return Err(DomainError::validation(format!(
                "{field} has more than {MONEY_SCALE} decimal places"
            )));
        }

        let payment_info =
            retained_payment_info(self.payment_method.as_deref(), self.payment_info.as_ref())?;

        Ok(NewOrder {
            charges,
            address: self.address,
            payment_method: self.payment_method,
            payment_info,
            coupon_code: self.coupon_code,
            items: self.items,
        })
    }
}
