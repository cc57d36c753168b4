//! Payment detail retention.

use serde_json::Value;

/// The only payment method whose details are kept.
pub const CREDIT_CARD: &str = "Credit Card";

/// Text to store as payment info for the given method.
///
/// Details are serialized to JSON only when the method is exactly
/// [`CREDIT_CARD`]; every other method, or a missing one, stores nothing.
pub fn retained_payment_info(
    payment_method: Option<&str>,
    payment_info: Option<&Value>,
) -> Result<Option<String>, serde_json::Error> {
    match (payment_method, payment_info) {
        (Some(CREDIT_CARD), Some(info)) if !info.is_null() => serde_json::to_string(info).map(Some),
        _ => Ok(None),
    }
}
