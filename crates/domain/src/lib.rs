//! Domain layer for order fulfillment.
//!
//! This crate provides the rules applied when an order changes:
//! - Status transitions validated by a swappable [`TransitionPolicy`]
//! - Stock decrements on completion, inside the same transaction as the
//!   status write
//! - Payment details kept only for credit card payments
//! - Shipping info validation
//! - Best-effort customer notifications once a change is committed

pub mod error;
pub mod order;

pub use error::DomainError;
pub use order::{
    CREDIT_CARD, OrderRef, OrderService, PlaceOrder, ShippingUpdate, TransitionPolicy,
    UpdateOrderStatus, UpdateShippingInfo, parse_date,
};
