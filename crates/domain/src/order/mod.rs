//! Order lifecycle: commands, policies and the service applying them.

mod commands;
pub mod payment;
mod service;
pub mod stock;
mod transition;

pub use commands::{
    OrderRef, PlaceOrder, ShippingUpdate, UpdateOrderStatus, UpdateShippingInfo, parse_date,
};
pub use payment::CREDIT_CARD;
pub use service::OrderService;
pub use transition::TransitionPolicy;
