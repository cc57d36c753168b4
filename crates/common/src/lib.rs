//! Shared types used across the order lifecycle crates.

mod status;
mod types;

pub use status::{OrderStatus, ParseStatusError};
pub use types::{OrderId, ProductId};
