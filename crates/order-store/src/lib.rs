//! Persistence for the order aggregate.
//!
//! Provides the [`OrderStore`] trait with PostgreSQL and in-memory
//! implementations, and [`ResilientStore`], the decorator that retries
//! transient connection failures for every store call.

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod resilient;
pub mod retry;
pub mod store;

pub use error::{Result, StoreError, UNAVAILABLE_MESSAGE, is_connection_message};
pub use memory::InMemoryOrderStore;
pub use model::{
    Charges, MONEY_SCALE, NewOrder, NewOrderItem, Order, OrderItem, Product, ShippingAddress,
    ShippingDetails, ShippingWrite, StatusWrite, StockAdjustment, fits_money_scale,
};
pub use postgres::PostgresOrderStore;
pub use resilient::ResilientStore;
pub use retry::RetryPolicy;
pub use store::{ChangePlan, OrderStore, OrderStoreExt};
