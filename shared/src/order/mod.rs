//! Order domain types
//!
//! - [`Order`] / [`OrderItem`]: persisted order header and line items
//! - Status machines for orders and kitchen items
//! - Request payloads accepted by the order API

pub mod types;

pub use types::*;
