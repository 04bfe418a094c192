//! Shared types for the restaurant POS core
//!
//! Error types, order/menu/inventory models and realtime event payloads
//! used by pos-server and its clients.

pub mod error;
pub mod message;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use message::{HubEvent, HubEventType};
