//! Shared types and models for the Branch Inventory Platform
//!
//! Pure domain code with no I/O: document models, line-item math, warehouse
//! name resolution and input validation. The backend builds its stock and
//! document engines on top of this crate.

pub mod models;
pub mod types;
pub mod validation;
pub mod warehouse;

pub use models::*;
pub use types::*;
pub use validation::*;
pub use warehouse::{WarehouseNameResolver, CENTRAL_WAREHOUSE};
