//! HTTP handlers for the Branch Inventory Platform

pub mod bills;
pub mod health;
pub mod items;
pub mod store_orders;
pub mod transfer_orders;
pub mod vendor_credits;
pub mod warehouses;

pub use bills::*;
pub use health::*;
pub use items::*;
pub use store_orders::*;
pub use transfer_orders::*;
pub use vendor_credits::*;
pub use warehouses::*;
