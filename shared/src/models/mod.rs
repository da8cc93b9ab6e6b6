//! Domain models for the Branch Inventory Platform

mod bill;
mod item;
mod line_item;
mod order;
mod outcome;
mod purchase;
mod vendor;

pub use bill::*;
pub use item::*;
pub use line_item::*;
pub use order::*;
pub use outcome::*;
pub use purchase::*;
pub use vendor::*;
