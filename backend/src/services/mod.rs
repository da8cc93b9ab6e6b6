//! Business logic services for the Branch Inventory Platform

pub mod bill;
pub mod document_effects;
pub mod stock_ledger;
pub mod store_order;
pub mod vendor_balance;
pub mod vendor_credit;

pub use bill::BillService;
pub use document_effects::{DocumentEffects, LedgerDirection};
pub use stock_ledger::{ItemResolutionStrategy, StockApplied, StockLedger};
pub use store_order::StoreOrderCoordinator;
pub use vendor_balance::VendorBalanceLedger;
pub use vendor_credit::VendorCreditService;
