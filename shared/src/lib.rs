//! Shared ledger core for the Blood Bank Inventory platform
//!
//! This crate holds the domain types, validation, the inventory ledger and the
//! alert engine. The HTTP server and the browser (via WASM) both host it.

pub mod demo;
pub mod error;
pub mod ledger;
pub mod models;
pub mod types;
pub mod validation;

pub use error::*;
pub use ledger::InventoryLedger;
pub use models::*;
pub use types::*;
pub use validation::*;
