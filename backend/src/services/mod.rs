//! Business logic services for the Blood Bank Inventory server

pub mod inventory;
pub mod persistence;

pub use inventory::{InventoryService, LedgerStatus};
pub use persistence::{spawn_writer, JsonFileStore};
