//! HTTP handlers for the Blood Bank Inventory API

pub mod alerts;
pub mod health;
pub mod inventory;
pub mod metrics;
pub mod settings;

pub use alerts::*;
pub use health::*;
pub use inventory::*;
pub use metrics::*;
pub use settings::*;
