//! Domain models for the blood bank inventory

mod alert;
mod batch;
mod usage;

pub use alert::*;
pub use batch::*;
pub use usage::*;
