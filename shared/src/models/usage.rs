//! Usage (consumption) models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::types::BloodType;

/// One consumption transaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UsageEvent {
    pub id: Uuid,
    pub blood_type: BloodType,
    pub units_used: u32,
    pub reason: UsageReason,
    pub date: NaiveDate,
}

/// Why units were issued
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum UsageReason {
    Emergency,
    Surgery,
    Other,
}

impl UsageReason {
    pub const ALL: [UsageReason; 3] = [
        UsageReason::Emergency,
        UsageReason::Surgery,
        UsageReason::Other,
    ];
}

impl std::fmt::Display for UsageReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UsageReason::Emergency => write!(f, "Emergency"),
            UsageReason::Surgery => write!(f, "Surgery"),
            UsageReason::Other => write!(f, "Other"),
        }
    }
}

/// Input for issuing units of one blood type
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConsumeInput {
    pub blood_type: BloodType,
    #[validate(range(min = 1, message = "Units requested must be a positive number"))]
    pub units: i64,
    pub reason: UsageReason,
    /// ISO date, `YYYY-MM-DD`; defaults to today
    #[serde(default)]
    pub date: Option<String>,
}

/// Units drawn from a single batch by one consumption
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchDraw {
    pub batch_id: Uuid,
    pub units: u32,
}

/// Result of a successful consumption
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConsumptionReceipt {
    pub event: UsageEvent,
    /// Draws in the order they were taken
    pub draws: Vec<BatchDraw>,
}
