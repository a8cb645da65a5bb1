//! Request and response models for the HTTP API
//!
//! Re-exports models from the shared crate and adds API-specific shapes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::ledger::metrics::{DashboardSummary, ShortageReport, StorageUtilization};
use shared::models::{BatchFilter, ExpiryStatus};
use shared::types::BloodType;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub use shared::models::*;

/// Default window for daily usage reports
pub const DEFAULT_USAGE_DAYS: u32 = 7;

/// Longest window a report may ask for
pub const MAX_REPORT_DAYS: u32 = 366;

// ============================================================================
// Responses
// ============================================================================

/// A batch with its expiry state evaluated at request time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchView {
    #[serde(flatten)]
    pub batch: Batch,
    pub days_until_expiry: i64,
    pub expiry_status: ExpiryStatus,
}

impl BatchView {
    pub fn new(batch: &Batch, now: DateTime<Utc>) -> Self {
        Self {
            days_until_expiry: batch.days_until_expiry(now),
            expiry_status: batch.expiry_status(now),
            batch: batch.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiringBatch {
    #[serde(flatten)]
    pub batch: Batch,
    pub days_left: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub summary: DashboardSummary,
    pub storage: StorageUtilization,
    pub shortage: ShortageReport,
    pub threshold: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdResponse {
    pub threshold: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcknowledgeResponse {
    pub id: Uuid,
    /// False when the alert was unknown or already read
    pub acknowledged: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcknowledgeAllResponse {
    pub acknowledged: usize,
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ThresholdInput {
    pub threshold: i64,
}

/// Query string for `GET /batches`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchQuery {
    pub blood_type: Option<String>,
    pub expiry: Option<String>,
    pub search: Option<String>,
}

impl BatchQuery {
    pub fn into_filter(self) -> AppResult<BatchFilter> {
        let blood_type = match non_empty(self.blood_type) {
            // An unencoded `+` arrives as a space
            Some(raw) => Some(
                raw.replace(' ', "+")
                    .parse::<BloodType>()
                    .map_err(|e| AppError::validation("blood_type", e.to_string()))?,
            ),
            None => None,
        };
        let expiry_status = match non_empty(self.expiry) {
            Some(raw) => Some(
                raw.parse::<ExpiryStatus>()
                    .map_err(|e| AppError::validation("expiry", e))?,
            ),
            None => None,
        };

        Ok(BatchFilter {
            blood_type,
            expiry_status,
            search: non_empty(self.search),
        })
    }
}

/// Query string for `GET /alerts`. Parsed by hand so a malformed flag
/// comes back in the JSON error shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertQuery {
    pub unread: Option<String>,
}

impl AlertQuery {
    pub fn unread_only(&self) -> AppResult<bool> {
        match non_empty(self.unread.clone()) {
            None => Ok(false),
            Some(raw) => raw
                .trim()
                .parse::<bool>()
                .map_err(|_| AppError::validation("unread", "unread must be true or false")),
        }
    }
}

/// Query string carrying a day window
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DaysQuery {
    pub days: Option<String>,
}

impl DaysQuery {
    pub fn days_or(&self, default: u32) -> AppResult<u32> {
        let Some(raw) = non_empty(self.days.clone()) else {
            return Ok(default);
        };
        let out_of_range =
            || AppError::validation("days", format!("days must be between 1 and {}", MAX_REPORT_DAYS));
        let days = raw.trim().parse::<i64>().map_err(|_| out_of_range())?;
        if (1..=i64::from(MAX_REPORT_DAYS)).contains(&days) {
            Ok(days as u32)
        } else {
            Err(out_of_range())
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
