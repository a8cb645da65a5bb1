//! Blood stock batch models

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::types::BloodType;

/// Shelf life of refrigerated red blood cells
pub const SHELF_LIFE_DAYS: i64 = 42;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// One recorded collection of same-type units sharing an expiry date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Batch {
    pub id: Uuid,
    pub donor_name: String,
    pub donor_phone: String,
    #[serde(default)]
    pub donor_email: Option<String>,
    pub blood_type: BloodType,
    pub units_collected: u32,
    pub units_remaining: u32,
    pub collection_date: NaiveDate,
    pub expiry_date: NaiveDate,
}

impl Batch {
    /// Expiry date for units collected on `collection_date`
    pub fn expiry_for(collection_date: NaiveDate) -> NaiveDate {
        collection_date + Duration::days(SHELF_LIFE_DAYS)
    }

    /// Whole days until expiry, rounded up. Zero or negative means expired.
    pub fn days_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        days_until(self.expiry_date, now)
    }

    pub fn expiry_status(&self, now: DateTime<Utc>) -> ExpiryStatus {
        ExpiryStatus::from_days_left(self.days_until_expiry(now))
    }

    pub fn is_depleted(&self) -> bool {
        self.units_remaining == 0
    }

    pub fn units_used(&self) -> u32 {
        self.units_collected - self.units_remaining
    }

    /// Take up to `units` from this batch and return how many were taken
    pub(crate) fn draw(&mut self, units: u32) -> u32 {
        let taken = units.min(self.units_remaining);
        self.units_remaining -= taken;
        taken
    }
}

/// `ceil((expiry - now) / 1 day)`, with the expiry instant at the start of the
/// expiry date in UTC
pub fn days_until(expiry_date: NaiveDate, now: DateTime<Utc>) -> i64 {
    let expiry = expiry_date.and_time(NaiveTime::MIN).and_utc();
    let millis = (expiry - now).num_milliseconds();
    let whole = millis.div_euclid(MILLIS_PER_DAY);
    if millis.rem_euclid(MILLIS_PER_DAY) > 0 {
        whole + 1
    } else {
        whole
    }
}

/// Expiry band of a batch
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
    /// 0 days or fewer left
    Expired,
    /// 1-3 days left
    Critical,
    /// 4-7 days left
    Warning,
    /// More than 7 days left
    Safe,
}

impl ExpiryStatus {
    pub const CRITICAL_DAYS: i64 = 3;
    pub const WARNING_DAYS: i64 = 7;

    pub fn from_days_left(days_left: i64) -> Self {
        if days_left <= 0 {
            ExpiryStatus::Expired
        } else if days_left <= Self::CRITICAL_DAYS {
            ExpiryStatus::Critical
        } else if days_left <= Self::WARNING_DAYS {
            ExpiryStatus::Warning
        } else {
            ExpiryStatus::Safe
        }
    }
}

impl std::fmt::Display for ExpiryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpiryStatus::Expired => write!(f, "Expired"),
            ExpiryStatus::Critical => write!(f, "Critical"),
            ExpiryStatus::Warning => write!(f, "Warning"),
            ExpiryStatus::Safe => write!(f, "Safe"),
        }
    }
}

impl std::str::FromStr for ExpiryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "expired" => Ok(ExpiryStatus::Expired),
            "critical" => Ok(ExpiryStatus::Critical),
            "warning" => Ok(ExpiryStatus::Warning),
            "safe" => Ok(ExpiryStatus::Safe),
            other => Err(format!("unknown expiry status: {}", other)),
        }
    }
}

/// Input for recording a new collection
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddBatchInput {
    #[validate(length(min = 1, message = "Donor name is required"))]
    pub donor_name: String,
    #[validate(length(min = 1, message = "Donor phone is required"))]
    pub donor_phone: String,
    #[validate(email(message = "Invalid email format"))]
    #[serde(default)]
    pub donor_email: Option<String>,
    pub blood_type: BloodType,
    #[validate(range(min = 1, message = "Units collected must be a positive number"))]
    pub units_collected: i64,
    /// ISO date, `YYYY-MM-DD`
    pub collection_date: String,
}

/// Filter for the inventory listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchFilter {
    #[serde(default)]
    pub blood_type: Option<BloodType>,
    #[serde(default)]
    pub expiry_status: Option<ExpiryStatus>,
    /// Case-insensitive donor name fragment
    #[serde(default)]
    pub search: Option<String>,
}

impl BatchFilter {
    pub fn matches(&self, batch: &Batch, now: DateTime<Utc>) -> bool {
        if let Some(blood_type) = self.blood_type {
            if batch.blood_type != blood_type {
                return false;
            }
        }
        if let Some(status) = self.expiry_status {
            if batch.expiry_status(now) != status {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => batch
                .donor_name
                .to_lowercase()
                .contains(&term.to_lowercase()),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon(date: NaiveDate) -> DateTime<Utc> {
        Utc.from_utc_datetime(&date.and_hms_opt(12, 0, 0).unwrap())
    }

    #[test]
    fn test_expiry_is_collection_plus_shelf_life() {
        let collected = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(
            Batch::expiry_for(collected),
            NaiveDate::from_ymd_opt(2024, 2, 12).unwrap()
        );
    }

    #[test]
    fn test_days_until_rounds_up_partial_days() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let expiry = today + Duration::days(2);
        assert_eq!(days_until(expiry, noon(today)), 2);

        let midnight = today.and_time(NaiveTime::MIN).and_utc();
        assert_eq!(days_until(expiry, midnight), 2);
        assert_eq!(days_until(today, midnight), 0);
        assert_eq!(days_until(today, noon(today)), 0);
        assert_eq!(days_until(today - Duration::days(3), noon(today)), -3);
    }

    #[test]
    fn test_expiry_status_bands() {
        assert_eq!(ExpiryStatus::from_days_left(-1), ExpiryStatus::Expired);
        assert_eq!(ExpiryStatus::from_days_left(0), ExpiryStatus::Expired);
        assert_eq!(ExpiryStatus::from_days_left(1), ExpiryStatus::Critical);
        assert_eq!(ExpiryStatus::from_days_left(3), ExpiryStatus::Critical);
        assert_eq!(ExpiryStatus::from_days_left(4), ExpiryStatus::Warning);
        assert_eq!(ExpiryStatus::from_days_left(7), ExpiryStatus::Warning);
        assert_eq!(ExpiryStatus::from_days_left(8), ExpiryStatus::Safe);
    }

    #[test]
    fn test_filter_matches_type_status_and_search() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let batch = Batch {
            id: Uuid::new_v4(),
            donor_name: "Kwame Asante".to_string(),
            donor_phone: "0241234567".to_string(),
            donor_email: None,
            blood_type: BloodType::OPositive,
            units_collected: 3,
            units_remaining: 3,
            collection_date: today - Duration::days(40),
            expiry_date: today + Duration::days(2),
        };

        assert!(BatchFilter::default().matches(&batch, noon(today)));

        let filter = BatchFilter {
            blood_type: Some(BloodType::OPositive),
            expiry_status: Some(ExpiryStatus::Critical),
            search: Some("asante".to_string()),
        };
        assert!(filter.matches(&batch, noon(today)));

        let wrong_type = BatchFilter {
            blood_type: Some(BloodType::ONegative),
            ..Default::default()
        };
        assert!(!wrong_type.matches(&batch, noon(today)));

        let wrong_band = BatchFilter {
            expiry_status: Some(ExpiryStatus::Safe),
            ..Default::default()
        };
        assert!(!wrong_band.matches(&batch, noon(today)));
    }

    #[test]
    fn test_draw_never_goes_below_zero() {
        let mut batch = Batch {
            id: Uuid::new_v4(),
            donor_name: "Ama Serwaa".to_string(),
            donor_phone: "0551234567".to_string(),
            donor_email: None,
            blood_type: BloodType::APositive,
            units_collected: 4,
            units_remaining: 2,
            collection_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            expiry_date: NaiveDate::from_ymd_opt(2024, 7, 13).unwrap(),
        };
        assert_eq!(batch.draw(5), 2);
        assert!(batch.is_depleted());
        assert_eq!(batch.units_used(), 4);
    }
}
