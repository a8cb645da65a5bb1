//! Read-only metrics over a ledger snapshot

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Alert, Batch, UsageEvent, UsageReason};
use crate::types::BloodType;

/// Default storage capacity in units
pub const DEFAULT_STORAGE_CAPACITY: u32 = 500;

/// Types holding fewer units than this count toward shortage risk
pub const SHORTAGE_RISK_UNITS: u64 = 5;

/// Horizon of the dashboard's "expiring soon" card
pub const EXPIRING_SOON_DAYS: i64 = 7;

/// Stock level of one blood type relative to the threshold
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    Critical,
    Low,
    Healthy,
}

impl StockLevel {
    pub fn classify(total: u64, threshold: u32) -> Self {
        if total == 0 {
            StockLevel::Critical
        } else if total < u64::from(threshold) {
            StockLevel::Low
        } else {
            StockLevel::Healthy
        }
    }
}

/// Shortage risk across all types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ShortageRisk {
    Low,
    Medium,
    High,
}

impl ShortageRisk {
    pub fn from_types_at_risk(count: usize) -> Self {
        match count {
            0 => ShortageRisk::Low,
            1..=2 => ShortageRisk::Medium,
            _ => ShortageRisk::High,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypeStock {
    pub blood_type: BloodType,
    pub units: u64,
    pub level: StockLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyUsage {
    pub date: NaiveDate,
    pub units: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReasonUsage {
    pub reason: UsageReason,
    pub units: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageUtilization {
    pub capacity: u32,
    pub used: u64,
    pub available: u64,
    /// Rounded to the nearest whole percent
    pub percent_used: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShortageReport {
    pub risk: ShortageRisk,
    pub types_at_risk: Vec<BloodType>,
}

/// Dashboard summary cards
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardSummary {
    pub total_units: u64,
    pub used_today: u64,
    pub expiring_soon: usize,
    pub highest_demand: Option<BloodType>,
    pub unread_alerts: usize,
    pub stock: Vec<TypeStock>,
}

/// Stateless queries over borrowed ledger collections
#[derive(Debug, Clone, Copy)]
pub struct InventoryMetrics<'a> {
    batches: &'a [Batch],
    usage: &'a [UsageEvent],
    alerts: &'a [Alert],
}

impl<'a> InventoryMetrics<'a> {
    pub fn new(batches: &'a [Batch], usage: &'a [UsageEvent], alerts: &'a [Alert]) -> Self {
        Self {
            batches,
            usage,
            alerts,
        }
    }

    pub fn total_by_type(&self, blood_type: BloodType) -> u64 {
        self.batches
            .iter()
            .filter(|b| b.blood_type == blood_type)
            .map(|b| u64::from(b.units_remaining))
            .sum()
    }

    pub fn total_units(&self) -> u64 {
        self.batches.iter().map(|b| u64::from(b.units_remaining)).sum()
    }

    /// Batches with stock left that expire within `days` (and have not expired)
    pub fn expiring_within(&self, days: i64, now: DateTime<Utc>) -> Vec<&'a Batch> {
        let mut expiring: Vec<&'a Batch> = self
            .batches
            .iter()
            .filter(|b| b.units_remaining > 0)
            .filter(|b| {
                let left = b.days_until_expiry(now);
                left > 0 && left <= days
            })
            .collect();
        expiring.sort_by_key(|b| b.expiry_date);
        expiring
    }

    pub fn used_today(&self, today: NaiveDate) -> u64 {
        self.usage
            .iter()
            .filter(|e| e.date == today)
            .map(|e| u64::from(e.units_used))
            .sum()
    }

    /// Blood type with the largest cumulative use.
    ///
    /// Ties resolve to the type that comes first in `BloodType::ALL`.
    /// Returns `None` when nothing has been used.
    pub fn highest_demand_type(&self) -> Option<BloodType> {
        let mut used: HashMap<BloodType, u64> = HashMap::new();
        for event in self.usage {
            *used.entry(event.blood_type).or_default() += u64::from(event.units_used);
        }

        let mut best: Option<(BloodType, u64)> = None;
        for blood_type in BloodType::ALL {
            let units = used.get(&blood_type).copied().unwrap_or(0);
            if units == 0 {
                continue;
            }
            match best {
                Some((_, top)) if top >= units => {}
                _ => best = Some((blood_type, units)),
            }
        }
        best.map(|(blood_type, _)| blood_type)
    }

    pub fn stock_level(&self, blood_type: BloodType, threshold: u32) -> StockLevel {
        StockLevel::classify(self.total_by_type(blood_type), threshold)
    }

    /// Stock for every type in canonical order
    pub fn stock_summary(&self, threshold: u32) -> Vec<TypeStock> {
        BloodType::ALL
            .into_iter()
            .map(|blood_type| {
                let units = self.total_by_type(blood_type);
                TypeStock {
                    blood_type,
                    units,
                    level: StockLevel::classify(units, threshold),
                }
            })
            .collect()
    }

    /// Usage per day for the last `days` days up to and including `today`,
    /// oldest first
    pub fn usage_by_day(&self, today: NaiveDate, days: u32) -> Vec<DailyUsage> {
        (0..i64::from(days))
            .rev()
            .map(|offset| {
                let date = today - Duration::days(offset);
                DailyUsage {
                    date,
                    units: self.used_today(date),
                }
            })
            .collect()
    }

    pub fn usage_by_reason(&self) -> Vec<ReasonUsage> {
        UsageReason::ALL
            .into_iter()
            .map(|reason| ReasonUsage {
                reason,
                units: self
                    .usage
                    .iter()
                    .filter(|e| e.reason == reason)
                    .map(|e| u64::from(e.units_used))
                    .sum(),
            })
            .collect()
    }

    pub fn shortage_risk(&self) -> ShortageReport {
        let types_at_risk: Vec<BloodType> = BloodType::ALL
            .into_iter()
            .filter(|bt| self.total_by_type(*bt) < SHORTAGE_RISK_UNITS)
            .collect();
        ShortageReport {
            risk: ShortageRisk::from_types_at_risk(types_at_risk.len()),
            types_at_risk,
        }
    }

    pub fn storage_utilization(&self, capacity: u32) -> StorageUtilization {
        let used = self.total_units();
        let capacity_units = u64::from(capacity);
        let percent_used = if capacity == 0 {
            0
        } else {
            // Round half up
            let pct = (used * 100 + capacity_units / 2) / capacity_units;
            u32::try_from(pct).unwrap_or(u32::MAX)
        };
        StorageUtilization {
            capacity,
            used,
            available: capacity_units.saturating_sub(used),
            percent_used,
        }
    }

    pub fn unread_alerts(&self) -> usize {
        self.alerts.iter().filter(|a| !a.read).count()
    }

    pub fn dashboard(&self, now: DateTime<Utc>, threshold: u32) -> DashboardSummary {
        DashboardSummary {
            total_units: self.total_units(),
            used_today: self.used_today(now.date_naive()),
            expiring_soon: self.expiring_within(EXPIRING_SOON_DAYS, now).len(),
            highest_demand: self.highest_demand_type(),
            unread_alerts: self.unread_alerts(),
            stock: self.stock_summary(threshold),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.from_utc_datetime(&today().and_hms_opt(14, 0, 0).unwrap())
    }

    fn batch(blood_type: BloodType, remaining: u32, expires_in: i64) -> Batch {
        let expiry_date = today() + Duration::days(expires_in);
        Batch {
            id: Uuid::new_v4(),
            donor_name: "Donor".to_string(),
            donor_phone: "0241234567".to_string(),
            donor_email: None,
            blood_type,
            units_collected: remaining.max(1),
            units_remaining: remaining,
            collection_date: expiry_date - Duration::days(42),
            expiry_date,
        }
    }

    fn usage(blood_type: BloodType, units: u32, reason: UsageReason, days_ago: i64) -> UsageEvent {
        UsageEvent {
            id: Uuid::new_v4(),
            blood_type,
            units_used: units,
            reason,
            date: today() - Duration::days(days_ago),
        }
    }

    #[test]
    fn test_totals() {
        let batches = vec![
            batch(BloodType::OPositive, 2, 12),
            batch(BloodType::OPositive, 4, 30),
            batch(BloodType::ANegative, 1, 20),
        ];
        let metrics = InventoryMetrics::new(&batches, &[], &[]);

        assert_eq!(metrics.total_by_type(BloodType::OPositive), 6);
        assert_eq!(metrics.total_by_type(BloodType::BPositive), 0);
        assert_eq!(metrics.total_units(), 7);
    }

    #[test]
    fn test_expiring_within_excludes_expired_and_empty() {
        let batches = vec![
            batch(BloodType::OPositive, 2, 5),
            batch(BloodType::OPositive, 0, 2),
            batch(BloodType::ONegative, 1, 2),
            batch(BloodType::ONegative, 1, 0),
            batch(BloodType::APositive, 1, 9),
        ];
        let metrics = InventoryMetrics::new(&batches, &[], &[]);

        let expiring = metrics.expiring_within(7, now());
        assert_eq!(expiring.len(), 2);
        // soonest first
        assert_eq!(expiring[0].blood_type, BloodType::ONegative);
        assert_eq!(expiring[1].blood_type, BloodType::OPositive);
    }

    #[test]
    fn test_used_today_counts_only_today() {
        let events = vec![
            usage(BloodType::OPositive, 2, UsageReason::Emergency, 0),
            usage(BloodType::APositive, 1, UsageReason::Surgery, 0),
            usage(BloodType::ONegative, 1, UsageReason::Emergency, 1),
        ];
        let metrics = InventoryMetrics::new(&[], &events, &[]);

        assert_eq!(metrics.used_today(today()), 3);
        assert_eq!(metrics.used_today(today() - Duration::days(1)), 1);
    }

    #[test]
    fn test_highest_demand_type() {
        let events = vec![
            usage(BloodType::APositive, 3, UsageReason::Surgery, 0),
            usage(BloodType::OPositive, 2, UsageReason::Emergency, 1),
            usage(BloodType::OPositive, 2, UsageReason::Emergency, 2),
        ];
        let metrics = InventoryMetrics::new(&[], &events, &[]);
        assert_eq!(metrics.highest_demand_type(), Some(BloodType::OPositive));
    }

    #[test]
    fn test_highest_demand_tie_uses_canonical_order() {
        let events = vec![
            usage(BloodType::AbNegative, 3, UsageReason::Other, 0),
            usage(BloodType::APositive, 3, UsageReason::Surgery, 0),
        ];
        let metrics = InventoryMetrics::new(&[], &events, &[]);
        assert_eq!(metrics.highest_demand_type(), Some(BloodType::APositive));
    }

    #[test]
    fn test_highest_demand_none_without_usage() {
        let metrics = InventoryMetrics::new(&[], &[], &[]);
        assert_eq!(metrics.highest_demand_type(), None);
    }

    #[test]
    fn test_stock_levels() {
        assert_eq!(StockLevel::classify(0, 20), StockLevel::Critical);
        assert_eq!(StockLevel::classify(19, 20), StockLevel::Low);
        assert_eq!(StockLevel::classify(20, 20), StockLevel::Healthy);
    }

    #[test]
    fn test_usage_by_day_oldest_first() {
        let events = vec![
            usage(BloodType::OPositive, 2, UsageReason::Emergency, 0),
            usage(BloodType::OPositive, 5, UsageReason::Emergency, 2),
        ];
        let metrics = InventoryMetrics::new(&[], &events, &[]);
        let daily = metrics.usage_by_day(today(), 3);

        assert_eq!(daily.len(), 3);
        assert_eq!(daily[0].date, today() - Duration::days(2));
        assert_eq!(daily[0].units, 5);
        assert_eq!(daily[1].units, 0);
        assert_eq!(daily[2].units, 2);
    }

    #[test]
    fn test_usage_by_reason() {
        let events = vec![
            usage(BloodType::OPositive, 2, UsageReason::Emergency, 0),
            usage(BloodType::OPositive, 1, UsageReason::Emergency, 1),
            usage(BloodType::APositive, 4, UsageReason::Surgery, 1),
        ];
        let metrics = InventoryMetrics::new(&[], &events, &[]);
        let by_reason = metrics.usage_by_reason();

        assert_eq!(by_reason[0], ReasonUsage { reason: UsageReason::Emergency, units: 3 });
        assert_eq!(by_reason[1], ReasonUsage { reason: UsageReason::Surgery, units: 4 });
        assert_eq!(by_reason[2], ReasonUsage { reason: UsageReason::Other, units: 0 });
    }

    #[test]
    fn test_shortage_risk() {
        assert_eq!(ShortageRisk::from_types_at_risk(0), ShortageRisk::Low);
        assert_eq!(ShortageRisk::from_types_at_risk(2), ShortageRisk::Medium);
        assert_eq!(ShortageRisk::from_types_at_risk(3), ShortageRisk::High);

        let batches: Vec<Batch> = BloodType::ALL.iter().map(|bt| batch(*bt, 5, 20)).collect();
        let metrics = InventoryMetrics::new(&batches, &[], &[]);
        let report = metrics.shortage_risk();
        assert_eq!(report.risk, ShortageRisk::Low);
        assert!(report.types_at_risk.is_empty());
    }

    #[test]
    fn test_storage_utilization() {
        let batches = vec![batch(BloodType::OPositive, 123, 20)];
        let metrics = InventoryMetrics::new(&batches, &[], &[]);
        let storage = metrics.storage_utilization(DEFAULT_STORAGE_CAPACITY);

        assert_eq!(storage.used, 123);
        assert_eq!(storage.available, 377);
        assert_eq!(storage.percent_used, 25);
        assert_eq!(metrics.storage_utilization(0).percent_used, 0);
    }
}
