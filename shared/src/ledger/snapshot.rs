//! Persisted ledger state
//!
//! The ledger persists as four independent keyed records. Each host decides
//! where the records live (files, browser storage); this module owns their
//! encoding and the defaults applied to missing records.

use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;
use crate::models::{Alert, Batch, UsageEvent, DEFAULT_LOW_STOCK_THRESHOLD};

/// One persisted record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerRecord {
    Batches,
    Usage,
    Alerts,
    Threshold,
}

impl LedgerRecord {
    pub const ALL: [LedgerRecord; 4] = [
        LedgerRecord::Batches,
        LedgerRecord::Usage,
        LedgerRecord::Alerts,
        LedgerRecord::Threshold,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LedgerRecord::Batches => "batches",
            LedgerRecord::Usage => "usage",
            LedgerRecord::Alerts => "alerts",
            LedgerRecord::Threshold => "threshold",
        }
    }

    /// Browser storage key
    pub fn storage_key(&self) -> &'static str {
        match self {
            LedgerRecord::Batches => "bb_stock",
            LedgerRecord::Usage => "bb_usage",
            LedgerRecord::Alerts => "bb_alerts",
            LedgerRecord::Threshold => "bb_threshold",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.name())
    }
}

/// Full copy of the ledger's persisted state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub batches: Vec<Batch>,
    pub usage: Vec<UsageEvent>,
    pub alerts: Vec<Alert>,
    pub threshold: u32,
}

impl Default for LedgerSnapshot {
    fn default() -> Self {
        Self {
            batches: Vec::new(),
            usage: Vec::new(),
            alerts: Vec::new(),
            threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }
}

impl LedgerSnapshot {
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty() && self.usage.is_empty() && self.alerts.is_empty()
    }

    /// Encode one record as JSON
    pub fn encode(&self, record: LedgerRecord) -> Result<String, PersistenceError> {
        let encoded = match record {
            LedgerRecord::Batches => serde_json::to_string(&self.batches),
            LedgerRecord::Usage => serde_json::to_string(&self.usage),
            LedgerRecord::Alerts => serde_json::to_string(&self.alerts),
            LedgerRecord::Threshold => serde_json::to_string(&self.threshold),
        };
        encoded.map_err(|source| PersistenceError::Serialization {
            record: record.name(),
            source,
        })
    }

    /// Encode every record
    pub fn encode_all(&self) -> Result<Vec<(LedgerRecord, String)>, PersistenceError> {
        LedgerRecord::ALL
            .into_iter()
            .map(|record| Ok((record, self.encode(record)?)))
            .collect()
    }

    /// Decode a snapshot from raw records. `read` returns `None` for a record
    /// that has never been written; missing records fall back to defaults.
    pub fn decode<F>(mut read: F) -> Result<Self, PersistenceError>
    where
        F: FnMut(LedgerRecord) -> Result<Option<String>, PersistenceError>,
    {
        let mut snapshot = LedgerSnapshot::default();
        for record in LedgerRecord::ALL {
            let Some(raw) = read(record)? else {
                continue;
            };
            if raw.trim().is_empty() {
                continue;
            }
            let wrap = |source| PersistenceError::Serialization {
                record: record.name(),
                source,
            };
            match record {
                LedgerRecord::Batches => snapshot.batches = serde_json::from_str(&raw).map_err(wrap)?,
                LedgerRecord::Usage => snapshot.usage = serde_json::from_str(&raw).map_err(wrap)?,
                LedgerRecord::Alerts => snapshot.alerts = serde_json::from_str(&raw).map_err(wrap)?,
                LedgerRecord::Threshold => snapshot.threshold = serde_json::from_str(&raw).map_err(wrap)?,
            }
        }
        Ok(snapshot)
    }
}

/// Receives the ledger state after every successful mutation.
///
/// Implementations must not block; a failure is reported back to the ledger
/// for logging and never rolls back the mutation.
pub trait PersistenceSink: Send + Sync {
    fn persist(&self, snapshot: &LedgerSnapshot) -> Result<(), PersistenceError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_records_use_defaults() {
        let snapshot = LedgerSnapshot::decode(|_| Ok(None)).unwrap();
        assert_eq!(snapshot, LedgerSnapshot::default());
        assert_eq!(snapshot.threshold, 20);
    }

    #[test]
    fn test_decode_threshold_only() {
        let snapshot = LedgerSnapshot::decode(|record| {
            Ok(match record {
                LedgerRecord::Threshold => Some("35".to_string()),
                _ => None,
            })
        })
        .unwrap();
        assert_eq!(snapshot.threshold, 35);
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_alert_missing_optional_fields_defaults() {
        let raw = r#"[{"id":"6f1c2a56-3f2d-4c59-9d3e-3f0b8f0e7a11","kind":"low_stock","message":"B- stock critically low.","date":"2024-06-10"}]"#;
        let snapshot = LedgerSnapshot::decode(|record| {
            Ok(match record {
                LedgerRecord::Alerts => Some(raw.to_string()),
                _ => None,
            })
        })
        .unwrap();

        let alert = &snapshot.alerts[0];
        assert!(!alert.read);
        assert_eq!(alert.blood_type, None);
        assert_eq!(alert.source_batch_id, None);
    }

    #[test]
    fn test_corrupt_record_names_the_record() {
        let err = LedgerSnapshot::decode(|record| {
            Ok(match record {
                LedgerRecord::Usage => Some("{not json".to_string()),
                _ => None,
            })
        })
        .unwrap_err();
        assert!(err.to_string().contains("usage"));
    }

    #[test]
    fn test_encode_all_then_decode() {
        let mut original = LedgerSnapshot::default();
        original.threshold = 12;

        let stored: HashMap<LedgerRecord, String> = original.encode_all().unwrap().into_iter().collect();
        assert_eq!(stored.len(), 4);
        assert_eq!(stored[&LedgerRecord::Threshold], "12");

        let restored = LedgerSnapshot::decode(|record| Ok(stored.get(&record).cloned())).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_record_keys() {
        assert_eq!(LedgerRecord::Batches.file_name(), "batches.json");
        assert_eq!(LedgerRecord::Batches.storage_key(), "bb_stock");
        assert_eq!(LedgerRecord::Threshold.storage_key(), "bb_threshold");
    }
}
