//! Batch store and usage ledger

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Batch, BatchDraw, BatchFilter, UsageEvent};
use crate::types::BloodType;

/// Ordered batches, most recent first
#[derive(Debug, Clone, Default)]
pub struct BatchStore {
    batches: Vec<Batch>,
}

impl BatchStore {
    /// Build a store from persisted batches, clamping any record whose
    /// remaining count exceeds what was collected
    pub fn from_batches(mut batches: Vec<Batch>) -> Self {
        for batch in batches.iter_mut() {
            if batch.units_remaining > batch.units_collected {
                tracing::warn!(
                    batch_id = %batch.id,
                    remaining = batch.units_remaining,
                    collected = batch.units_collected,
                    "Clamping batch with more units remaining than collected"
                );
                batch.units_remaining = batch.units_collected;
            }
        }
        Self { batches }
    }

    pub fn as_slice(&self) -> &[Batch] {
        &self.batches
    }

    pub(crate) fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn get(&self, id: Uuid) -> Option<&Batch> {
        self.batches.iter().find(|b| b.id == id)
    }

    pub(crate) fn prepend(&mut self, batch: Batch) {
        self.batches.insert(0, batch);
    }

    /// Read-only view of the batches matching `predicate`
    pub fn list_where<F>(&self, predicate: F) -> Vec<&Batch>
    where
        F: Fn(&Batch) -> bool,
    {
        self.batches.iter().filter(|b| predicate(b)).collect()
    }

    pub fn list(&self, filter: &BatchFilter, now: DateTime<Utc>) -> Vec<&Batch> {
        self.list_where(|b| filter.matches(b, now))
    }

    /// Units remaining across all batches of one type
    pub fn available(&self, blood_type: BloodType) -> u64 {
        self.batches
            .iter()
            .filter(|b| b.blood_type == blood_type)
            .map(|b| u64::from(b.units_remaining))
            .sum()
    }

    /// Apply planned draws. Draws come from `consumption::plan_draws` against
    /// this same store, so every id resolves and every amount fits.
    pub(crate) fn apply(&mut self, draws: &[BatchDraw]) {
        for draw in draws {
            if let Some(batch) = self.batches.iter_mut().find(|b| b.id == draw.batch_id) {
                let taken = batch.draw(draw.units);
                debug_assert_eq!(taken, draw.units);
            }
        }
    }
}

/// Append-only consumption history, most recent first
#[derive(Debug, Clone, Default)]
pub struct UsageLedger {
    events: Vec<UsageEvent>,
}

impl UsageLedger {
    pub fn from_events(events: Vec<UsageEvent>) -> Self {
        Self { events }
    }

    pub fn as_slice(&self) -> &[UsageEvent] {
        &self.events
    }

    pub(crate) fn len(&self) -> usize {
        self.events.len()
    }

    pub(crate) fn record(&mut self, event: UsageEvent) {
        self.events.insert(0, event);
    }
}
