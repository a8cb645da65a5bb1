//! Type-aware consumption planning
//!
//! Draws are planned first-expiring-first-out: candidate batches are ordered
//! by expiry date, ties keep store order. Planning never mutates, so a failed
//! request leaves the store untouched.

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Batch, BatchDraw};
use crate::types::BloodType;

/// Plan which batches supply `units` of `blood_type`
pub fn plan_draws(batches: &[Batch], blood_type: BloodType, units: u32) -> LedgerResult<Vec<BatchDraw>> {
    let mut candidates: Vec<&Batch> = batches
        .iter()
        .filter(|b| b.blood_type == blood_type && b.units_remaining > 0)
        .collect();

    let available: u64 = candidates.iter().map(|b| u64::from(b.units_remaining)).sum();
    if available < u64::from(units) {
        return Err(LedgerError::InsufficientStock {
            blood_type,
            requested: units,
            available,
        });
    }

    // Stable sort keeps store order among equal expiry dates
    candidates.sort_by_key(|b| b.expiry_date);

    let mut still_needed = units;
    let mut draws = Vec::new();
    for batch in candidates {
        if still_needed == 0 {
            break;
        }
        let take = batch.units_remaining.min(still_needed);
        draws.push(BatchDraw {
            batch_id: batch.id,
            units: take,
        });
        still_needed -= take;
    }

    Ok(draws)
}
