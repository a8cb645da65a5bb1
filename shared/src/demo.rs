//! Demo inventory for first runs
//!
//! Seeds twenty collections and twelve issues relative to `now`. Everything
//! goes through the ledger's own commands so the seeded state satisfies the
//! same invariants as live data.

use chrono::{DateTime, Duration, Utc};

use crate::error::LedgerResult;
use crate::ledger::InventoryLedger;
use crate::models::{AddBatchInput, ConsumeInput, UsageReason, SHELF_LIFE_DAYS};
use crate::types::BloodType;

struct DemoDonor {
    name: &'static str,
    phone: &'static str,
    blood_type: BloodType,
    units: i64,
    days_to_expiry: i64,
}

struct DemoIssue {
    blood_type: BloodType,
    units: i64,
    reason: UsageReason,
    days_ago: i64,
}

const fn donor(
    name: &'static str,
    phone: &'static str,
    blood_type: BloodType,
    units: i64,
    days_to_expiry: i64,
) -> DemoDonor {
    DemoDonor {
        name,
        phone,
        blood_type,
        units,
        days_to_expiry,
    }
}

const fn issue(blood_type: BloodType, units: i64, reason: UsageReason, days_ago: i64) -> DemoIssue {
    DemoIssue {
        blood_type,
        units,
        reason,
        days_ago,
    }
}

use BloodType::*;

const DONORS: [DemoDonor; 20] = [
    donor("Kwame Asante", "0241234567", OPositive, 3, 12),
    donor("Ama Serwaa", "0551234567", OPositive, 2, 5),
    donor("Yaw Mensah", "0271234567", OPositive, 4, 30),
    donor("Kofi Boateng", "0201234567", ONegative, 2, 25),
    donor("Efua Nyarko", "0541234567", ONegative, 3, 2),
    donor("Akua Dufie", "0261234567", APositive, 5, 35),
    donor("Nana Agyei", "0501234567", APositive, 2, 32),
    donor("Adjoa Mensah", "0231234567", APositive, 3, 37),
    donor("Kwesi Appiah", "0571234567", ANegative, 1, 20),
    donor("Abena Osei", "0211234567", ANegative, 2, 6),
    donor("Kojo Antwi", "0561234567", BPositive, 4, 28),
    donor("Esi Asantewaa", "0241234568", BPositive, 2, 33),
    donor("Papa Kwame", "0551234568", BNegative, 1, 15),
    donor("Maame Yaa", "0271234568", BNegative, 2, 1),
    donor("Fiifi Baiden", "0201234568", AbPositive, 3, 34),
    donor("Akosua Mensah", "0541234568", AbPositive, 2, 31),
    donor("Yaa Asantewaa", "0261234568", AbNegative, 1, 22),
    donor("Osei Kwadwo", "0501234568", AbNegative, 2, 36),
    donor("Adwoa Fremah", "0231234568", OPositive, 3, 38),
    donor("Kwabena Ofosu", "0571234568", OPositive, 2, 26),
];

const ISSUES: [DemoIssue; 12] = [
    issue(OPositive, 2, UsageReason::Emergency, 0),
    issue(APositive, 1, UsageReason::Surgery, 0),
    issue(ONegative, 1, UsageReason::Emergency, 1),
    issue(BPositive, 2, UsageReason::Surgery, 1),
    issue(OPositive, 3, UsageReason::Emergency, 2),
    issue(AbPositive, 1, UsageReason::Other, 2),
    issue(ANegative, 1, UsageReason::Surgery, 3),
    issue(OPositive, 2, UsageReason::Emergency, 4),
    issue(BNegative, 1, UsageReason::Emergency, 5),
    issue(OPositive, 1, UsageReason::Surgery, 6),
    issue(APositive, 2, UsageReason::Emergency, 7),
    issue(ONegative, 1, UsageReason::Other, 8),
];

/// Load the demo inventory into `ledger`.
///
/// Call before attaching a persistence sink if the seed should not be written
/// out immediately.
pub fn seed_demo_data(ledger: &mut InventoryLedger, now: DateTime<Utc>) -> LedgerResult<()> {
    let today = now.date_naive();

    // Collections are prepended, so insert oldest-listed last
    for d in DONORS.iter().rev() {
        let collection_date = today + Duration::days(d.days_to_expiry - SHELF_LIFE_DAYS);
        ledger.add_batch(
            AddBatchInput {
                donor_name: d.name.to_string(),
                donor_phone: d.phone.to_string(),
                donor_email: None,
                blood_type: d.blood_type,
                units_collected: d.units,
                collection_date: collection_date.to_string(),
            },
            now,
        )?;
    }

    for i in ISSUES.iter().rev() {
        ledger.consume(
            ConsumeInput {
                blood_type: i.blood_type,
                units: i.units,
                reason: i.reason,
                date: Some((today - Duration::days(i.days_ago)).to_string()),
            },
            now,
        )?;
    }

    tracing::info!(
        batches = ledger.batches().len(),
        usage = ledger.list_usage_events().len(),
        alerts = ledger.list_alerts().len(),
        "Seeded demo inventory"
    );
    Ok(())
}
