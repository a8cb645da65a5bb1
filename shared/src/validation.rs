//! Validation utilities for ledger commands

use chrono::NaiveDate;
use validator::{Validate, ValidationErrors};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{AddBatchInput, ConsumeInput, UsageReason};
use crate::types::BloodType;

// ============================================================================
// Field Validations
// ============================================================================

/// Validate that a donor phone has visible characters. The format is free
/// text; clinics record extensions and placeholders such as "N/A".
pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    if phone.trim().is_empty() {
        return Err("Phone number cannot be blank");
    }
    Ok(())
}

/// Validate that a name has visible characters
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Name cannot be blank");
    }
    Ok(())
}

/// Parse an ISO `YYYY-MM-DD` date
pub fn parse_iso_date(value: &str) -> Result<NaiveDate, &'static str> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| "Date must be YYYY-MM-DD")
}

/// Validate a unit count and narrow it to the stored width
pub fn validate_units(units: i64) -> Result<u32, &'static str> {
    if units <= 0 {
        return Err("Units must be a positive number");
    }
    u32::try_from(units).map_err(|_| "Units out of range")
}

/// Validate a low-stock threshold value
pub fn validate_threshold(value: i64) -> Result<u32, &'static str> {
    if value < 0 {
        return Err("Threshold cannot be negative");
    }
    u32::try_from(value).map_err(|_| "Threshold out of range")
}

// ============================================================================
// Command Validations
// ============================================================================

/// A collection that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidBatch {
    pub donor_name: String,
    pub donor_phone: String,
    pub donor_email: Option<String>,
    pub blood_type: BloodType,
    pub units_collected: u32,
    pub collection_date: NaiveDate,
}

/// A consumption request that passed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidConsumption {
    pub blood_type: BloodType,
    pub units: u32,
    pub reason: UsageReason,
    pub date: NaiveDate,
}

/// Validate an add-batch command. `today` bounds the collection date.
pub fn validate_add_batch(mut input: AddBatchInput, today: NaiveDate) -> LedgerResult<ValidBatch> {
    // Forms submit an empty string when no email is given
    input.donor_email = input
        .donor_email
        .map(|email| email.trim().to_string())
        .filter(|email| !email.is_empty());

    input.validate().map_err(from_validation_errors)?;
    validate_name(&input.donor_name).map_err(|m| LedgerError::validation("donor_name", m))?;
    validate_phone(&input.donor_phone).map_err(|m| LedgerError::validation("donor_phone", m))?;
    let units_collected = validate_units(input.units_collected)
        .map_err(|m| LedgerError::validation("units_collected", m))?;
    let collection_date = parse_iso_date(&input.collection_date)
        .map_err(|m| LedgerError::validation("collection_date", m))?;
    if collection_date > today {
        return Err(LedgerError::validation(
            "collection_date",
            "Collection date cannot be in the future",
        ));
    }

    Ok(ValidBatch {
        donor_name: input.donor_name.trim().to_string(),
        donor_phone: input.donor_phone.trim().to_string(),
        donor_email: input.donor_email,
        blood_type: input.blood_type,
        units_collected,
        collection_date,
    })
}

/// Validate a consume command. A missing date means `today`.
pub fn validate_consume(input: &ConsumeInput, today: NaiveDate) -> LedgerResult<ValidConsumption> {
    input.validate().map_err(from_validation_errors)?;
    let units = validate_units(input.units).map_err(|m| LedgerError::validation("units", m))?;
    let date = match input.date.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => {
            parse_iso_date(raw).map_err(|m| LedgerError::validation("date", m))?
        }
        _ => today,
    };

    Ok(ValidConsumption {
        blood_type: input.blood_type,
        units,
        reason: input.reason,
        date,
    })
}

/// Reduce `validator` output to the first failing field, sorted by name so
/// the reported field is stable
pub fn from_validation_errors(errors: ValidationErrors) -> LedgerError {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    match fields.first() {
        Some((field, errs)) => {
            let message = errs
                .first()
                .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                .unwrap_or_else(|| format!("Invalid value for {}", field));
            LedgerError::validation(field.to_string(), message)
        }
        None => LedgerError::validation("input", "Invalid input"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn input() -> AddBatchInput {
        AddBatchInput {
            donor_name: "Kofi Boateng".to_string(),
            donor_phone: "0201234567".to_string(),
            donor_email: Some("kofi@example.com".to_string()),
            blood_type: BloodType::ONegative,
            units_collected: 2,
            collection_date: "2024-06-01".to_string(),
        }
    }

    fn field_of(err: LedgerError) -> String {
        match err {
            LedgerError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_phone_accepts_free_text() {
        assert!(validate_phone("0241234567").is_ok());
        assert!(validate_phone("+233 24 123 4567").is_ok());
        assert!(validate_phone("N/A").is_ok());
        assert!(validate_phone("ext. 204").is_ok());
    }

    #[test]
    fn test_validate_phone_rejects_blank() {
        assert!(validate_phone("").is_err());
        assert!(validate_phone("   ").is_err());
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(parse_iso_date("2024-06-01").unwrap(), NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert!(parse_iso_date("01/06/2024").is_err());
        assert!(parse_iso_date("2024-02-30").is_err());
    }

    #[test]
    fn test_validate_units() {
        assert_eq!(validate_units(3).unwrap(), 3);
        assert_eq!(validate_units(12_000).unwrap(), 12_000);
        assert!(validate_units(0).is_err());
        assert!(validate_units(-4).is_err());
        assert!(validate_units(i64::from(u32::MAX) + 1).is_err());
    }

    #[test]
    fn test_validate_add_batch_accepts_valid_input() {
        let valid = validate_add_batch(input(), today()).unwrap();
        assert_eq!(valid.units_collected, 2);
        assert_eq!(valid.collection_date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    }

    #[test]
    fn test_validate_add_batch_treats_empty_email_as_absent() {
        let mut raw = input();
        raw.donor_email = Some("  ".to_string());
        let valid = validate_add_batch(raw, today()).unwrap();
        assert_eq!(valid.donor_email, None);
    }

    #[test]
    fn test_validate_add_batch_rejects_bad_fields() {
        let mut raw = input();
        raw.units_collected = 0;
        assert_eq!(field_of(validate_add_batch(raw, today()).unwrap_err()), "units_collected");

        let mut raw = input();
        raw.collection_date = "yesterday".to_string();
        assert_eq!(field_of(validate_add_batch(raw, today()).unwrap_err()), "collection_date");

        let mut raw = input();
        raw.collection_date = "2024-06-11".to_string();
        assert_eq!(field_of(validate_add_batch(raw, today()).unwrap_err()), "collection_date");

        let mut raw = input();
        raw.donor_email = Some("not-an-email".to_string());
        assert_eq!(field_of(validate_add_batch(raw, today()).unwrap_err()), "donor_email");

        let mut raw = input();
        raw.donor_name = "   ".to_string();
        assert_eq!(field_of(validate_add_batch(raw, today()).unwrap_err()), "donor_name");

        let mut raw = input();
        raw.donor_phone = "  ".to_string();
        assert_eq!(field_of(validate_add_batch(raw, today()).unwrap_err()), "donor_phone");
    }

    #[test]
    fn test_validate_add_batch_accepts_placeholder_phone() {
        let mut raw = input();
        raw.donor_phone = "N/A".to_string();
        let valid = validate_add_batch(raw, today()).unwrap();
        assert_eq!(valid.donor_phone, "N/A");
    }

    #[test]
    fn test_validate_consume_has_no_upper_cap() {
        let raw = ConsumeInput {
            blood_type: BloodType::OPositive,
            units: 12_000,
            reason: UsageReason::Surgery,
            date: None,
        };
        assert_eq!(validate_consume(&raw, today()).unwrap().units, 12_000);
    }

    #[test]
    fn test_validate_consume_defaults_date_to_today() {
        let raw = ConsumeInput {
            blood_type: BloodType::OPositive,
            units: 5,
            reason: UsageReason::Emergency,
            date: None,
        };
        let valid = validate_consume(&raw, today()).unwrap();
        assert_eq!(valid.date, today());
        assert_eq!(valid.units, 5);
    }

    #[test]
    fn test_validate_consume_rejects_non_positive_units() {
        let raw = ConsumeInput {
            blood_type: BloodType::OPositive,
            units: 0,
            reason: UsageReason::Surgery,
            date: None,
        };
        assert_eq!(field_of(validate_consume(&raw, today()).unwrap_err()), "units");
    }
}
