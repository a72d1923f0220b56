use std::collections::HashSet;

use super::entity::ResourceRecord;
use crate::domain::{DomainError, DomainResult};

/// Validates all ResourceRecord invariants
pub fn validate_record(record: &ResourceRecord) -> DomainResult<()> {
    validate_native_id(&record.native_id)?;
    validate_distinct("subtitle language", &record.subtitle_languages)?;
    validate_distinct("subtitle path", &record.local_subtitle_paths)?;
    validate_media_path(record)?;
    Ok(())
}

/// Native id is the lookup key and cannot be blank
fn validate_native_id(native_id: &str) -> DomainResult<()> {
    if native_id.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Native id cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_distinct(what: &str, values: &[String]) -> DomainResult<()> {
    let mut seen = HashSet::with_capacity(values.len());
    for value in values {
        if !seen.insert(value.as_str()) {
            return Err(DomainError::InvariantViolation(format!(
                "Duplicate {}: {}",
                what, value
            )));
        }
    }
    Ok(())
}

/// A present media path must point somewhere
fn validate_media_path(record: &ResourceRecord) -> DomainResult<()> {
    if let Some(path) = &record.local_media_path {
        if path.trim().is_empty() {
            return Err(DomainError::InvariantViolation(
                "Local media path cannot be empty when present".to_string(),
            ));
        }
    }
    Ok(())
}

/// Invariants that must hold true for ResourceRecord:
///
/// 1. Identity (UUID) is assigned before the first save and never changes
/// 2. Native id is non-empty
/// 3. Available languages and downloaded paths are separate sets
/// 4. Neither set contains duplicates
/// 5. A record is written once and is read-only afterwards
