// Validation utilities
// Author: Gabriel Demetrios Lafis

use crate::data::on_or_before;

/// Validate that a string is not empty or whitespace
pub fn validate_not_blank(value: &str, name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("'{}' cannot be empty", name))
    } else {
        Ok(())
    }
}

/// Validate that a list has at least one non-blank entry and no blank ones
pub fn validate_not_empty_list(values: &[String], name: &str) -> Result<(), String> {
    if values.is_empty() {
        return Err(format!("'{}' must contain at least one entry", name));
    }

    if values.iter().any(|v| v.trim().is_empty()) {
        return Err(format!("'{}' cannot contain empty entries", name));
    }

    Ok(())
}

/// Validate that a normalized date bound is ordered before another; a
/// `YYYY` or `YYYY-MM` end covers its whole period
pub fn validate_range_order(start: Option<&str>, end: Option<&str>) -> Result<(), String> {
    match (start, end) {
        (Some(start), Some(end)) if !on_or_before(start, end) => Err(format!(
            "range start '{}' is after end '{}'",
            start, end
        )),
        _ => Ok(()),
    }
}
