//! Input validation utilities.
//!
//! This module contains functions for validating user inputs to ensure they meet
//! safety and correctness requirements before being used in operations.

use crate::constants::LOCATION_SEPARATOR;
use crate::{ReportError, ReportResult};

/// Splits a location display name into its facility and commune parts.
///
/// Location display names take the form `"<Facility>: <Commune>"`, for example
/// `"EPSP: Bab El Oued"`. Both parts are trimmed and must be non-empty.
///
/// # Errors
///
/// Returns `ReportError::Validation` if the separator is missing or either part is empty.
pub fn split_location_display_name(display_name: &str) -> ReportResult<(&str, &str)> {
    let (facility, commune) = display_name
        .split_once(LOCATION_SEPARATOR)
        .ok_or_else(|| {
            ReportError::Validation(format!(
                "location '{display_name}' must be in the format 'EPSP: Commune/Secteur'"
            ))
        })?;

    let facility = facility.trim();
    let commune = commune.trim();
    if facility.is_empty() || commune.is_empty() {
        return Err(ReportError::Validation(format!(
            "location '{display_name}' must name both a facility and a commune"
        )));
    }

    Ok((facility, commune))
}

/// Validates that a user identifier is safe for embedding in a URL path segment.
///
/// The identifier is embedded into backend paths: `/api/v1/user/{user_id}/reports`.
/// - Rejects empty or whitespace-only strings
/// - Bounds the length to avoid pathological inputs
/// - Restricts characters to a conservative ASCII set
///
/// # Errors
///
/// Returns `ReportError::InvalidConfig` if the identifier is invalid.
pub fn validate_user_id_safe_for_path(user_id: &str) -> ReportResult<()> {
    const MAX_USER_ID_LEN: usize = 128;

    if user_id.trim().is_empty() {
        return Err(ReportError::InvalidConfig("user id cannot be empty".into()));
    }

    if user_id.len() > MAX_USER_ID_LEN {
        return Err(ReportError::InvalidConfig(format!(
            "user id exceeds maximum length of {} characters",
            MAX_USER_ID_LEN
        )));
    }

    let ok = user_id
        .bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'.' | b'-' | b'_'));

    if !ok {
        return Err(ReportError::InvalidConfig(
            "user id contains invalid characters (only alphanumeric, '.', '-', '_' allowed)"
                .into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_facility_and_commune() {
        let (facility, commune) = split_location_display_name("EPSP:  Bab El Oued ").unwrap();
        assert_eq!(facility, "EPSP");
        assert_eq!(commune, "Bab El Oued");
    }

    #[test]
    fn splits_on_first_separator_only() {
        let (facility, commune) = split_location_display_name("EPSP: Sector: 3").unwrap();
        assert_eq!(facility, "EPSP");
        assert_eq!(commune, "Sector: 3");
    }

    #[test]
    fn rejects_missing_separator() {
        let err = split_location_display_name("EPSP Bab El Oued").expect_err("no separator");
        assert!(matches!(err, ReportError::Validation(msg) if msg.contains("format")));
    }

    #[test]
    fn rejects_empty_parts() {
        for bad in [": Bab El Oued", "EPSP:", " : "] {
            let err = split_location_display_name(bad).expect_err("empty part");
            assert!(matches!(err, ReportError::Validation(msg) if msg.contains("both")));
        }
    }

    #[test]
    fn user_id_accepts_guest_ids() {
        assert!(validate_user_id_safe_for_path("guest-user-1234").is_ok());
        assert!(validate_user_id_safe_for_path("user-app_1.2").is_ok());
    }

    #[test]
    fn user_id_rejects_path_injection() {
        for bad in ["", "  ", "../admin", "a/b", "user id", "utilisateur-é"] {
            let err = validate_user_id_safe_for_path(bad).expect_err("should reject");
            assert!(matches!(err, ReportError::InvalidConfig(_)));
        }
        let long = "a".repeat(129);
        assert!(validate_user_id_safe_for_path(&long).is_err());
    }
}
