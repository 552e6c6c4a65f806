//! Disease and location identifiers.
//!
//! Both identifiers are derived from free-text display names. The derivation rules are part of
//! the stored data format: report payloads key their counts by [`LocationId`] and carry a
//! [`DiseaseId`], so the same rule must be applied on the data-entry and reporting paths.

use crate::{TypeError, TypeResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Derives a location id from a display name.
///
/// Every maximal run of characters outside `[A-Za-z0-9]` becomes a single `_`, and leading or
/// trailing separators are dropped: `"EPSP: Bab El Oued"` becomes `EPSP_Bab_El_Oued`.
pub fn canonical_location_id(display_name: &str) -> String {
    let mut out = String::with_capacity(display_name.len());
    let mut pending_separator = false;

    for c in display_name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.push(c);
        } else {
            pending_separator = true;
        }
    }

    out
}

/// Derives a disease id from a display name.
///
/// Characters outside `[A-Za-z0-9]` and whitespace are removed, then whitespace runs collapse to
/// a single `_`: `"Covid-19 (severe)"` becomes `Covid19_severe`.
pub fn canonical_disease_id(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();

    kept.split_whitespace().collect::<Vec<_>>().join("_")
}

fn is_canonical(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Identifier of a configured disease.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiseaseId(String);

impl DiseaseId {
    /// Derives the id for a free-text disease name.
    ///
    /// # Errors
    ///
    /// Returns [`TypeError::EmptyIdentifier`] if nothing survives canonicalisation.
    pub fn from_name(name: &str) -> TypeResult<Self> {
        let id = canonical_disease_id(name);
        if id.is_empty() {
            return Err(TypeError::EmptyIdentifier(name.to_string()));
        }
        Ok(Self(id))
    }

    /// Accepts an id that is already in canonical form (for example from a URL path).
    pub fn parse(id: &str) -> TypeResult<Self> {
        if is_canonical(id) {
            return Ok(Self(id.to_string()));
        }
        Err(TypeError::NonCanonicalIdentifier(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-readable form: underscores shown as spaces.
    pub fn label(&self) -> String {
        self.0.replace('_', " ")
    }
}

impl fmt::Display for DiseaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DiseaseId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifier of a configured location (a facility and commune pair).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(String);

impl LocationId {
    /// Derives the id for a location display name.
    ///
    /// # Errors
    ///
    /// Returns [`TypeError::EmptyIdentifier`] if nothing survives canonicalisation.
    pub fn from_display_name(display_name: &str) -> TypeResult<Self> {
        let id = canonical_location_id(display_name);
        if id.is_empty() {
            return Err(TypeError::EmptyIdentifier(display_name.to_string()));
        }
        Ok(Self(id))
    }

    /// Accepts an id that is already in canonical form (for example from a URL path).
    pub fn parse(id: &str) -> TypeResult<Self> {
        if is_canonical(id) {
            return Ok(Self(id.to_string()));
        }
        Err(TypeError::NonCanonicalIdentifier(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LocationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
