//! Validated primitive types shared across the surveillance workspace.
//!
//! Everything in here is a small value type that guarantees its own invariants once
//! constructed:
//! - [`NonEmptyText`] for free-text configuration entries
//! - [`Sex`], [`AgeInterval`] and the composite [`CountKey`] that address one case-count cell
//! - [`MonthId`] for `YYYY-MM` calendar months
//! - [`DiseaseId`] and [`LocationId`] derived from display names by canonicalisation
//!
//! The wire form of each type (its `Display`/`FromStr` and serde representation) matches what
//! the report backend stores, so values round-trip through JSON unchanged.

/// Implements string-based serde for a type with `Display` and `FromStr<Err = TypeError>`.
///
/// String serialisation keeps these types usable as JSON object keys.
macro_rules! string_serde {
    ($ty:ty, $expecting:literal) => {
        impl serde::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.collect_str(self)
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                struct Visitor;

                impl serde::de::Visitor<'_> for Visitor {
                    type Value = $ty;

                    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                        f.write_str($expecting)
                    }

                    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
                    where
                        E: serde::de::Error,
                    {
                        v.parse().map_err(E::custom)
                    }
                }

                deserializer.deserialize_str(Visitor)
            }
        }
    };
}

pub(crate) use string_serde;

mod demography;
mod ids;
mod month;
mod text;

pub use demography::{AgeInterval, CountKey, Sex};
pub use ids::{canonical_disease_id, canonical_location_id, DiseaseId, LocationId};
pub use month::MonthId;
pub use text::NonEmptyText;

/// Errors that can occur when constructing validated types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The input is not a `YYYY-MM` month
    #[error("invalid month id '{0}': expected YYYY-MM")]
    InvalidMonthId(String),
    /// The input is not `M` or `F`
    #[error("invalid sex '{0}': expected M or F")]
    InvalidSex(String),
    /// The input is not one of the configured age intervals
    #[error("invalid age interval '{0}'")]
    InvalidAgeInterval(String),
    /// The input is not a `{sex}_{interval}` key
    #[error("invalid count key '{0}'")]
    InvalidCountKey(String),
    /// The input canonicalises to nothing
    #[error("'{0}' does not contain any identifier characters")]
    EmptyIdentifier(String),
    /// The input is not an already-canonical identifier
    #[error("'{0}' is not a canonical identifier")]
    NonCanonicalIdentifier(String),
}

/// Result type for type construction.
pub type TypeResult<T> = Result<T, TypeError>;
