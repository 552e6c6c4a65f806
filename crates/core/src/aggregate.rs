//! Aggregation engine.
//!
//! Sums every monthly record whose month falls in the resolved period and whose disease is
//! selected, per location and per (sex, age interval) key. The result is seeded with a zeroed
//! entry for every requested location so consumers never need to handle a missing key.

use crate::constants::ALL_DISEASES;
use crate::store::{LocationCounts, MonthlyRecord};
use epi_types::{CountKey, DiseaseId, LocationId, MonthId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Which diseases a report covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiseaseSelection {
    /// Every disease, including ones no longer configured.
    All,
    /// Exactly the listed diseases. An empty set selects nothing.
    Only(BTreeSet<DiseaseId>),
}

impl DiseaseSelection {
    pub fn only(diseases: impl IntoIterator<Item = DiseaseId>) -> Self {
        DiseaseSelection::Only(diseases.into_iter().collect())
    }

    pub fn contains(&self, disease: &DiseaseId) -> bool {
        match self {
            DiseaseSelection::All => true,
            DiseaseSelection::Only(set) => set.contains(disease),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, DiseaseSelection::Only(set) if set.is_empty())
    }

    /// Title fragment: "All Diseases" or the selected disease labels.
    pub fn label(&self) -> String {
        match self {
            DiseaseSelection::All => "All Diseases".to_string(),
            DiseaseSelection::Only(set) => set
                .iter()
                .map(DiseaseId::label)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

// Wire form: the string "all" or an array of disease ids.
impl Serialize for DiseaseSelection {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            DiseaseSelection::All => serializer.serialize_str(ALL_DISEASES),
            DiseaseSelection::Only(set) => serializer.collect_seq(set),
        }
    }
}

impl<'de> Deserialize<'de> for DiseaseSelection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct Visitor;

        impl<'de> serde::de::Visitor<'de> for Visitor {
            type Value = DiseaseSelection;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "\"{ALL_DISEASES}\" or a list of disease ids")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if v == ALL_DISEASES {
                    Ok(DiseaseSelection::All)
                } else {
                    Err(E::invalid_value(serde::de::Unexpected::Str(v), &self))
                }
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut set = BTreeSet::new();
                while let Some(id) = seq.next_element::<DiseaseId>()? {
                    set.insert(id);
                }
                Ok(DiseaseSelection::Only(set))
            }
        }

        deserializer.deserialize_any(Visitor)
    }
}

/// Per-location sums over a period and disease selection.
///
/// Every requested location is present, with all sixteen keys, even when nothing matched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    locations: BTreeMap<LocationId, LocationCounts>,
    records_matched: usize,
}

impl AggregationResult {
    /// A zero-filled result covering `locations`.
    pub fn zeroed<'a>(locations: impl IntoIterator<Item = &'a LocationId>) -> Self {
        Self {
            locations: locations
                .into_iter()
                .map(|id| (id.clone(), LocationCounts::zeroed()))
                .collect(),
            records_matched: 0,
        }
    }

    /// Wraps per-location counts that were summed elsewhere (for example an entry grid).
    pub fn from_counts(locations: BTreeMap<LocationId, LocationCounts>) -> Self {
        Self {
            locations,
            records_matched: 0,
        }
    }

    pub fn get(&self, location: &LocationId) -> Option<&LocationCounts> {
        self.locations.get(location)
    }

    /// The count for one cell; locations outside the result read as zero.
    pub fn count(&self, location: &LocationId, key: CountKey) -> u64 {
        self.locations.get(location).map_or(0, |c| c.get(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LocationId, &LocationCounts)> {
        self.locations.iter()
    }

    pub fn location_count(&self) -> usize {
        self.locations.len()
    }

    /// Number of monthly records that contributed.
    pub fn records_matched(&self) -> usize {
        self.records_matched
    }

    pub fn grand_total(&self) -> u64 {
        self.locations
            .values()
            .map(LocationCounts::total)
            .fold(0, u64::saturating_add)
    }
}

/// Sums the matching records per location.
///
/// A record contributes when its month is in `months` and its disease is selected; within it,
/// only locations listed in `locations` are summed. The fold is pure addition, so the result
/// does not depend on record order, and inputs are never modified. Empty `months` or an empty
/// disease selection yield an all-zero result.
pub fn aggregate<'a>(
    records: impl IntoIterator<Item = &'a MonthlyRecord>,
    months: &BTreeSet<MonthId>,
    diseases: &DiseaseSelection,
    locations: &[LocationId],
) -> AggregationResult {
    let mut result = AggregationResult::zeroed(locations);

    for record in records {
        if !months.contains(&record.month_id) || !diseases.contains(&record.disease) {
            continue;
        }
        result.records_matched += 1;

        for (location, counts) in &record.data {
            if let Some(total) = result.locations.get_mut(location) {
                total.accumulate(counts);
            }
        }
    }

    tracing::debug!(
        months = months.len(),
        locations = locations.len(),
        records_matched = result.records_matched,
        "aggregated monthly records"
    );

    result
}
