//! Data-entry grid.
//!
//! An editable matrix of counts for one disease and month, with a row for every configured
//! location. Saved reports are loaded into it for correction and it produces the record that
//! is submitted back to the backend.

use crate::aggregate::AggregationResult;
use crate::projection::{project, FilteredMatrix};
use crate::registry::Registry;
use crate::store::{LocationCounts, MonthlyRecord};
use crate::totals::{compute_totals, Totals};
use crate::{ReportError, ReportResult};
use epi_types::{AgeInterval, CountKey, DiseaseId, LocationId, MonthId};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryGrid {
    order: Vec<LocationId>,
    counts: BTreeMap<LocationId, LocationCounts>,
}

impl EntryGrid {
    /// A zeroed grid with one row per registry location.
    pub fn new(registry: &Registry) -> Self {
        let order = registry.location_ids();
        let counts = order
            .iter()
            .map(|id| (id.clone(), LocationCounts::zeroed()))
            .collect();
        Self { order, counts }
    }

    /// Sets one cell.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Validation` if the location has no row in this grid.
    pub fn set(&mut self, location: &LocationId, key: CountKey, value: u64) -> ReportResult<()> {
        let row = self
            .counts
            .get_mut(location)
            .ok_or_else(|| ReportError::Validation(format!("unknown location '{location}'")))?;
        row.set(key, value);
        Ok(())
    }

    pub fn get(&self, location: &LocationId, key: CountKey) -> u64 {
        self.counts.get(location).map_or(0, |row| row.get(key))
    }

    /// Replaces the grid contents with saved counts.
    ///
    /// Rows for configured locations missing from `saved` are reset to zero; saved locations
    /// that are no longer configured are ignored.
    pub fn load(&mut self, saved: &BTreeMap<LocationId, LocationCounts>) {
        for (location, row) in self.counts.iter_mut() {
            *row = saved.get(location).copied().unwrap_or_default();
        }
    }

    pub fn clear(&mut self) {
        for row in self.counts.values_mut() {
            *row = LocationCounts::zeroed();
        }
    }

    /// The grid as a matrix over every row and every age interval.
    pub fn matrix(&self) -> FilteredMatrix {
        project(
            &AggregationResult::from_counts(self.counts.clone()),
            &self.order,
            &AgeInterval::ALL,
        )
    }

    pub fn totals(&self) -> Totals {
        compute_totals(&self.matrix())
    }

    /// Builds the record to submit. Rows whose counts are all zero are left out.
    pub fn into_submission(
        self,
        month_id: MonthId,
        disease: DiseaseId,
        reporter_id: impl Into<String>,
    ) -> MonthlyRecord {
        MonthlyRecord {
            month_id,
            disease,
            reporter_id: reporter_id.into(),
            data: self
                .counts
                .into_iter()
                .filter(|(_, row)| !row.is_zero())
                .collect(),
        }
    }
}
