//! Row, column and grand totals of a filtered matrix.

use crate::projection::{FilteredMatrix, SexCounts};
use epi_types::{AgeInterval, LocationId};
use serde::Serialize;
use std::collections::BTreeMap;

/// Male, female and combined totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SexTotals {
    #[serde(rename = "M")]
    pub m: u64,
    #[serde(rename = "F")]
    pub f: u64,
    pub total: u64,
}

impl SexTotals {
    fn add(&mut self, cell: SexCounts) {
        self.m = self.m.saturating_add(cell.m);
        self.f = self.f.saturating_add(cell.f);
        self.total = self.total.saturating_add(cell.total());
    }
}

/// Totals over the selected cells only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub per_location: BTreeMap<LocationId, SexTotals>,
    pub per_column: BTreeMap<AgeInterval, SexCounts>,
    pub grand: SexTotals,
}

/// Sums `matrix` by row, by column and overall.
///
/// For any matrix, the grand total equals both the sum of row totals and the sum of column
/// totals, and every row total is its male count plus its female count. An empty matrix gives
/// all-zero totals.
pub fn compute_totals(matrix: &FilteredMatrix) -> Totals {
    let mut totals = Totals::default();
    if matrix.is_empty() {
        return totals;
    }

    for &interval in matrix.intervals() {
        totals.per_column.insert(interval, SexCounts::default());
    }

    for row in matrix.rows() {
        let row_total = totals.per_location.entry(row.location.clone()).or_default();
        for (interval, cell) in matrix.intervals().iter().zip(&row.cells) {
            row_total.add(*cell);
            if let Some(column) = totals.per_column.get_mut(interval) {
                column.m = column.m.saturating_add(cell.m);
                column.f = column.f.saturating_add(cell.f);
            }
            totals.grand.add(*cell);
        }
    }

    totals
}
