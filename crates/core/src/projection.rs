//! Dimension filter.
//!
//! Projects an [`AggregationResult`] onto the locations and age intervals a reader asked to see.
//! Rows follow the requested location order and columns the requested interval order;
//! duplicates are dropped, keeping the first occurrence.

use crate::aggregate::AggregationResult;
use epi_types::{AgeInterval, CountKey, LocationId, Sex};
use serde::Serialize;
use std::collections::HashSet;

/// Male and female counts of one cell or column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SexCounts {
    #[serde(rename = "M")]
    pub m: u64,
    #[serde(rename = "F")]
    pub f: u64,
}

impl SexCounts {
    pub fn get(&self, sex: Sex) -> u64 {
        match sex {
            Sex::M => self.m,
            Sex::F => self.f,
        }
    }

    pub fn total(&self) -> u64 {
        self.m.saturating_add(self.f)
    }
}

/// One location's row of the filtered matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatrixRow {
    pub location: LocationId,
    /// One cell per selected interval, in column order.
    pub cells: Vec<SexCounts>,
}

/// The selected sub-matrix of an aggregation.
///
/// A matrix with no rows or no columns is explicitly empty; totals over it are zero and no
/// table should be rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilteredMatrix {
    intervals: Vec<AgeInterval>,
    rows: Vec<MatrixRow>,
}

impl FilteredMatrix {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.intervals.is_empty()
    }

    pub fn intervals(&self) -> &[AgeInterval] {
        &self.intervals
    }

    pub fn rows(&self) -> &[MatrixRow] {
        &self.rows
    }

    /// The count at (location, interval, sex); anything outside the matrix reads as zero.
    pub fn cell(&self, location: &LocationId, interval: AgeInterval, sex: Sex) -> u64 {
        let Some(column) = self.intervals.iter().position(|i| *i == interval) else {
            return 0;
        };
        self.rows
            .iter()
            .find(|row| &row.location == location)
            .map_or(0, |row| row.cells[column].get(sex))
    }
}

fn dedup_in_order<T: Clone + Eq + std::hash::Hash>(items: &[T]) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| seen.insert((*item).clone()))
        .cloned()
        .collect()
}

/// Selects the requested rows and columns of `aggregation`.
///
/// Locations absent from the aggregation still get a row, filled with zeros. An empty
/// location or interval selection yields [`FilteredMatrix::empty`].
pub fn project(
    aggregation: &AggregationResult,
    locations: &[LocationId],
    intervals: &[AgeInterval],
) -> FilteredMatrix {
    if locations.is_empty() || intervals.is_empty() {
        return FilteredMatrix::empty();
    }

    let intervals = dedup_in_order(intervals);
    let rows = dedup_in_order(locations)
        .into_iter()
        .map(|location| {
            let cells = intervals
                .iter()
                .map(|&interval| SexCounts {
                    m: aggregation.count(&location, CountKey::new(Sex::M, interval)),
                    f: aggregation.count(&location, CountKey::new(Sex::F, interval)),
                })
                .collect();
            MatrixRow { location, cells }
        })
        .collect();

    FilteredMatrix { intervals, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocationCounts;
    use std::collections::BTreeMap;

    fn loc(s: &str) -> LocationId {
        LocationId::parse(s).unwrap()
    }

    fn sample() -> AggregationResult {
        let mut a = LocationCounts::zeroed();
        a.set(CountKey::new(Sex::M, AgeInterval::Under1), 5);
        a.set(CountKey::new(Sex::F, AgeInterval::Under1), 3);
        a.set(CountKey::new(Sex::F, AgeInterval::From65), 9);
        let mut b = LocationCounts::zeroed();
        b.set(CountKey::new(Sex::M, AgeInterval::From20To44), 7);

        AggregationResult::from_counts(BTreeMap::from([(loc("LocA"), a), (loc("LocB"), b)]))
    }

    #[test]
    fn keeps_requested_order() {
        let matrix = project(
            &sample(),
            &[loc("LocB"), loc("LocA")],
            &[AgeInterval::From65, AgeInterval::Under1],
        );

        let order: Vec<_> = matrix.rows().iter().map(|r| r.location.as_str()).collect();
        assert_eq!(order, ["LocB", "LocA"]);
        assert_eq!(matrix.intervals(), [AgeInterval::From65, AgeInterval::Under1]);
        assert_eq!(matrix.rows()[1].cells[0], SexCounts { m: 0, f: 9 });
        assert_eq!(matrix.rows()[1].cells[1], SexCounts { m: 5, f: 3 });
    }

    #[test]
    fn drops_duplicate_selections() {
        let matrix = project(
            &sample(),
            &[loc("LocA"), loc("LocA")],
            &[AgeInterval::Under1, AgeInterval::Under1],
        );
        assert_eq!(matrix.rows().len(), 1);
        assert_eq!(matrix.intervals().len(), 1);
    }

    #[test]
    fn unknown_locations_read_as_zero() {
        let matrix = project(&sample(), &[loc("Elsewhere")], &[AgeInterval::Under1]);
        assert_eq!(matrix.rows().len(), 1);
        assert_eq!(matrix.cell(&loc("Elsewhere"), AgeInterval::Under1, Sex::M), 0);
    }

    #[test]
    fn empty_selection_is_explicitly_empty() {
        assert!(project(&sample(), &[], &AgeInterval::ALL).is_empty());
        assert!(project(&sample(), &[loc("LocA")], &[]).is_empty());
        assert_eq!(project(&sample(), &[loc("LocA")], &[]), FilteredMatrix::empty());
    }

    #[test]
    fn cell_lookup_outside_selection_is_zero() {
        let matrix = project(&sample(), &[loc("LocA")], &[AgeInterval::Under1]);
        assert_eq!(matrix.cell(&loc("LocA"), AgeInterval::Under1, Sex::F), 3);
        assert_eq!(matrix.cell(&loc("LocA"), AgeInterval::From65, Sex::F), 0);
        assert_eq!(matrix.cell(&loc("LocB"), AgeInterval::Under1, Sex::M), 0);
    }
}
