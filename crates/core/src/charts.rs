//! Chart series derived from a filtered matrix.
//!
//! Two series back the report charts: the share of cases per location (a donut chart) and the
//! male/female counts per age interval (a stacked bar chart). Rendering is left to the client.

use crate::projection::FilteredMatrix;
use crate::registry::Registry;
use epi_types::{AgeInterval, LocationId};
use serde::Serialize;

/// One slice of the location distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationSlice {
    pub location: LocationId,
    /// Commune part of the display name, or the id if the location is no longer configured.
    pub label: String,
    pub total: u64,
    /// Fraction of the grand total, in `[0, 1]`.
    pub share: f64,
}

/// One bar of the age and sex distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgeSexBar {
    pub interval: AgeInterval,
    pub label: &'static str,
    #[serde(rename = "M")]
    pub m: u64,
    #[serde(rename = "F")]
    pub f: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub grand_total: u64,
    /// Locations with at least one case, in row order.
    pub locations: Vec<LocationSlice>,
    /// Every selected interval, in column order.
    pub age_sex: Vec<AgeSexBar>,
}

impl ChartSeries {
    /// True when there is nothing to plot; the client shows a "no data" placeholder instead.
    pub fn is_empty(&self) -> bool {
        self.grand_total == 0
    }
}

pub fn location_distribution(matrix: &FilteredMatrix, registry: &Registry) -> Vec<LocationSlice> {
    let totals: Vec<(&LocationId, u64)> = matrix
        .rows()
        .iter()
        .map(|row| {
            let total = row.cells.iter().fold(0, |acc: u64, c| acc.saturating_add(c.total()));
            (&row.location, total)
        })
        .collect();
    let grand = totals.iter().fold(0, |acc: u64, (_, t)| acc.saturating_add(*t));

    totals
        .into_iter()
        .filter(|(_, total)| *total > 0)
        .map(|(location, total)| LocationSlice {
            location: location.clone(),
            label: registry
                .commune(location)
                .map_or_else(|| location.to_string(), str::to_string),
            total,
            share: total as f64 / grand as f64,
        })
        .collect()
}

pub fn age_sex_distribution(matrix: &FilteredMatrix) -> Vec<AgeSexBar> {
    matrix
        .intervals()
        .iter()
        .enumerate()
        .map(|(column, &interval)| {
            let (m, f) = matrix.rows().iter().fold((0u64, 0u64), |(m, f), row| {
                let cell = row.cells[column];
                (m.saturating_add(cell.m), f.saturating_add(cell.f))
            });
            AgeSexBar {
                interval,
                label: interval.label(),
                m,
                f,
            }
        })
        .collect()
}

pub fn chart_series(matrix: &FilteredMatrix, registry: &Registry) -> ChartSeries {
    let age_sex = age_sex_distribution(matrix);
    ChartSeries {
        grand_total: age_sex
            .iter()
            .fold(0u64, |acc, bar| acc.saturating_add(bar.m).saturating_add(bar.f)),
        locations: location_distribution(matrix, registry),
        age_sex,
    }
}
