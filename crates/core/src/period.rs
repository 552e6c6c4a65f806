//! Period resolution.
//!
//! A report covers a named span of calendar months anchored to a year. The resolver turns the
//! `(report type, period value)` pair chosen in the filter bar into the exact month set:
//!
//! - `monthly`: the value is the month itself, `YYYY-MM`
//! - `quarterly`, `semiannual`, `annual`: the value is `YYYY_<period id>`, e.g. `2025_Q1`,
//!   `2025_S2`, `2025_FULL`, and the id is looked up in that type's fixed table
//!
//! Quarters and semesters each partition the year without gap or overlap; the annual period
//! covers all twelve months.

use crate::{ReportError, ReportResult};
use chrono::Datelike;
use epi_types::MonthId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Granularity of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Monthly,
    Quarterly,
    Semiannual,
    Annual,
}

/// A named sub-period of a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodDefinition {
    pub id: &'static str,
    pub label: &'static str,
    pub months: &'static [u8],
}

const QUARTERS: [PeriodDefinition; 4] = [
    PeriodDefinition {
        id: "Q1",
        label: "Q1 (Jan-Mar)",
        months: &[1, 2, 3],
    },
    PeriodDefinition {
        id: "Q2",
        label: "Q2 (Apr-Jun)",
        months: &[4, 5, 6],
    },
    PeriodDefinition {
        id: "Q3",
        label: "Q3 (Jul-Sep)",
        months: &[7, 8, 9],
    },
    PeriodDefinition {
        id: "Q4",
        label: "Q4 (Oct-Dec)",
        months: &[10, 11, 12],
    },
];

const SEMESTERS: [PeriodDefinition; 2] = [
    PeriodDefinition {
        id: "S1",
        label: "S1 (Jan-Jun)",
        months: &[1, 2, 3, 4, 5, 6],
    },
    PeriodDefinition {
        id: "S2",
        label: "S2 (Jul-Dec)",
        months: &[7, 8, 9, 10, 11, 12],
    },
];

const FULL_YEAR: [PeriodDefinition; 1] = [PeriodDefinition {
    id: "FULL",
    label: "Full Year",
    months: &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12],
}];

impl ReportType {
    pub const ALL: [ReportType; 4] = [
        ReportType::Monthly,
        ReportType::Quarterly,
        ReportType::Semiannual,
        ReportType::Annual,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReportType::Monthly => "monthly",
            ReportType::Quarterly => "quarterly",
            ReportType::Semiannual => "semiannual",
            ReportType::Annual => "annual",
        }
    }

    /// The fixed sub-period table of this type. Monthly reports have none.
    pub fn definitions(self) -> &'static [PeriodDefinition] {
        match self {
            ReportType::Monthly => &[],
            ReportType::Quarterly => &QUARTERS,
            ReportType::Semiannual => &SEMESTERS,
            ReportType::Annual => &FULL_YEAR,
        }
    }

    pub fn find(self, period_id: &str) -> Option<&'static PeriodDefinition> {
        self.definitions().iter().find(|p| p.id == period_id)
    }

    /// Lists the selectable period values, newest first.
    ///
    /// Years run from `current_year` down to `first_year`; within a year monthly values run
    /// December to January and the other types follow their table order.
    pub fn period_catalogue(self, first_year: u16, current_year: u16) -> Vec<PeriodOption> {
        let mut options = Vec::new();

        for year in (first_year..=current_year).rev() {
            match self {
                ReportType::Monthly => {
                    for month in (1..=12u8).rev() {
                        let value = format!("{year:04}-{month:02}");
                        options.push(PeriodOption {
                            label: value.clone(),
                            value,
                        });
                    }
                }
                _ => {
                    for definition in self.definitions() {
                        options.push(PeriodOption {
                            value: format!("{year:04}_{}", definition.id),
                            label: format!("{year:04} - {}", definition.label),
                        });
                    }
                }
            }
        }

        options
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                ReportError::Validation(format!(
                    "unknown report type '{s}' (expected monthly, quarterly, semiannual or annual)"
                ))
            })
    }
}

/// One entry of a period picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodOption {
    pub value: String,
    pub label: String,
}

/// The months a period value spans.
///
/// An empty month list means the period value did not resolve; there is nothing to aggregate
/// and no report should be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPeriod {
    pub months: Vec<MonthId>,
    pub year: String,
}

impl ResolvedPeriod {
    fn unresolved(year: &str) -> Self {
        Self {
            months: Vec::new(),
            year: year.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }
}

/// Resolves a period value to its ordered month list.
///
/// Never fails: an unknown period id or an unparseable year/month yields an empty month list.
pub fn resolve_months(report_type: ReportType, period_value: &str) -> ResolvedPeriod {
    match report_type {
        ReportType::Monthly => match period_value.parse::<MonthId>() {
            Ok(month) => ResolvedPeriod {
                months: vec![month],
                year: format!("{:04}", month.year()),
            },
            Err(_) => ResolvedPeriod::unresolved(period_value.get(..4).unwrap_or_default()),
        },
        _ => {
            let Some((year, period_id)) = period_value.split_once('_') else {
                return ResolvedPeriod::unresolved("");
            };

            let Some(definition) = report_type.find(period_id) else {
                return ResolvedPeriod::unresolved(year);
            };

            if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
                return ResolvedPeriod::unresolved(year);
            }
            let Ok(year_number) = year.parse::<u16>() else {
                return ResolvedPeriod::unresolved(year);
            };

            let months: Option<Vec<MonthId>> = definition
                .months
                .iter()
                .map(|&m| MonthId::new(year_number, m).ok())
                .collect();

            match months {
                Some(months) => ResolvedPeriod {
                    months,
                    year: year.to_string(),
                },
                None => ResolvedPeriod::unresolved(year),
            }
        }
    }
}

/// Resolves a period value, reporting an unresolvable value as `ReportError::EmptyPeriod`.
pub fn try_resolve_months(
    report_type: ReportType,
    period_value: &str,
) -> ReportResult<ResolvedPeriod> {
    let resolved = resolve_months(report_type, period_value);
    if resolved.is_empty() {
        tracing::debug!(%report_type, period_value, "period did not resolve");
        return Err(ReportError::EmptyPeriod(period_value.to_string()));
    }
    Ok(resolved)
}

/// The current calendar year (UTC), used as the newest catalogue year.
pub fn current_year() -> u16 {
    u16::try_from(chrono::Utc::now().year()).unwrap_or(u16::MAX)
}
