//! Report generation.
//!
//! A [`ReportingContext`] pairs one registry snapshot with one record-store snapshot. Both are
//! shared immutably; a configuration change or a completed fetch produces a new context rather
//! than editing the current one, so a report is always computed against a single consistent
//! view.

use crate::aggregate::{aggregate, AggregationResult, DiseaseSelection};
use crate::charts::{chart_series, ChartSeries};
use crate::error::FilterDimension;
use crate::period::{try_resolve_months, ReportType};
use crate::projection::{project, FilteredMatrix};
use crate::registry::Registry;
use crate::store::RecordStore;
use crate::totals::{compute_totals, Totals};
use crate::{ReportError, ReportResult};
use epi_types::{AgeInterval, LocationId, MonthId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

fn all_diseases() -> DiseaseSelection {
    DiseaseSelection::All
}

/// What a reader asked to see.
///
/// `locations` and `intervals` default to every configured location and every age interval;
/// an explicitly empty list is an empty selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub report_type: ReportType,
    pub period_value: String,
    #[serde(default = "all_diseases")]
    pub diseases: DiseaseSelection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<LocationId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intervals: Option<Vec<AgeInterval>>,
}

impl ReportRequest {
    /// A request for every disease, location and interval over one period.
    pub fn new(report_type: ReportType, period_value: impl Into<String>) -> Self {
        Self {
            report_type,
            period_value: period_value.into(),
            diseases: DiseaseSelection::All,
            locations: None,
            intervals: None,
        }
    }

    pub fn with_diseases(mut self, diseases: DiseaseSelection) -> Self {
        self.diseases = diseases;
        self
    }

    pub fn with_locations(mut self, locations: Vec<LocationId>) -> Self {
        self.locations = Some(locations);
        self
    }

    pub fn with_intervals(mut self, intervals: Vec<AgeInterval>) -> Self {
        self.intervals = Some(intervals);
        self
    }

    /// Heading shown above the report, e.g. "All Diseases Report for 2025 - Q1".
    pub fn title(&self) -> String {
        format!(
            "{} Report for {}",
            self.diseases.label(),
            self.period_value.replace('_', " - ")
        )
    }
}

/// A computed report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub title: String,
    pub report_type: ReportType,
    pub period_value: String,
    pub year: String,
    pub months: Vec<MonthId>,
    pub aggregation: AggregationResult,
    pub matrix: FilteredMatrix,
    pub totals: Totals,
    pub charts: ChartSeries,
}

#[derive(Debug, Clone, Default)]
pub struct ReportingContext {
    registry: Arc<Registry>,
    store: Arc<RecordStore>,
}

impl ReportingContext {
    pub fn new(registry: Arc<Registry>, store: Arc<RecordStore>) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    /// A context using `registry` and the current store.
    pub fn with_registry(&self, registry: Arc<Registry>) -> Self {
        Self {
            registry,
            store: Arc::clone(&self.store),
        }
    }

    /// A context using `store` and the current registry.
    pub fn with_store(&self, store: Arc<RecordStore>) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            store,
        }
    }

    /// Computes a report.
    ///
    /// # Errors
    ///
    /// - `ReportError::NoLocations` if the registry has no locations
    /// - `ReportError::EmptyPeriod` if the period value does not resolve
    /// - `ReportError::EmptyFilter` if the disease, location or interval selection is empty
    pub fn run(&self, request: &ReportRequest) -> ReportResult<Report> {
        if self.registry.locations().is_empty() {
            return Err(ReportError::NoLocations);
        }

        let period = try_resolve_months(request.report_type, &request.period_value)?;

        if request.diseases.is_empty() {
            return Err(ReportError::EmptyFilter(FilterDimension::Disease));
        }
        let universe = self.registry.location_ids();
        let locations = request.locations.as_deref().unwrap_or(&universe);
        if locations.is_empty() {
            return Err(ReportError::EmptyFilter(FilterDimension::Location));
        }
        let intervals = request.intervals.as_deref().unwrap_or(&AgeInterval::ALL);
        if intervals.is_empty() {
            return Err(ReportError::EmptyFilter(FilterDimension::AgeInterval));
        }

        let months: BTreeSet<MonthId> = period.months.iter().copied().collect();
        let aggregation = aggregate(self.store.records(), &months, &request.diseases, &universe);
        let matrix = project(&aggregation, locations, intervals);
        let totals = compute_totals(&matrix);
        let charts = chart_series(&matrix, &self.registry);

        tracing::info!(
            report_type = %request.report_type,
            period = %request.period_value,
            records = aggregation.records_matched(),
            total = totals.grand.total,
            "report generated"
        );

        Ok(Report {
            title: request.title(),
            report_type: request.report_type,
            period_value: request.period_value.clone(),
            year: period.year,
            months: period.months,
            aggregation,
            matrix,
            totals,
            charts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epi_types::{CountKey, DiseaseId, Sex};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn store() -> RecordStore {
        RecordStore::from_backend(BTreeMap::from([
            (
                "report_Flu_2025-01".to_string(),
                json!({
                    "monthId": "2025-01",
                    "disease": "Flu",
                    "reporterId": "guest-user-1234",
                    "data": {"EPSP_Bab_El_Oued": {"M_0_1": 5, "F_0_1": 3}},
                }),
            ),
            (
                "report_Flu_2025-02".to_string(),
                json!({
                    "monthId": "2025-02",
                    "disease": "Flu",
                    "data": {"EPSP_Bab_El_Oued": {"M_0_1": 2}, "EPSP_Casbah": {"F_65_plus": 1}},
                }),
            ),
            (
                "report_Measles_2025-02".to_string(),
                json!({
                    "monthId": "2025-02",
                    "disease": "Measles",
                    "data": {"EPSP_Casbah": {"M_5_9": 4}},
                }),
            ),
        ]))
    }

    fn context() -> ReportingContext {
        let registry =
            Registry::from_parts(["Flu", "Measles"], ["EPSP: Bab El Oued", "EPSP: Casbah"])
                .unwrap();
        ReportingContext::new(Arc::new(registry), Arc::new(store()))
    }

    fn loc(s: &str) -> LocationId {
        LocationId::parse(s).unwrap()
    }

    #[test]
    fn quarterly_report_for_one_disease() {
        let request = ReportRequest::new(ReportType::Quarterly, "2025_Q1")
            .with_diseases(DiseaseSelection::only([DiseaseId::parse("Flu").unwrap()]));
        let report = context().run(&request).unwrap();

        assert_eq!(report.title, "Flu Report for 2025 - Q1");
        assert_eq!(report.year, "2025");
        assert_eq!(report.months.len(), 3);
        assert_eq!(
            report
                .aggregation
                .count(&loc("EPSP_Bab_El_Oued"), CountKey::new(Sex::M, AgeInterval::Under1)),
            7
        );
        assert_eq!(report.totals.grand.total, 11);
        assert_eq!(report.totals.per_location[&loc("EPSP_Casbah")].total, 1);
    }

    #[test]
    fn all_diseases_title_and_totals() {
        let report = context()
            .run(&ReportRequest::new(ReportType::Monthly, "2025-02"))
            .unwrap();
        assert_eq!(report.title, "All Diseases Report for 2025-02");
        assert_eq!(report.totals.grand.total, 7);
        assert_eq!(report.charts.locations.len(), 2);
    }

    #[test]
    fn no_locations_is_reported_first() {
        let ctx = context().with_registry(Arc::new(Registry::new()));
        let err = ctx
            .run(&ReportRequest::new(ReportType::Quarterly, "2025_Q9"))
            .expect_err("no locations");
        assert!(matches!(err, ReportError::NoLocations));
    }

    #[test]
    fn unresolvable_period_is_rejected() {
        let err = context()
            .run(&ReportRequest::new(ReportType::Quarterly, "2025_Q5"))
            .expect_err("bad period");
        assert!(matches!(err, ReportError::EmptyPeriod(_)));
    }

    #[test]
    fn empty_selections_are_rejected() {
        let ctx = context();
        let base = ReportRequest::new(ReportType::Annual, "2025_FULL");

        let err = ctx
            .run(&base.clone().with_diseases(DiseaseSelection::Only(BTreeSet::new())))
            .expect_err("no disease");
        assert!(matches!(err, ReportError::EmptyFilter(FilterDimension::Disease)));

        let err = ctx
            .run(&base.clone().with_locations(Vec::new()))
            .expect_err("no location");
        assert!(matches!(err, ReportError::EmptyFilter(FilterDimension::Location)));

        let err = ctx
            .run(&base.with_intervals(Vec::new()))
            .expect_err("no interval");
        assert!(matches!(err, ReportError::EmptyFilter(FilterDimension::AgeInterval)));
    }

    #[test]
    fn selection_narrows_matrix_and_totals() {
        let request = ReportRequest::new(ReportType::Semiannual, "2025_S1")
            .with_locations(vec![loc("EPSP_Casbah")])
            .with_intervals(vec![AgeInterval::From5To9]);
        let report = context().run(&request).unwrap();

        assert_eq!(report.matrix.rows().len(), 1);
        assert_eq!(report.totals.grand.total, 4);
        // the aggregation still covers every configured location
        assert_eq!(report.aggregation.location_count(), 2);
    }

    #[test]
    fn swapping_store_changes_results() {
        let ctx = context();
        let request = ReportRequest::new(ReportType::Annual, "2025_FULL");
        let before = ctx.run(&request).unwrap();

        let emptied = ctx.with_store(Arc::new(RecordStore::empty()));
        let after = emptied.run(&request).unwrap();

        assert_eq!(before.totals.grand.total, 15);
        assert_eq!(after.totals.grand.total, 0);
        assert!(after.charts.is_empty());
        assert_eq!(ctx.run(&request).unwrap(), before);
    }

    #[test]
    fn request_wire_form_defaults() {
        let request: ReportRequest = serde_json::from_value(json!({
            "reportType": "quarterly",
            "periodValue": "2025_Q1",
        }))
        .unwrap();
        assert_eq!(request, ReportRequest::new(ReportType::Quarterly, "2025_Q1"));

        let request: ReportRequest = serde_json::from_value(json!({
            "reportType": "monthly",
            "periodValue": "2025-01",
            "diseases": ["Flu"],
            "locations": ["EPSP_Casbah"],
            "intervals": ["0_1", "65_plus"],
        }))
        .unwrap();
        assert_eq!(request.intervals.unwrap().len(), 2);
    }
}
