//! # Epi Core
//!
//! Core reporting logic for the disease surveillance dashboard.
//!
//! This crate contains pure data operations over monthly case reports:
//! - Period resolution (monthly, quarterly, semiannual and annual reports)
//! - The in-memory record store with lenient count decoding and last-write-wins refresh
//! - Aggregation, dimension filtering and totals
//! - The disease and location registry
//! - Chart series and the data-entry grid
//!
//! **No API concerns**: HTTP servers, backend clients, or CLI parsing belong in `api-rest`,
//! `api-client`, or `epi-cli`.

pub mod aggregate;
pub mod charts;
pub mod config;
pub mod constants;
pub mod context;
pub mod entry;
pub mod error;
pub mod period;
pub mod projection;
pub mod registry;
pub mod snapshot;
pub mod store;
pub mod totals;
pub mod validation;

pub use aggregate::{aggregate, AggregationResult, DiseaseSelection};
pub use charts::{chart_series, AgeSexBar, ChartSeries, LocationSlice};
pub use config::CoreConfig;
pub use context::{Report, ReportRequest, ReportingContext};
pub use entry::EntryGrid;
pub use error::{FilterDimension, ReportError, ReportResult};
pub use period::{resolve_months, try_resolve_months, PeriodOption, ReportType, ResolvedPeriod};
pub use projection::{project, FilteredMatrix, MatrixRow, SexCounts};
pub use registry::{LocationEntry, Registry, RegistryConfig};
pub use store::{
    coerce_count, FetchOutcome, FetchTicket, LocationCounts, MonthlyRecord, RecordStore,
    StoreHandle,
};
pub use totals::{compute_totals, SexTotals, Totals};

pub use epi_types::{
    canonical_disease_id, canonical_location_id, AgeInterval, CountKey, DiseaseId, LocationId,
    MonthId, NonEmptyText, Sex, TypeError,
};
