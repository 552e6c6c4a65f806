//! Monthly record store.
//!
//! The store is the in-memory collection of submitted monthly reports, fetched wholesale from
//! the backend. It is never edited in place: each successful fetch builds a new
//! [`RecordStore`] and [`StoreHandle`] swaps it in, so an aggregation holding the previous
//! snapshot keeps a consistent view.
//!
//! Counts are hand-entered upstream, so decoding is lenient. Any count that is missing,
//! negative or non-numeric is read as zero rather than rejected, and records with an
//! unreadable month are skipped.

use crate::constants::MAX_COUNT;
use epi_types::{CountKey, DiseaseId, LocationId, MonthId, Sex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Coerces one raw count value to a non-negative integer.
///
/// Non-negative integers pass through; non-negative finite floats truncate toward zero;
/// strings holding such a number are parsed. Everything else (negative numbers, `"abc"`,
/// `"n/a"`, `null`, booleans, arrays, objects, values above [`MAX_COUNT`]) counts as zero.
pub fn coerce_count(value: &serde_json::Value) -> u64 {
    fn from_f64(f: f64) -> u64 {
        if f.is_finite() && f >= 0.0 && f < (MAX_COUNT as f64 + 1.0) {
            f.trunc() as u64
        } else {
            0
        }
    }

    let count = match value {
        serde_json::Value::Number(n) => match n.as_u64() {
            Some(u) => u,
            None if n.is_i64() => 0,
            None => n.as_f64().map(from_f64).unwrap_or(0),
        },
        serde_json::Value::String(s) => {
            let s = s.trim();
            match s.parse::<u64>() {
                Ok(u) => u,
                Err(_) => s.parse::<f64>().map(from_f64).unwrap_or(0),
            }
        }
        _ => 0,
    };

    if count > MAX_COUNT { 0 } else { count }
}

/// The sixteen counts of one location: one per (sex, age interval) key.
///
/// Every key is always present; an absent key reads as zero.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LocationCounts {
    counts: [u64; CountKey::COUNT],
}

impl LocationCounts {
    pub fn zeroed() -> Self {
        Self::default()
    }

    pub fn get(&self, key: CountKey) -> u64 {
        self.counts[key.index()]
    }

    pub fn set(&mut self, key: CountKey, value: u64) {
        self.counts[key.index()] = value;
    }

    pub fn add(&mut self, key: CountKey, value: u64) {
        let slot = &mut self.counts[key.index()];
        *slot = slot.saturating_add(value);
    }

    /// Adds every count of `other` into `self`.
    pub fn accumulate(&mut self, other: &LocationCounts) {
        for (total, value) in self.counts.iter_mut().zip(other.counts.iter()) {
            *total = total.saturating_add(*value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (CountKey, u64)> + '_ {
        CountKey::all().map(move |key| (key, self.get(key)))
    }

    pub fn sex_total(&self, sex: Sex) -> u64 {
        self.iter()
            .filter(|(key, _)| key.sex == sex)
            .map(|(_, v)| v)
            .fold(0, u64::saturating_add)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().fold(0u64, |acc, &c| acc.saturating_add(c))
    }

    pub fn is_zero(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }
}

impl fmt::Debug for LocationCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().filter(|(_, v)| *v != 0).map(|(k, v)| (k.to_string(), v)))
            .finish()
    }
}

impl FromIterator<(CountKey, u64)> for LocationCounts {
    fn from_iter<I: IntoIterator<Item = (CountKey, u64)>>(iter: I) -> Self {
        let mut counts = LocationCounts::zeroed();
        for (key, value) in iter {
            counts.add(key, value);
        }
        counts
    }
}

impl Serialize for LocationCounts {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_map(self.iter())
    }
}

impl<'de> Deserialize<'de> for LocationCounts {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Object(raw) => raw,
            other => {
                tracing::debug!(value = %other, "location counts are not an object, reading as zero");
                return Ok(LocationCounts::zeroed());
            }
        };
        let mut counts = LocationCounts::zeroed();
        for (key, value) in &raw {
            match key.parse::<CountKey>() {
                Ok(key) => counts.set(key, coerce_count(value)),
                Err(_) => tracing::trace!(key = %key, "ignoring unknown count key"),
            }
        }
        Ok(counts)
    }
}

/// One submitted report: a disease's counts for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRecord {
    pub month_id: MonthId,
    pub disease: DiseaseId,
    #[serde(default)]
    pub reporter_id: String,
    #[serde(default)]
    pub data: BTreeMap<LocationId, LocationCounts>,
}

impl MonthlyRecord {
    /// Decodes a backend record, logging and discarding it if it is unreadable.
    pub fn from_value(report_key: &str, value: serde_json::Value) -> Option<Self> {
        match serde_json::from_value::<MonthlyRecord>(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(report_key, error = %e, "skipping unreadable monthly record");
                None
            }
        }
    }
}

/// An immutable snapshot of every monthly record.
///
/// At most one record exists per (disease, month); when constructed from several candidates
/// the later one replaces the earlier, matching the backend's upsert on save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStore {
    records: Vec<MonthlyRecord>,
}

impl RecordStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a store, keeping only the last record for each (disease, month).
    pub fn new(records: impl IntoIterator<Item = MonthlyRecord>) -> Self {
        let mut latest: BTreeMap<(DiseaseId, MonthId), MonthlyRecord> = BTreeMap::new();
        for record in records {
            latest.insert((record.disease.clone(), record.month_id), record);
        }
        Self {
            records: latest.into_values().collect(),
        }
    }

    /// Builds a store from the backend's `reportKey -> record` mapping.
    ///
    /// Records are taken in report-key order, so for duplicate (disease, month) pairs the
    /// greatest key wins. Unreadable records are skipped.
    pub fn from_backend(reports: BTreeMap<String, serde_json::Value>) -> Self {
        let total = reports.len();
        let store = Self::new(
            reports
                .into_iter()
                .filter_map(|(key, value)| MonthlyRecord::from_value(&key, value)),
        );
        if store.len() != total {
            tracing::debug!(
                received = total,
                kept = store.len(),
                "dropped unreadable or superseded records"
            );
        }
        store
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[MonthlyRecord] {
        &self.records
    }

    pub fn get(&self, disease: &DiseaseId, month: MonthId) -> Option<&MonthlyRecord> {
        self.records
            .iter()
            .find(|r| &r.disease == disease && r.month_id == month)
    }

    /// Every month with at least one record.
    pub fn months(&self) -> BTreeSet<MonthId> {
        self.records.iter().map(|r| r.month_id).collect()
    }
}

/// Identifies one fetch started through [`StoreHandle::begin_fetch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

/// What happened to a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The fetched records are now the current snapshot.
    Installed { records: usize },
    /// The fetch failed; the current snapshot is now empty.
    Degraded,
    /// A newer fetch started after this one; its result was discarded.
    Superseded,
}

#[derive(Debug, Default)]
struct HandleState {
    current: Arc<RecordStore>,
    issued: u64,
}

/// Shared, swappable reference to the current [`RecordStore`] snapshot.
///
/// Fetches are last-write-wins: a result is installed only if no newer fetch has started
/// since, so a slow stale response can never overwrite fresher data.
#[derive(Debug, Clone, Default)]
pub struct StoreHandle {
    inner: Arc<Mutex<HandleState>>,
}

impl StoreHandle {
    pub fn new(store: RecordStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HandleState {
                current: Arc::new(store),
                issued: 0,
            })),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, HandleState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The current snapshot. Later swaps do not affect the returned value.
    pub fn snapshot(&self) -> Arc<RecordStore> {
        Arc::clone(&self.state().current)
    }

    /// Registers the start of a fetch; every earlier ticket becomes stale.
    pub fn begin_fetch(&self) -> FetchTicket {
        let mut state = self.state();
        state.issued += 1;
        FetchTicket(state.issued)
    }

    /// Completes a fetch started with `ticket`.
    ///
    /// A failed fetch degrades the store to empty, unless it has been superseded.
    pub fn complete_fetch<E: fmt::Display>(
        &self,
        ticket: FetchTicket,
        outcome: Result<RecordStore, E>,
    ) -> FetchOutcome {
        let mut state = self.state();
        if ticket.0 != state.issued {
            tracing::debug!(ticket = ticket.0, latest = state.issued, "discarding stale fetch");
            return FetchOutcome::Superseded;
        }

        match outcome {
            Ok(store) => {
                let records = store.len();
                state.current = Arc::new(store);
                tracing::info!(records, "installed monthly record snapshot");
                FetchOutcome::Installed { records }
            }
            Err(e) => {
                state.current = Arc::new(RecordStore::empty());
                tracing::warn!(error = %e, "record fetch failed; reporting on an empty store");
                FetchOutcome::Degraded
            }
        }
    }

    /// Installs `store` directly, invalidating any fetch in flight.
    pub fn replace(&self, store: RecordStore) {
        let mut state = self.state();
        state.issued += 1;
        state.current = Arc::new(store);
    }
}
