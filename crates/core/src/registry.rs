//! Configuration registry.
//!
//! The registry holds the configured diseases and locations in insertion order. Every other
//! component keys its data against it: the location universe of an aggregation is exactly
//! [`Registry::location_ids`].
//!
//! Mutating operations validate first and only then change state, so a rejected call leaves
//! the registry exactly as it was. Callers share registries behind an `Arc` and apply changes
//! to a clone before swapping it in.

use crate::validation::split_location_display_name;
use crate::{ReportError, ReportResult};
use epi_types::{DiseaseId, LocationId, NonEmptyText};
use serde::{Deserialize, Serialize};

/// Wire form of the registry, as stored by the backend's `/config` endpoint.
///
/// Diseases are stored as ids, locations as display names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub diseases: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
}

/// A configured location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationEntry {
    pub display_name: NonEmptyText,
    pub id: LocationId,
}

impl LocationEntry {
    /// The trimmed commune or sector part, after the first `:`.
    pub fn commune(&self) -> &str {
        split_location_display_name(self.display_name.as_str())
            .map(|(_, commune)| commune)
            .unwrap_or(self.display_name.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    diseases: Vec<DiseaseId>,
    locations: Vec<LocationEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from stored diseases and location display names.
    ///
    /// Each entry is validated as if added one at a time; the first failure aborts and nothing
    /// is returned. Diseases already in id form are taken as-is.
    pub fn from_parts<D, L>(diseases: D, locations: L) -> ReportResult<Self>
    where
        D: IntoIterator,
        D::Item: AsRef<str>,
        L: IntoIterator,
        L::Item: AsRef<str>,
    {
        let mut registry = Self::new();
        for disease in diseases {
            let disease = disease.as_ref();
            let id = DiseaseId::parse(disease.trim()).or_else(|_| DiseaseId::from_name(disease))?;
            registry.insert_disease(id, disease)?;
        }
        for location in locations {
            registry.add_location(location.as_ref())?;
        }
        Ok(registry)
    }

    pub fn from_config(config: &RegistryConfig) -> ReportResult<Self> {
        Self::from_parts(&config.diseases, &config.locations)
    }

    pub fn to_config(&self) -> RegistryConfig {
        RegistryConfig {
            diseases: self.diseases.iter().map(|d| d.as_str().to_string()).collect(),
            locations: self
                .locations
                .iter()
                .map(|l| l.display_name.as_str().to_string())
                .collect(),
        }
    }

    /// Adds a disease by free-text name and returns its id.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Validation` if the name canonicalises to nothing or to an id that
    /// is already configured.
    pub fn add_disease(&mut self, name: &str) -> ReportResult<DiseaseId> {
        let id = DiseaseId::from_name(name)?;
        self.insert_disease(id.clone(), name)?;
        Ok(id)
    }

    fn insert_disease(&mut self, id: DiseaseId, name: &str) -> ReportResult<()> {
        if self.diseases.contains(&id) {
            return Err(ReportError::Validation(format!(
                "disease '{}' already exists (id '{id}')",
                name.trim()
            )));
        }
        tracing::debug!(disease = %id, "disease added");
        self.diseases.push(id);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ReportError::Validation` if the disease is not configured.
    pub fn remove_disease(&mut self, id: &DiseaseId) -> ReportResult<()> {
        let index = self
            .diseases
            .iter()
            .position(|d| d == id)
            .ok_or_else(|| ReportError::Validation(format!("unknown disease '{id}'")))?;
        self.diseases.remove(index);
        tracing::debug!(disease = %id, "disease removed");
        Ok(())
    }

    /// Adds a location from its `"<Facility>: <Commune>"` display name and returns its id.
    ///
    /// The display name is stored trimmed. Display names and ids are kept one-to-one: a name
    /// that differs from an existing one but derives the same id is rejected.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Validation` if the separator or either part is missing, or if
    /// the display name or its id is already configured.
    pub fn add_location(&mut self, display_name: &str) -> ReportResult<LocationId> {
        split_location_display_name(display_name)?;
        let display_name = NonEmptyText::new(display_name)?;
        let id = LocationId::from_display_name(display_name.as_str())?;

        if self.locations.iter().any(|l| l.display_name == display_name) {
            return Err(ReportError::Validation(format!(
                "location '{display_name}' already exists"
            )));
        }
        if let Some(existing) = self.locations.iter().find(|l| l.id == id) {
            return Err(ReportError::Validation(format!(
                "location '{display_name}' has the same id '{id}' as '{}'",
                existing.display_name
            )));
        }

        tracing::debug!(location = %id, "location added");
        self.locations.push(LocationEntry {
            display_name,
            id: id.clone(),
        });
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `ReportError::Validation` if the location is not configured.
    pub fn remove_location(&mut self, id: &LocationId) -> ReportResult<()> {
        let index = self
            .locations
            .iter()
            .position(|l| &l.id == id)
            .ok_or_else(|| ReportError::Validation(format!("unknown location '{id}'")))?;
        self.locations.remove(index);
        tracing::debug!(location = %id, "location removed");
        Ok(())
    }

    pub fn diseases(&self) -> &[DiseaseId] {
        &self.diseases
    }

    pub fn locations(&self) -> &[LocationEntry] {
        &self.locations
    }

    pub fn location_ids(&self) -> Vec<LocationId> {
        self.locations.iter().map(|l| l.id.clone()).collect()
    }

    pub fn has_disease(&self, id: &DiseaseId) -> bool {
        self.diseases.contains(id)
    }

    pub fn location(&self, id: &LocationId) -> Option<&LocationEntry> {
        self.locations.iter().find(|l| &l.id == id)
    }

    pub fn display_name(&self, id: &LocationId) -> Option<&str> {
        self.location(id).map(|l| l.display_name.as_str())
    }

    /// Short chart label of a location: its commune part.
    pub fn commune(&self, id: &LocationId) -> Option<&str> {
        self.location(id).map(LocationEntry::commune)
    }
}
