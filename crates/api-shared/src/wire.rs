//! JSON bodies exchanged with the report backend and with REST clients.

use epi_core::{LocationCounts, LocationId, Registry, RegistryConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

// ---- report backend ----

/// Response of the backend's `GET /config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEnvelope {
    #[serde(default)]
    pub data: Option<RegistryConfig>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of the backend's `GET /report/{disease}/{month}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportLookup {
    #[serde(default)]
    pub exists: bool,
    #[serde(default)]
    pub data: Option<BTreeMap<LocationId, LocationCounts>>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of the backend's save endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

// ---- REST surface ----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AddDiseaseReq {
    /// Free-text disease name, e.g. "Covid-19".
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddLocationReq {
    /// `"<Facility>: <Commune>"`, e.g. "EPSP: Bab El Oued".
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AddedRes {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DiseaseRes {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationRes {
    pub id: String,
    pub display_name: String,
    pub commune: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConfigRes {
    pub diseases: Vec<DiseaseRes>,
    pub locations: Vec<LocationRes>,
}

impl From<&Registry> for ConfigRes {
    fn from(registry: &Registry) -> Self {
        Self {
            diseases: registry
                .diseases()
                .iter()
                .map(|d| DiseaseRes {
                    id: d.as_str().to_string(),
                    label: d.label(),
                })
                .collect(),
            locations: registry
                .locations()
                .iter()
                .map(|l| LocationRes {
                    id: l.id.as_str().to_string(),
                    display_name: l.display_name.as_str().to_string(),
                    commune: l.commune().to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PeriodOptionRes {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MonthsRes {
    pub year: String,
    /// `YYYY-MM` months in calendar order.
    pub months: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RefreshRes {
    /// `installed`, `degraded` or `superseded`.
    pub outcome: String,
    pub records: usize,
}
