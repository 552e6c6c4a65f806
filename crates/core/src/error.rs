use std::fmt;

/// A filter dimension the user must select at least one value of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDimension {
    Disease,
    Location,
    AgeInterval,
}

impl fmt::Display for FilterDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FilterDimension::Disease => "disease",
            FilterDimension::Location => "location",
            FilterDimension::AgeInterval => "age interval",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("select a valid period: '{0}' does not resolve to any month")]
    EmptyPeriod(String),
    #[error("select at least one {0}")]
    EmptyFilter(FilterDimension),
    #[error("cannot generate report: no locations defined")]
    NoLocations,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to read snapshot file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to deserialize snapshot at '{path}': {source}")]
    Deserialization {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to deserialize YAML at '{path}': {source}")]
    YamlDeserialization {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

impl From<epi_types::TypeError> for ReportError {
    fn from(err: epi_types::TypeError) -> Self {
        ReportError::Validation(err.to_string())
    }
}

pub type ReportResult<T> = std::result::Result<T, ReportError>;
