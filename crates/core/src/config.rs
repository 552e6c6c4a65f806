//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into the reporting services. Parse helpers take the raw environment value as an
//! `Option<String>` so they can be exercised without touching process-wide state.

use crate::constants::{
    DEFAULT_BACKEND_URL, DEFAULT_FIRST_REPORT_YEAR, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_USER_ID,
};
use crate::validation::validate_user_id_safe_for_path;
use crate::{ReportError, ReportResult};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    backend_url: String,
    user_id: String,
    auth_token: Option<String>,
    first_report_year: u16,
    http_timeout: Duration,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidConfig` if the backend URL is not an http(s) URL or the user
    /// id is not safe to embed in a URL path.
    pub fn new(
        backend_url: String,
        user_id: String,
        auth_token: Option<String>,
        first_report_year: u16,
        http_timeout: Duration,
    ) -> ReportResult<Self> {
        let backend_url = backend_url.trim().trim_end_matches('/').to_string();
        if !(backend_url.starts_with("http://") || backend_url.starts_with("https://")) {
            return Err(ReportError::InvalidConfig(format!(
                "backend url must start with http:// or https://, got '{backend_url}'"
            )));
        }

        validate_user_id_safe_for_path(&user_id)?;

        Ok(Self {
            backend_url,
            user_id,
            auth_token: auth_token.filter(|t| !t.trim().is_empty()),
            first_report_year,
            http_timeout,
        })
    }

    /// Resolve the configuration from raw environment values.
    ///
    /// Each argument is the value of the corresponding variable (`EPI_BACKEND_URL`,
    /// `EPI_USER_ID`, `EPI_AUTH_TOKEN`, `EPI_FIRST_REPORT_YEAR`, `EPI_HTTP_TIMEOUT_SECS`), or
    /// `None` when unset.
    pub fn from_env_values(
        backend_url: Option<String>,
        user_id: Option<String>,
        auth_token: Option<String>,
        first_report_year: Option<String>,
        http_timeout_secs: Option<String>,
    ) -> ReportResult<Self> {
        Self::new(
            non_blank(backend_url).unwrap_or_else(|| DEFAULT_BACKEND_URL.into()),
            non_blank(user_id).unwrap_or_else(|| DEFAULT_USER_ID.into()),
            auth_token,
            first_report_year_from_env_value(first_report_year)?,
            http_timeout_from_env_value(http_timeout_secs)?,
        )
    }

    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    pub fn first_report_year(&self) -> u16 {
        self.first_report_year
    }

    pub fn http_timeout(&self) -> Duration {
        self.http_timeout
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the first catalogue year from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_FIRST_REPORT_YEAR`].
pub fn first_report_year_from_env_value(value: Option<String>) -> ReportResult<u16> {
    let Some(value) = non_blank(value) else {
        return Ok(DEFAULT_FIRST_REPORT_YEAR);
    };

    match value.parse::<u16>() {
        Ok(year) if (1000..=9999).contains(&year) => Ok(year),
        _ => Err(ReportError::InvalidConfig(format!(
            "first report year must be a four-digit year, got '{value}'"
        ))),
    }
}

/// Parse the backend request timeout (whole seconds) from an optional string value.
pub fn http_timeout_from_env_value(value: Option<String>) -> ReportResult<Duration> {
    let Some(value) = non_blank(value) else {
        return Ok(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS));
    };

    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ReportError::InvalidConfig(format!(
            "http timeout must be a positive number of seconds, got '{value}'"
        ))),
    }
}
