//! Constants used throughout the reporting core.
//!
//! Defaults for runtime configuration live here so the binaries and tests agree on them.

/// Base URL of the report backend when none is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8787";

/// Path prefix of every backend endpoint.
pub const BACKEND_API_PREFIX: &str = "/api/v1";

/// User identifier used when the environment does not provide one.
pub const DEFAULT_USER_ID: &str = "guest-user-1234";

/// Earliest year offered in the period catalogue.
pub const DEFAULT_FIRST_REPORT_YEAR: u16 = 2024;

/// Backend request timeout.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Listen address of the REST surface.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Largest count accepted from a single cell; anything above is treated as malformed.
pub const MAX_COUNT: u64 = u32::MAX as u64;

/// Separator between facility and commune in a location display name.
pub const LOCATION_SEPARATOR: char = ':';

/// Wire value selecting every disease.
pub const ALL_DISEASES: &str = "all";
