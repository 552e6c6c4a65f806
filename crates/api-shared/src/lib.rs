//! # API Shared
//!
//! Shared definitions for the surveillance APIs.
//!
//! Contains:
//! - Wire types of the external report backend, used by `api-client`
//! - Request and response bodies of the REST surface, with OpenAPI schemas
//! - Shared services like `HealthService`
//!
//! Used by `api-client` and `api-rest` so both sides agree on JSON shapes.

pub mod health;
pub mod wire;

pub use health::{HealthRes, HealthService};
pub use wire::*;
