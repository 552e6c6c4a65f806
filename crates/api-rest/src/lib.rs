//! # API REST
//!
//! REST API for the surveillance reporting engine.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status codes)
//!
//! Uses `api-shared` for request/response bodies and `api-client` to persist configuration
//! changes and refresh records from the report backend.

#![warn(rust_2018_idioms)]

use api_client::{ApiClient, ClientError};
use api_shared::{
    AddDiseaseReq, AddLocationReq, AddedRes, ConfigRes, DiseaseRes, ErrorRes, HealthRes,
    HealthService, LocationRes, MonthsRes, PeriodOptionRes, RefreshRes,
};
use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use epi_core::period::current_year;
use epi_core::{
    resolve_months, DiseaseId, FetchOutcome, LocationId, Registry, Report, ReportError,
    ReportRequest, ReportType, ReportingContext, StoreHandle,
};
use std::sync::{Arc, PoisonError, RwLock};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

type ApiError = (StatusCode, Json<ErrorRes>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorRes {
            error: message.into(),
        }),
    )
}

fn report_error(err: ReportError) -> ApiError {
    match err {
        ReportError::Validation(_)
        | ReportError::EmptyPeriod(_)
        | ReportError::EmptyFilter(_)
        | ReportError::NoLocations => api_error(StatusCode::BAD_REQUEST, err.to_string()),
        other => {
            tracing::error!("Reporting error: {:?}", other);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}

fn client_error(err: ClientError) -> ApiError {
    match err {
        ClientError::Unauthorised => api_error(StatusCode::UNAUTHORIZED, err.to_string()),
        other => {
            tracing::error!("Report backend error: {:?}", other);
            api_error(StatusCode::BAD_GATEWAY, other.to_string())
        }
    }
}

/// Application state for the REST API server
///
/// Holds the current registry snapshot, the record store handle, and the optional backend
/// client. Registry edits are serialised through `config_edit` so that two concurrent edits
/// cannot overwrite each other.
#[derive(Clone)]
pub struct AppState {
    context: Arc<RwLock<Arc<ReportingContext>>>,
    store: StoreHandle,
    client: Option<ApiClient>,
    first_report_year: u16,
    config_edit: Arc<tokio::sync::Mutex<()>>,
}

impl AppState {
    pub fn new(
        registry: Registry,
        store: StoreHandle,
        client: Option<ApiClient>,
        first_report_year: u16,
    ) -> Self {
        let context = ReportingContext::new(Arc::new(registry), store.snapshot());
        Self {
            context: Arc::new(RwLock::new(Arc::new(context))),
            store,
            client,
            first_report_year,
            config_edit: Arc::default(),
        }
    }

    /// The current registry paired with the current record snapshot.
    pub fn context(&self) -> ReportingContext {
        let current = self
            .context
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        current.with_store(self.store.snapshot())
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(self.context().registry())
    }

    fn install_registry(&self, registry: Registry) {
        let mut current = self.context.write().unwrap_or_else(PoisonError::into_inner);
        *current = Arc::new(current.with_registry(Arc::new(registry)));
    }

    /// Applies `edit` to a copy of the registry, persists it if a backend is configured, and
    /// swaps it in. A failed edit or save leaves the registry unchanged.
    async fn edit_registry<T>(
        &self,
        edit: impl FnOnce(&mut Registry) -> Result<T, ReportError>,
    ) -> Result<T, ApiError> {
        let _guard = self.config_edit.lock().await;

        let mut registry = (*self.registry()).clone();
        let out = edit(&mut registry).map_err(report_error)?;

        if let Some(client) = &self.client {
            client.save_config(&registry).await.map_err(client_error)?;
        }
        self.install_registry(registry);
        Ok(out)
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        get_config,
        add_disease,
        remove_disease,
        add_location,
        remove_location,
        list_periods,
        resolve_period,
        generate_report,
        refresh_reports,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        AddDiseaseReq,
        AddLocationReq,
        AddedRes,
        ConfigRes,
        DiseaseRes,
        LocationRes,
        PeriodOptionRes,
        MonthsRes,
        RefreshRes,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router with Swagger UI at `/swagger-ui`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/config", get(get_config))
        .route("/config/diseases", post(add_disease))
        .route("/config/diseases/:id", delete(remove_disease))
        .route("/config/locations", post(add_location))
        .route("/config/locations/:id", delete(remove_location))
        .route("/periods/:report_type", get(list_periods))
        .route("/periods/:report_type/:period_value/months", get(resolve_period))
        .route("/reports", post(generate_report))
        .route("/reports/refresh", post(refresh_reports))
        .merge(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/config",
    responses(
        (status = 200, description = "Configured diseases and locations", body = ConfigRes)
    )
)]
#[axum::debug_handler]
async fn get_config(State(state): State<AppState>) -> Json<ConfigRes> {
    Json(ConfigRes::from(state.registry().as_ref()))
}

#[utoipa::path(
    post,
    path = "/config/diseases",
    request_body = AddDiseaseReq,
    responses(
        (status = 201, description = "Disease added", body = AddedRes),
        (status = 400, description = "Empty or duplicate disease", body = ErrorRes),
        (status = 502, description = "Report backend rejected the change", body = ErrorRes)
    )
)]
/// Add a disease by free-text name
///
/// # Errors
/// Returns `400 Bad Request` if the name canonicalises to nothing or to an existing id; the
/// registry is left unchanged.
#[axum::debug_handler]
async fn add_disease(
    State(state): State<AppState>,
    Json(req): Json<AddDiseaseReq>,
) -> Result<(StatusCode, Json<AddedRes>), ApiError> {
    let id = state
        .edit_registry(|registry| registry.add_disease(&req.name))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(AddedRes {
            id: id.as_str().to_string(),
        }),
    ))
}

#[utoipa::path(
    delete,
    path = "/config/diseases/{id}",
    params(("id" = String, Path, description = "Disease id")),
    responses(
        (status = 204, description = "Disease removed"),
        (status = 400, description = "Unknown disease", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn remove_disease(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<StatusCode, ApiError> {
    let id = DiseaseId::parse(&id).map_err(|e| report_error(e.into()))?;
    state
        .edit_registry(|registry| registry.remove_disease(&id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/config/locations",
    request_body = AddLocationReq,
    responses(
        (status = 201, description = "Location added", body = AddedRes),
        (status = 400, description = "Malformed or duplicate location", body = ErrorRes),
        (status = 502, description = "Report backend rejected the change", body = ErrorRes)
    )
)]
/// Add a location from its `"<Facility>: <Commune>"` display name
///
/// # Errors
/// Returns `400 Bad Request` if the separator is missing, a part is empty, or the name or its
/// id is already configured.
#[axum::debug_handler]
async fn add_location(
    State(state): State<AppState>,
    Json(req): Json<AddLocationReq>,
) -> Result<(StatusCode, Json<AddedRes>), ApiError> {
    let id = state
        .edit_registry(|registry| registry.add_location(&req.display_name))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(AddedRes {
            id: id.as_str().to_string(),
        }),
    ))
}

#[utoipa::path(
    delete,
    path = "/config/locations/{id}",
    params(("id" = String, Path, description = "Location id")),
    responses(
        (status = 204, description = "Location removed"),
        (status = 400, description = "Unknown location", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn remove_location(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<StatusCode, ApiError> {
    let id = LocationId::parse(&id).map_err(|e| report_error(e.into()))?;
    state
        .edit_registry(|registry| registry.remove_location(&id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/periods/{report_type}",
    params(("report_type" = String, Path, description = "monthly, quarterly, semiannual or annual")),
    responses(
        (status = 200, description = "Selectable periods, newest first", body = [PeriodOptionRes]),
        (status = 400, description = "Unknown report type", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn list_periods(
    State(state): State<AppState>,
    AxumPath(report_type): AxumPath<String>,
) -> Result<Json<Vec<PeriodOptionRes>>, ApiError> {
    let report_type: ReportType = report_type.parse().map_err(report_error)?;
    let options = report_type
        .period_catalogue(state.first_report_year, current_year())
        .into_iter()
        .map(|p| PeriodOptionRes {
            value: p.value,
            label: p.label,
        })
        .collect();
    Ok(Json(options))
}

#[utoipa::path(
    get,
    path = "/periods/{report_type}/{period_value}/months",
    params(
        ("report_type" = String, Path, description = "monthly, quarterly, semiannual or annual"),
        ("period_value" = String, Path, description = "e.g. 2025-01, 2025_Q1, 2025_S2, 2025_FULL")
    ),
    responses(
        (status = 200, description = "Months covered by the period", body = MonthsRes),
        (status = 400, description = "Unknown report type or unresolvable period", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn resolve_period(
    State(_state): State<AppState>,
    AxumPath((report_type, period_value)): AxumPath<(String, String)>,
) -> Result<Json<MonthsRes>, ApiError> {
    let report_type: ReportType = report_type.parse().map_err(report_error)?;
    let resolved = resolve_months(report_type, &period_value);
    if resolved.is_empty() {
        return Err(report_error(ReportError::EmptyPeriod(period_value)));
    }
    Ok(Json(MonthsRes {
        year: resolved.year,
        months: resolved.months.iter().map(ToString::to_string).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/reports",
    request_body(content = Object, description = "reportType, periodValue, and optional diseases (\"all\" or a list), locations and intervals"),
    responses(
        (status = 200, description = "Aggregated report with matrix, totals and chart series", body = Object),
        (status = 400, description = "No locations, unresolvable period, or an empty selection", body = ErrorRes)
    )
)]
/// Generate a report
///
/// Aggregates the current record snapshot over the requested period and selection.
///
/// # Errors
/// Returns `400 Bad Request` with a message the client shows in place of the report.
#[axum::debug_handler]
async fn generate_report(
    State(state): State<AppState>,
    Json(req): Json<ReportRequest>,
) -> Result<Json<Report>, ApiError> {
    state.context().run(&req).map(Json).map_err(report_error)
}

#[utoipa::path(
    post,
    path = "/reports/refresh",
    responses(
        (status = 200, description = "Outcome of the refetch", body = RefreshRes),
        (status = 503, description = "No report backend configured", body = ErrorRes)
    )
)]
/// Refetch every monthly record from the report backend
///
/// The newest refresh wins; a failed fetch leaves reports computed on an empty store.
#[axum::debug_handler]
async fn refresh_reports(State(state): State<AppState>) -> Result<Json<RefreshRes>, ApiError> {
    let Some(client) = &state.client else {
        return Err(api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "no report backend configured",
        ));
    };

    let res = match client.refresh_store(&state.store).await {
        FetchOutcome::Installed { records } => RefreshRes {
            outcome: "installed".into(),
            records,
        },
        FetchOutcome::Degraded => RefreshRes {
            outcome: "degraded".into(),
            records: 0,
        },
        FetchOutcome::Superseded => RefreshRes {
            outcome: "superseded".into(),
            records: state.store.snapshot().len(),
        },
    };
    Ok(Json(res))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use epi_core::{RecordStore, ReportRequest};
    use serde_json::{json, Value};
    use std::collections::BTreeMap;
    use tower::ServiceExt;

    fn state() -> AppState {
        let registry =
            Registry::from_parts(["Flu", "Measles"], ["EPSP: Bab El Oued", "EPSP: Casbah"])
                .unwrap();
        let store = RecordStore::from_backend(BTreeMap::from([(
            "report_Flu_2025-01".to_string(),
            json!({
                "monthId": "2025-01",
                "disease": "Flu",
                "data": {"EPSP_Bab_El_Oued": {"M_0_1": 5, "F_0_1": 3}}
            }),
        )]));
        AppState::new(registry, StoreHandle::new(store), None, 2024)
    }

    async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(body.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, body) = send(router(state()), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn config_lists_registry() {
        let (status, body) = send(router(state()), Method::GET, "/config", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["locations"][0]["id"], "EPSP_Bab_El_Oued");
        assert_eq!(body["locations"][0]["commune"], "Bab El Oued");
        assert_eq!(body["diseases"][1]["id"], "Measles");
    }

    #[tokio::test]
    async fn adding_and_removing_locations() {
        let state = state();

        let (status, body) = send(
            router(state.clone()),
            Method::POST,
            "/config/locations",
            Some(json!({"displayName": "EPSP: Hydra"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], "EPSP_Hydra");
        assert_eq!(state.registry().locations().len(), 3);

        let (status, body) = send(
            router(state.clone()),
            Method::POST,
            "/config/locations",
            Some(json!({"displayName": "Hydra"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("format"));
        assert_eq!(state.registry().locations().len(), 3);

        let (status, _) = send(
            router(state.clone()),
            Method::DELETE,
            "/config/locations/EPSP_Hydra",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(state.registry().locations().len(), 2);
    }

    #[tokio::test]
    async fn duplicate_disease_is_rejected() {
        let state = state();
        let (status, _) = send(
            router(state.clone()),
            Method::POST,
            "/config/diseases",
            Some(json!({"name": "Flu"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            router(state.clone()),
            Method::DELETE,
            "/config/diseases/Rabies",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(state.registry().diseases().len(), 2);
    }

    #[tokio::test]
    async fn periods_and_months() {
        let (status, body) =
            send(router(state()), Method::GET, "/periods/quarterly", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["value"], format!("{}_Q1", current_year()));

        let (status, body) = send(
            router(state()),
            Method::GET,
            "/periods/semiannual/2025_S2/months",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["year"], "2025");
        assert_eq!(body["months"][0], "2025-07");

        let (status, _) = send(
            router(state()),
            Method::GET,
            "/periods/quarterly/2025_Q7/months",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(router(state()), Method::GET, "/periods/weekly", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn generates_report() {
        let request = ReportRequest::new(ReportType::Quarterly, "2025_Q1");
        let (status, body) = send(
            router(state()),
            Method::POST,
            "/reports",
            Some(serde_json::to_value(&request).unwrap()),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "All Diseases Report for 2025 - Q1");
        assert_eq!(body["totals"]["grand"]["total"], 8);
        assert_eq!(body["totals"]["perLocation"]["EPSP_Bab_El_Oued"]["M"], 5);
        assert_eq!(body["totals"]["perLocation"]["EPSP_Casbah"]["total"], 0);
    }

    #[tokio::test]
    async fn report_errors_carry_messages() {
        let (status, body) = send(
            router(state()),
            Method::POST,
            "/reports",
            Some(json!({"reportType": "quarterly", "periodValue": "2025_Q1", "diseases": []})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "select at least one disease");

        let empty = AppState::new(Registry::new(), StoreHandle::default(), None, 2024);
        let (status, body) = send(
            router(empty),
            Method::POST,
            "/reports",
            Some(json!({"reportType": "monthly", "periodValue": "2025-01"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("no locations"));
    }

    #[tokio::test]
    async fn report_reflects_store_swaps() {
        let state = state();
        state.store.replace(RecordStore::empty());

        let (_, body) = send(
            router(state),
            Method::POST,
            "/reports",
            Some(json!({"reportType": "monthly", "periodValue": "2025-01"})),
        )
        .await;
        assert_eq!(body["totals"]["grand"]["total"], 0);
        assert_eq!(body["charts"]["grandTotal"], 0);
    }

    #[tokio::test]
    async fn refresh_without_backend_is_unavailable() {
        let (status, _) = send(router(state()), Method::POST, "/reports/refresh", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
