//! # API Client
//!
//! Async client for the external report backend.
//!
//! Every endpoint lives under `{backend_url}/api/v1/user/{user_id}`:
//! - `GET /config`, `POST /config`: the disease and location registry
//! - `GET /reports`: every saved monthly record, keyed by report key
//! - `GET /report/{disease}/{month}`, `POST /report`: one monthly record
//!
//! Requests carry `Authorization: Bearer <token>` when a token is configured. A `401` means the
//! session has expired and is surfaced as [`ClientError::Unauthorised`].

#![warn(rust_2018_idioms)]

use api_shared::{ConfigEnvelope, ReportLookup, SaveResponse};
use epi_core::constants::BACKEND_API_PREFIX;
use epi_core::{
    CoreConfig, DiseaseId, FetchOutcome, LocationCounts, LocationId, MonthId, MonthlyRecord,
    RecordStore, Registry, ReportError, StoreHandle,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("could not reach report backend: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("session expired, please log in again")]
    Unauthorised,
    #[error("report backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response from report backend: {0}")]
    Decode(String),
    #[error("report backend error: {0}")]
    Backend(String),
    #[error("stored configuration is invalid: {0}")]
    InvalidRegistry(#[from] ReportError),
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[derive(Clone, Debug)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl ApiClient {
    /// Creates a client for the backend and user named in `cfg`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if the HTTP client cannot be built.
    pub fn new(cfg: &CoreConfig) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(cfg.http_timeout())
            .build()
            .map_err(ClientError::Transport)?;

        Ok(Self {
            client,
            base_url: format!(
                "{}{}/user/{}",
                cfg.backend_url(),
                BACKEND_API_PREFIX,
                cfg.user_id()
            ),
            auth_token: cfg.auth_token().map(str::to_string),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn authorise(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorised);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> ClientResult<T> {
        let url = self.url(endpoint);
        tracing::debug!(%url, "GET");
        let response = self
            .authorise(self.client.get(&url))
            .send()
            .await
            .map_err(ClientError::Transport)?;
        Self::read(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> ClientResult<T> {
        let url = self.url(endpoint);
        tracing::debug!(%url, "POST");
        let response = self
            .authorise(self.client.post(&url).json(body))
            .send()
            .await
            .map_err(ClientError::Transport)?;
        Self::read(response).await
    }

    fn check_saved(response: SaveResponse) -> ClientResult<()> {
        if response.success {
            Ok(())
        } else {
            Err(ClientError::Backend(
                response
                    .error
                    .unwrap_or_else(|| "unknown save error".to_string()),
            ))
        }
    }

    /// Fetches the stored registry. A user with no saved configuration gets an empty one.
    pub async fn get_config(&self) -> ClientResult<Registry> {
        let envelope: ConfigEnvelope = self.get_json("/config").await?;
        if let Some(error) = envelope.error {
            return Err(ClientError::Backend(error));
        }
        let config = envelope.data.unwrap_or_default();
        Ok(Registry::from_config(&config)?)
    }

    pub async fn save_config(&self, registry: &Registry) -> ClientResult<()> {
        let response: SaveResponse = self.post_json("/config", &registry.to_config()).await?;
        Self::check_saved(response)
    }

    /// Fetches every saved monthly record. Unreadable records are skipped.
    pub async fn get_all_reports(&self) -> ClientResult<RecordStore> {
        let reports: BTreeMap<String, serde_json::Value> = self.get_json("/reports").await?;
        if let Some(serde_json::Value::String(error)) = reports.get("error") {
            return Err(ClientError::Backend(error.clone()));
        }
        Ok(RecordStore::from_backend(reports))
    }

    /// Fetches the saved counts of one report, or `None` if nothing was saved yet.
    pub async fn get_report(
        &self,
        disease: &DiseaseId,
        month: MonthId,
    ) -> ClientResult<Option<BTreeMap<LocationId, LocationCounts>>> {
        let lookup: ReportLookup = self
            .get_json(&format!("/report/{disease}/{month}"))
            .await?;
        if let Some(error) = lookup.error {
            return Err(ClientError::Backend(error));
        }
        Ok(if lookup.exists {
            Some(lookup.data.unwrap_or_default())
        } else {
            None
        })
    }

    /// Saves one monthly record; the backend replaces any earlier save for the same disease and
    /// month.
    pub async fn save_report(&self, record: &MonthlyRecord) -> ClientResult<()> {
        let response: SaveResponse = self.post_json("/report", record).await?;
        Self::check_saved(response)?;
        tracing::info!(disease = %record.disease, month = %record.month_id, "report saved");
        Ok(())
    }

    /// Refetches every record into `handle`.
    ///
    /// The result is installed only if no newer refresh started meanwhile; a failed fetch leaves
    /// the handle with an empty store.
    pub async fn refresh_store(&self, handle: &StoreHandle) -> FetchOutcome {
        let ticket = handle.begin_fetch();
        let result = self.get_all_reports().await;
        handle.complete_fetch(ticket, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use epi_core::{AgeInterval, CountKey, Sex};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    const TOKEN: &str = "secret-token";

    async fn spawn_backend(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base_url: String, token: Option<&str>) -> ApiClient {
        let cfg = CoreConfig::new(
            base_url,
            "guest-user-1234".into(),
            token.map(str::to_string),
            2024,
            Duration::from_secs(5),
        )
        .unwrap();
        ApiClient::new(&cfg).unwrap()
    }

    fn authorised(headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == format!("Bearer {TOKEN}"))
    }

    fn backend(saved: Arc<Mutex<Vec<Value>>>) -> Router {
        let saved_config = Arc::clone(&saved);
        Router::new()
            .route(
                "/api/v1/user/:user_id/config",
                get(|headers: HeaderMap| async move {
                    if !authorised(&headers) {
                        return Err(StatusCode::UNAUTHORIZED);
                    }
                    Ok(Json(json!({
                        "data": {
                            "diseases": ["Flu", "Measles"],
                            "locations": ["EPSP: Bab El Oued", "EPSP: Casbah"]
                        }
                    })))
                })
                .post(move |Json(body): Json<Value>| async move {
                    saved_config.lock().unwrap().push(body);
                    Json(json!({"success": true}))
                }),
            )
            .route(
                "/api/v1/user/:user_id/reports",
                get(|| async {
                    Json(json!({
                        "report_Flu_2025-01": {
                            "monthId": "2025-01",
                            "disease": "Flu",
                            "data": {"EPSP_Casbah": {"M_0_1": 2}}
                        },
                        "report_Flu_broken": {"monthId": "soon", "disease": "Flu"}
                    }))
                }),
            )
            .route(
                "/api/v1/user/:user_id/report/:disease/:month",
                get(|Path((_, disease, month)): Path<(String, String, String)>| async move {
                    if disease == "Flu" && month == "2025-01" {
                        Json(json!({
                            "exists": true,
                            "data": {"EPSP_Casbah": {"M_0_1": 2}}
                        }))
                    } else {
                        Json(json!({"exists": false}))
                    }
                }),
            )
            .route(
                "/api/v1/user/:user_id/report",
                axum::routing::post(move |Json(body): Json<Value>| async move {
                    if body["disease"] == "Rejected" {
                        return Json(json!({"success": false, "error": "quota exceeded"}));
                    }
                    saved.lock().unwrap().push(body);
                    Json(json!({"success": true}))
                }),
            )
    }

    #[tokio::test]
    async fn get_config_sends_bearer_token() {
        let base = spawn_backend(backend(Arc::default())).await;

        let registry = client(base.clone(), Some(TOKEN)).get_config().await.unwrap();
        assert_eq!(registry.diseases().len(), 2);
        assert_eq!(registry.location_ids()[0].as_str(), "EPSP_Bab_El_Oued");

        let err = client(base, None).get_config().await.expect_err("no token");
        assert!(matches!(err, ClientError::Unauthorised));
    }

    #[tokio::test]
    async fn get_all_reports_skips_unreadable_records() {
        let base = spawn_backend(backend(Arc::default())).await;
        let store = client(base, None).get_all_reports().await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn get_report_distinguishes_missing() {
        let base = spawn_backend(backend(Arc::default())).await;
        let api = client(base, None);
        let flu = DiseaseId::parse("Flu").unwrap();

        let found = api
            .get_report(&flu, "2025-01".parse().unwrap())
            .await
            .unwrap()
            .expect("saved report");
        let casbah = &found[&LocationId::parse("EPSP_Casbah").unwrap()];
        assert_eq!(casbah.get(CountKey::new(Sex::M, AgeInterval::Under1)), 2);

        let missing = api.get_report(&flu, "2025-02".parse().unwrap()).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn save_report_posts_camel_case_record() {
        let saved = Arc::new(Mutex::new(Vec::new()));
        let base = spawn_backend(backend(Arc::clone(&saved))).await;
        let api = client(base, None);

        let record: MonthlyRecord = serde_json::from_value(json!({
            "monthId": "2025-03",
            "disease": "Flu",
            "reporterId": "guest-user-1234",
            "data": {"EPSP_Casbah": {"F_5_9": 1}}
        }))
        .unwrap();
        api.save_report(&record).await.unwrap();

        let body = saved.lock().unwrap()[0].clone();
        assert_eq!(body["monthId"], "2025-03");
        assert_eq!(body["reporterId"], "guest-user-1234");
        assert_eq!(body["data"]["EPSP_Casbah"]["F_5_9"], 1);

        let mut rejected = record;
        rejected.disease = DiseaseId::parse("Rejected").unwrap();
        let err = api.save_report(&rejected).await.expect_err("rejected");
        assert!(matches!(err, ClientError::Backend(msg) if msg == "quota exceeded"));
    }

    #[tokio::test]
    async fn save_config_posts_wire_form() {
        let saved = Arc::new(Mutex::new(Vec::new()));
        let base = spawn_backend(backend(Arc::clone(&saved))).await;
        let registry = Registry::from_parts(["Flu"], ["EPSP: Casbah"]).unwrap();

        client(base, None).save_config(&registry).await.unwrap();
        assert_eq!(
            saved.lock().unwrap()[0],
            json!({"diseases": ["Flu"], "locations": ["EPSP: Casbah"]})
        );
    }

    #[tokio::test]
    async fn refresh_installs_or_degrades() {
        let handle = StoreHandle::default();

        let base = spawn_backend(backend(Arc::default())).await;
        let outcome = client(base, None).refresh_store(&handle).await;
        assert_eq!(outcome, FetchOutcome::Installed { records: 1 });
        assert_eq!(handle.snapshot().len(), 1);

        let failing = Router::new().route(
            "/api/v1/user/:user_id/reports",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base = spawn_backend(failing).await;
        let outcome = client(base, None).refresh_store(&handle).await;
        assert_eq!(outcome, FetchOutcome::Degraded);
        assert!(handle.snapshot().is_empty());
    }

    #[tokio::test]
    async fn backend_error_body_fails_fetch() {
        let router = Router::new().route(
            "/api/v1/user/:user_id/reports",
            get(|| async { Json(json!({"error": "database unavailable"})) }),
        );
        let base = spawn_backend(router).await;
        let err = client(base, None).get_all_reports().await.expect_err("backend error");
        assert!(matches!(err, ClientError::Backend(msg) if msg == "database unavailable"));
    }
}
