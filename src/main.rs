use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_client::ApiClient;
use api_rest::AppState;
use epi_core::constants::DEFAULT_REST_ADDR;
use epi_core::snapshot::load_snapshot;
use epi_core::{CoreConfig, FetchOutcome, Registry, StoreHandle};

/// `RUST_LOG` plus `info` for every workspace crate that logs.
fn log_filter() -> anyhow::Result<tracing_subscriber::EnvFilter> {
    Ok(tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("epi=info".parse()?)
        .add_directive("api_rest=info".parse()?)
        .add_directive("api_client=info".parse()?))
}

/// Main entry point for the surveillance reporting service
///
/// Resolves configuration from the environment, loads the registry and every monthly record
/// once, then serves the REST API.
///
/// # Environment Variables
/// - `EPI_BACKEND_URL`: report backend base URL (default: "http://127.0.0.1:8787")
/// - `EPI_USER_ID`: user whose configuration and reports are loaded (default: "guest-user-1234")
/// - `EPI_AUTH_TOKEN`: bearer token for the report backend (optional)
/// - `EPI_FIRST_REPORT_YEAR`: oldest year offered in period pickers (default: 2024)
/// - `EPI_HTTP_TIMEOUT_SECS`: backend request timeout (default: 30)
/// - `EPI_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `EPI_SNAPSHOT`: serve an offline snapshot file instead of contacting the backend
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration is invalid or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(log_filter()?)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = CoreConfig::from_env_values(
        std::env::var("EPI_BACKEND_URL").ok(),
        std::env::var("EPI_USER_ID").ok(),
        std::env::var("EPI_AUTH_TOKEN").ok(),
        std::env::var("EPI_FIRST_REPORT_YEAR").ok(),
        std::env::var("EPI_HTTP_TIMEOUT_SECS").ok(),
    )?;
    let rest_addr = std::env::var("EPI_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());

    let state = match std::env::var("EPI_SNAPSHOT").ok().map(PathBuf::from) {
        Some(path) => {
            tracing::info!("++ Serving offline snapshot {}", path.display());
            let context = load_snapshot(&path)?;
            AppState::new(
                (**context.registry()).clone(),
                StoreHandle::new((**context.store()).clone()),
                None,
                cfg.first_report_year(),
            )
        }
        None => {
            tracing::info!("++ Using report backend {} as {}", cfg.backend_url(), cfg.user_id());
            let client = ApiClient::new(&cfg)?;

            let registry = match client.get_config().await {
                Ok(registry) => registry,
                Err(e) => {
                    tracing::warn!("Could not load configuration, starting empty: {}", e);
                    Registry::new()
                }
            };

            let store = StoreHandle::default();
            match client.refresh_store(&store).await {
                FetchOutcome::Installed { records } => {
                    tracing::info!("{} monthly records cached for reporting", records)
                }
                FetchOutcome::Degraded => {
                    tracing::warn!("Error fetching data for reports; starting with none")
                }
                FetchOutcome::Superseded => {}
            }

            AppState::new(registry, store, Some(client), cfg.first_report_year())
        }
    };

    tracing::info!("++ Starting epi REST on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, api_rest::router(state)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_filter_covers_server_crates() {
        let filter = log_filter().unwrap().to_string();
        assert!(filter.contains("epi=info"));
        assert!(filter.contains("api_rest=info"));
        assert!(filter.contains("api_client=info"));
    }
}
