//!
//! healthdash HTTP server
//! ----------------------
//! Axum routes over the page catalog. Each request runs one page through the pipeline on
//! the blocking pool; the source cache inside `AppState` is the only state shared between
//! requests.
//!
//! Routes:
//! - `GET  /`                  liveness text
//! - `GET  /pages`             page summaries
//! - `GET  /pages/{id}`        page definition
//! - `POST /pages/{id}/run`    `PageParams` -> `PageOutcome`
//! - `POST /pages/{id}/export` `PageParams` -> CSV of the filtered table
//! - `GET  /cache`             cached source keys

use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{error, info};

use crate::catalog::{Catalog, PageSpec, PageSummary};
use crate::config::DashConfig;
use crate::error::{AppError, AppResult};
use crate::pipeline::{PageOutcome, PageParams, Pipeline};
use crate::present;
use crate::storage::{SourceStore, TableCache};

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: SourceStore,
    pub catalog: Arc<Catalog>,
}

impl AppState {
    pub fn new(store: SourceStore, catalog: Catalog) -> Self { Self { store, catalog: Arc::new(catalog) } }

    /// Fresh cache over the configured data directory, with the built-in or configured catalog.
    pub fn from_config(config: &DashConfig) -> anyhow::Result<Self> {
        let catalog = match &config.pages_file {
            Some(path) => Catalog::load(path).with_context(|| format!("loading page catalog {}", path.display()))?,
            None => Catalog::builtin().context("built-in page catalog")?,
        };
        let store = SourceStore::new(&config.data_dir, TableCache::new());
        Ok(Self::new(store, catalog))
    }

    fn page(&self, id: &str) -> AppResult<PageSpec> { Ok(self.catalog.get(id)?.clone()) }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(target: "healthdash::server", "{}: {}", self.code_str(), self.message());
        }
        (status, Json(self)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "healthdash ok" }))
        .route("/pages", get(list_pages))
        .route("/pages/{id}", get(get_page))
        .route("/pages/{id}/run", post(run_page))
        .route("/pages/{id}/export", post(export_page))
        .route("/cache", get(cache_keys))
        .with_state(state)
}

/// Start the HTTP server with settings from `config`.
pub async fn run(config: DashConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config)?;
    info!(
        target: "healthdash::server",
        "serving {} pages from data_dir='{}'",
        state.catalog.pages().len(),
        config.data_dir.display()
    );
    if !config.data_dir.is_dir() {
        info!(target: "healthdash::server", "data_dir '{}' does not exist yet; pages will report missing sources", config.data_dir.display());
    }
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await.with_context(|| format!("binding {}", addr))?;
    info!(target: "healthdash::server", "listening on http://{}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Run blocking pipeline work off the async executor.
async fn blocking<T, F>(f: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> AppResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::internal("worker_failed".to_string(), e.to_string()))?
}

pub async fn list_pages(State(state): State<AppState>) -> Json<Vec<PageSummary>> {
    Json(state.catalog.pages().iter().map(PageSpec::summary).collect())
}

pub async fn get_page(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<PageSpec>> {
    Ok(Json(state.page(&id)?))
}

pub async fn run_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(params): Json<PageParams>,
) -> AppResult<Json<PageOutcome>> {
    let page = state.page(&id)?;
    info!(target: "healthdash::server", "run page '{}' params={:?}", id, params);
    let outcome = blocking(move || Ok(Pipeline::new(&state.store).run(&page, &params)?)).await?;
    Ok(Json(outcome))
}

pub async fn export_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(params): Json<PageParams>,
) -> AppResult<impl IntoResponse> {
    let page = state.page(&id)?;
    info!(target: "healthdash::server", "export page '{}' params={:?}", id, params);
    let csv = blocking(move || {
        let selection = Pipeline::new(&state.store).select(&page, &params)?;
        Ok(present::to_csv(&selection.table)?)
    })
    .await?;
    let disposition = format!("attachment; filename=\"{}.csv\"", id);
    Ok((
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()), (header::CONTENT_DISPOSITION, disposition)],
        csv,
    ))
}

pub async fn cache_keys(State(state): State<AppState>) -> Json<Vec<String>> { Json(state.store.cache().keys()) }
