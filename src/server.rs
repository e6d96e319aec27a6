//! HTTP surface: the single render route and its error mapping
//!
//! One POST route drives the whole service. The handler validates the wire
//! payload, takes a concurrency permit, runs a [`RenderJob`], and maps the
//! outcome onto exactly two failure shapes: 400 `"Invalid URL"` for rejected
//! targets and 500 `"Failed to render PDF"` for everything downstream.
//! Internal failure detail is logged server-side and never leaves the host.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use log::{error, info, warn};
use tokio::sync::Semaphore;

use crate::validate::{validate, RenderPayload, RenderRequest};
use crate::{EngineConfig, EngineFactory, Error, RenderJob, Result};

/// Slack added to the navigation budget on the async side; the tab's own
/// deadline is expected to fire first.
const NAV_GRACE_MS: u64 = 1_000;

/// How long to wait for an orderly engine shutdown before falling back to the
/// worker dropping the process on its own.
const CLOSE_BUDGET_MS: u64 = 10_000;

/// Shared server state: the injected automation layer, the engine
/// configuration cloned into every job, and the concurrency cap.
#[derive(Clone)]
pub struct AppState {
    factory: Arc<dyn EngineFactory>,
    engine_config: EngineConfig,
    limiter: Arc<Semaphore>,
}

impl AppState {
    /// `max_renders` bounds the number of simultaneous browser processes;
    /// requests beyond it queue on the semaphore rather than failing.
    pub fn new(
        factory: Arc<dyn EngineFactory>,
        engine_config: EngineConfig,
        max_renders: usize,
    ) -> Self {
        Self {
            factory,
            engine_config,
            limiter: Arc::new(Semaphore::new(max_renders)),
        }
    }
}

/// Build the service router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/render", post(render))
        .with_state(state)
}

async fn render(State(state): State<AppState>, Json(payload): Json<RenderPayload>) -> Response {
    let request = match validate(payload) {
        Ok(request) => request,
        Err(err) => {
            warn!("rejected render request: {}", err);
            return (StatusCode::BAD_REQUEST, "Invalid URL").into_response();
        }
    };

    let started = Instant::now();
    match run_job(&state, &request).await {
        Ok(bytes) => {
            info!(
                "rendered {} ({} bytes in {:?})",
                request.url,
                bytes.len(),
                started.elapsed()
            );
            pdf_response(bytes)
        }
        Err(err) => {
            error!("render failed for {}: {}", request.url, err);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render PDF").into_response()
        }
    }
}

/// Execute one render job end to end. The engine is closed before the result
/// is surfaced, on every path: success, navigation failure, capture failure,
/// and timeout.
async fn run_job(state: &AppState, request: &RenderRequest) -> Result<Vec<u8>> {
    let _permit = state
        .limiter
        .clone()
        .acquire_owned()
        .await
        .map_err(|e| Error::Other(format!("render limiter closed: {}", e)))?;

    let job = RenderJob::spawn(state.factory.clone(), state.engine_config.clone()).await?;
    let outcome = drive(&job, request, &state.engine_config).await;
    shutdown(job).await;
    outcome
}

async fn drive(job: &RenderJob, request: &RenderRequest, config: &EngineConfig) -> Result<Vec<u8>> {
    let budget = Duration::from_millis(config.nav_timeout_ms + NAV_GRACE_MS);
    match tokio::time::timeout(budget, job.navigate(request.url.as_str())).await {
        Ok(res) => res?,
        Err(_) => return Err(Error::Timeout(config.nav_timeout_ms)),
    }

    job.print_pdf(&request.pdf).await
}

async fn shutdown(job: RenderJob) {
    let budget = Duration::from_millis(CLOSE_BUDGET_MS);
    match tokio::time::timeout(budget, job.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!("engine close failed: {}", err),
        Err(_) => warn!("engine close timed out; worker thread will drop the process"),
    }
}

fn pdf_response(bytes: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"webpage.pdf\"",
            ),
            (header::CACHE_CONTROL, "no-store"),
        ],
        bytes,
    )
        .into_response()
}
