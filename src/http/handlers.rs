//! Request handlers for the HTTP surface.
//!
//! Handlers stay thin: count, time, delegate to the lifecycle manager or the
//! inference handler, and map errors through [`ApiError`].

use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use tracing::{debug, Instrument};

use super::protocol::{ApiError, PredictRequest, PredictResponse, ProbeResponse, ReloadResponse};
use super::AppState;
use crate::health::HealthReport;
use crate::telemetry::{endpoint, RequestSpan, SpanExt, TEXT_CONTENT_TYPE};

pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    let start = Instant::now();
    state.metrics.increment(endpoint::HEALTH);
    let report = state.health.report(state.is_draining());
    state
        .metrics
        .observe_latency(endpoint::HEALTH, start.elapsed().as_secs_f64());
    Json(report)
}

pub async fn live(State(state): State<AppState>) -> Json<ProbeResponse> {
    Json(ProbeResponse { ok: state.health.is_alive() })
}

pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ProbeResponse>) {
    let ok = state.health.is_ready(state.is_draining());
    let status = if ok { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(ProbeResponse { ok }))
}

pub async fn reload(State(state): State<AppState>) -> Result<Json<ReloadResponse>, ApiError> {
    let start = Instant::now();
    state.metrics.increment(endpoint::RELOAD);
    let span = RequestSpan::new(&RequestSpan::new_request_id(), endpoint::RELOAD);

    let result = state
        .lifecycle
        .load_or_reload()
        .instrument(span.clone())
        .await;

    span.record_result(&result);
    let elapsed = start.elapsed();
    span.record("latency_ms", elapsed.as_millis() as u64);
    state
        .metrics
        .observe_latency(endpoint::RELOAD, elapsed.as_secs_f64());

    let identity = result?;
    span.record("model_identity", identity.as_str());
    Ok(Json(ReloadResponse {
        reloaded: true,
        model_identity: Some(identity),
    }))
}

pub async fn predict(
    State(state): State<AppState>,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let start = Instant::now();
    let span = RequestSpan::new(&RequestSpan::new_request_id(), endpoint::PREDICT);

    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            // Unparseable bodies never reach the inference handler but still
            // count toward predict traffic.
            state.metrics.increment(endpoint::PREDICT);
            let err = ApiError::InvalidBody(rejection.body_text());
            span.record_error(&err);
            let elapsed = start.elapsed();
            span.record("latency_ms", elapsed.as_millis() as u64);
            state
                .metrics
                .observe_latency(endpoint::PREDICT, elapsed.as_secs_f64());
            return Err(err);
        }
    };

    let result = state.inference.predict(&request.features);
    span.record_result(&result);
    span.record("latency_ms", start.elapsed().as_millis() as u64);

    let prediction = result?;
    span.record("model_identity", prediction.model_identity.as_str());
    span.in_scope(|| debug!(label = prediction.label, "prediction served"));
    Ok(Json(prediction.into()))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)], state.metrics.export())
}
