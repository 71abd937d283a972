// HTTP request handlers
use crate::application::health_monitor::RegistrationInfo;
use crate::domain::alert::{Alert, HealthReport, HealthSummary, TrendMetric, TrendPoint};
use crate::domain::servo::{HealthSnapshot, MovementStats};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TREND_WINDOW_SECS: u64 = 60;

#[derive(Deserialize)]
pub struct TrendQuery {
    pub metric: Option<String>,
    /// seconds
    pub window: Option<u64>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn summary(State(state): State<Arc<AppState>>) -> Json<HealthSummary> {
    Json(state.monitor.summary().await)
}

pub async fn alerts(State(state): State<Arc<AppState>>) -> Json<Vec<Alert>> {
    Json(state.monitor.alerts().await)
}

pub async fn clear_alerts(State(state): State<Arc<AppState>>) -> StatusCode {
    state.monitor.clear_alerts().await;
    StatusCode::NO_CONTENT
}

pub async fn reset_statistics(State(state): State<Arc<AppState>>) -> StatusCode {
    state.monitor.reset_statistics().await;
    StatusCode::NO_CONTENT
}

pub async fn registrations(State(state): State<Arc<AppState>>) -> Json<Vec<RegistrationInfo>> {
    Json(state.monitor.registrations().await)
}

/// Check every servo and return all snapshots keyed by name
pub async fn all_health(
    State(state): State<Arc<AppState>>,
) -> Json<BTreeMap<String, Option<HealthSnapshot>>> {
    Json(state.monitor.all_health().await)
}

pub async fn report(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    Json(state.monitor.export_report().await)
}

/// Check one servo now and return its snapshot
pub async fn actuator_health(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthSnapshot>, (StatusCode, String)> {
    if !state.servos.contains_key(&name) {
        return Err((StatusCode::NOT_FOUND, format!("unknown servo '{}'", name)));
    }

    match state.monitor.actuator_health(&name).await {
        Some(snapshot) => Ok(Json(snapshot)),
        None => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            format!("health check failed for '{}'", name),
        )),
    }
}

pub async fn movement_stats(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<MovementStats>, (StatusCode, String)> {
    let servo = state
        .servos
        .get(&name)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("unknown servo '{}'", name)))?;

    Ok(Json(servo.movement_stats().await))
}

pub async fn trends(
    Path(name): Path<String>,
    Query(query): Query<TrendQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TrendPoint>>, (StatusCode, String)> {
    if !state.servos.contains_key(&name) {
        return Err((StatusCode::NOT_FOUND, format!("unknown servo '{}'", name)));
    }

    let metric: TrendMetric = query
        .metric
        .as_deref()
        .unwrap_or("temperature")
        .parse()
        .map_err(|e: crate::domain::error::MonitorError| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let window = Duration::from_secs(query.window.unwrap_or(DEFAULT_TREND_WINDOW_SECS));

    Ok(Json(state.monitor.trends(&name, metric, window).await))
}
