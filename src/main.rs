// Main entry point - Dependency injection, monitoring loop and HTTP server
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::collections::HashMap;
use std::path::PathBuf;
use std::{net::SocketAddr, sync::Arc};

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::health_monitor::HealthMonitor;
use crate::application::servo_controller::ServoController;
use crate::application::servo_driver::ServoDriver;
use crate::infrastructure::calibration_store::CalibrationStore;
use crate::infrastructure::config::load_config;
use crate::infrastructure::report_writer::{export_servo, write_health_report};
use crate::infrastructure::simulated_driver::SimulatedDriver;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    actuator_health, alerts, all_health, clear_alerts, health_check, movement_stats,
    registrations, report, reset_statistics, summary, trends,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let app_config = load_config()?;

    // Servos share one driver (infrastructure layer)
    let driver: Arc<dyn ServoDriver> = Arc::new(SimulatedDriver::new());
    let mut servos = HashMap::new();
    for spec in app_config.servos.clone() {
        let servo = Arc::new(ServoController::new(spec, Some(driver.clone()))?);
        servos.insert(servo.name().to_string(), servo);
    }

    // Apply a stored calibration profile, if configured
    if let Some(profile) = &app_config.calibration.profile {
        let mut store = CalibrationStore::new(&app_config.calibration.dir);
        store.load(profile).await?;
        tracing::info!(
            profile = store.current_profile().unwrap_or_default(),
            dir = %store.dir().display(),
            entries = store.len(),
            "Using calibration profile"
        );
        for servo in servos.values() {
            if store.get(servo.name()).is_some() {
                store.apply_to(servo).await?;
            } else {
                tracing::warn!(servo = %servo.name(), profile = %profile, "No calibration in profile");
            }
        }
    }

    // Monitor (application layer)
    let monitor = Arc::new(HealthMonitor::new(app_config.monitor.settings()?));
    for spec in &app_config.servos {
        if let Some(servo) = servos.get(&spec.resolved_name()) {
            monitor.register(servo.clone(), spec.thresholds).await?;
        }
    }
    monitor.start_monitoring().await;
    tracing::info!(
        servos = monitor.registrations().await.len(),
        running = monitor.is_monitoring().await,
        "Fleet monitoring active"
    );

    let state = Arc::new(AppState {
        monitor: monitor.clone(),
        servos: servos.clone(),
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/summary", get(summary))
        .route("/alerts", get(alerts).delete(clear_alerts))
        .route("/statistics/reset", post(reset_statistics))
        .route("/health", get(all_health))
        .route("/actuators", get(registrations))
        .route("/report", get(report))
        .route("/actuators/:name", get(actuator_health))
        .route("/actuators/:name/stats", get(movement_stats))
        .route("/actuators/:name/trends", get(trends))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = app_config.server.bind.parse()?;
    tracing::info!(%addr, "Starting servo-health service");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    monitor.stop_monitoring().await;

    // Final snapshots for offline analysis
    let data_dir = PathBuf::from(&app_config.monitor.data_dir);
    write_health_report(&monitor, &data_dir, None).await?;
    for (name, servo) in &servos {
        export_servo(servo, &data_dir.join(format!("{}.json", name))).await?;
    }

    Ok(())
}
