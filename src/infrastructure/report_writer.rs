// JSON export of servo snapshots and fleet health reports
use crate::application::health_monitor::HealthMonitor;
use crate::application::servo_controller::ServoController;
use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub async fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub async fn export_servo(servo: &ServoController, path: &Path) -> anyhow::Result<()> {
    let snapshot = servo.export_snapshot().await;
    write_json(path, &snapshot).await?;

    tracing::info!(servo = %servo.name(), path = %path.display(), "Servo data exported");
    Ok(())
}

/// Write the monitor's report under `data_dir`, defaulting to a timestamped filename.
pub async fn write_health_report(
    monitor: &HealthMonitor,
    data_dir: &Path,
    filename: Option<&str>,
) -> anyhow::Result<PathBuf> {
    let filename = filename
        .map(str::to_string)
        .unwrap_or_else(|| format!("health_report_{}.json", Utc::now().format("%Y%m%d_%H%M%S")));
    let path = data_dir.join(filename);

    let report = monitor.export_report().await;
    write_json(&path, &report).await?;

    tracing::info!(path = %path.display(), "Health report exported");
    Ok(path)
}
