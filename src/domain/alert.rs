// Fleet monitoring models - alerts, trend history and summaries
use crate::domain::error::MonitorError;
use crate::domain::servo::{HealthSnapshot, HealthStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertLevel {
    Warning,
    Critical,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub timestamp: DateTime<Utc>,
    pub actuator: String,
    pub level: AlertLevel,
    pub message: String,
}

impl Alert {
    pub fn new(actuator: &str, level: AlertLevel, message: String) -> Self {
        Self {
            timestamp: Utc::now(),
            actuator: actuator.to_string(),
            level,
            message,
        }
    }
}

/// One polled sample retained in an actuator's trend history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub current: f64,
    pub voltage: f64,
    pub angle: f64,
    pub status: HealthStatus,
}

impl HealthRecord {
    pub fn from_snapshot(snapshot: &HealthSnapshot, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            temperature: snapshot.health.temperature,
            current: snapshot.health.current,
            voltage: snapshot.health.voltage,
            angle: snapshot.current_angle,
            status: snapshot.status,
        }
    }

    pub fn value(&self, metric: TrendMetric) -> f64 {
        match metric {
            TrendMetric::Temperature => self.temperature,
            TrendMetric::Current => self.current,
            TrendMetric::Voltage => self.voltage,
            TrendMetric::Angle => self.angle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendMetric {
    Temperature,
    Current,
    Voltage,
    Angle,
}

impl FromStr for TrendMetric {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "temperature" => Ok(TrendMetric::Temperature),
            "current" => Ok(TrendMetric::Current),
            "voltage" => Ok(TrendMetric::Voltage),
            "angle" => Ok(TrendMetric::Angle),
            _ => Err(MonitorError::UnknownMetric(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Registrations per last observed status; `unknown` counts servos not yet checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub healthy: usize,
    pub warning: usize,
    pub critical: usize,
    pub error: usize,
    pub unknown: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: Option<HealthStatus>) {
        match status {
            Some(HealthStatus::Healthy) => self.healthy += 1,
            Some(HealthStatus::Warning) => self.warning += 1,
            Some(HealthStatus::Critical) => self.critical += 1,
            Some(HealthStatus::Error) => self.error += 1,
            None => self.unknown += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.healthy + self.warning + self.critical + self.error + self.unknown
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorStatistics {
    pub total_alerts: u64,
    pub critical_alerts: u64,
    pub warnings: u64,
    pub monitoring_start: DateTime<Utc>,
    pub uptime_secs: f64,
}

impl MonitorStatistics {
    pub fn new() -> Self {
        Self {
            total_alerts: 0,
            critical_alerts: 0,
            warnings: 0,
            monitoring_start: Utc::now(),
            uptime_secs: 0.0,
        }
    }

    pub fn count(&mut self, level: AlertLevel) {
        self.total_alerts += 1;
        match level {
            AlertLevel::Critical => self.critical_alerts += 1,
            AlertLevel::Warning => self.warnings += 1,
            AlertLevel::Error => {}
        }
    }
}

impl Default for MonitorStatistics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthSummary {
    pub timestamp: DateTime<Utc>,
    pub total_actuators: usize,
    pub actuators_by_status: StatusCounts,
    pub recent_alerts: Vec<Alert>,
    pub statistics: MonitorStatistics,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActuatorReport {
    pub current_health: Option<HealthSnapshot>,
    pub history: Vec<HealthRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub generated_at: DateTime<Utc>,
    pub summary: HealthSummary,
    pub actuators: BTreeMap<String, ActuatorReport>,
    pub alerts: Vec<Alert>,
}
