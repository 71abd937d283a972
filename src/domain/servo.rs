// Servo domain models - movement records, health counters and snapshots
use crate::domain::calibration::Calibration;
use crate::domain::thresholds::{Severity, Thresholds};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Static description of one servo: identity, safe range and default speed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServoSpec {
    pub channel: u8,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_min_angle")]
    pub min_angle: f64,
    #[serde(default = "default_max_angle")]
    pub max_angle: f64,
    /// degrees/second
    #[serde(default = "default_speed")]
    pub default_speed: f64,
    /// Overrides the default thresholds for this servo
    #[serde(default)]
    pub thresholds: Option<Thresholds>,
}

fn default_min_angle() -> f64 {
    0.0
}

fn default_max_angle() -> f64 {
    180.0
}

fn default_speed() -> f64 {
    50.0
}

impl ServoSpec {
    pub fn new(channel: u8) -> Self {
        Self {
            channel,
            name: None,
            min_angle: default_min_angle(),
            max_angle: default_max_angle(),
            default_speed: default_speed(),
            thresholds: None,
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn range(mut self, min_angle: f64, max_angle: f64) -> Self {
        self.min_angle = min_angle;
        self.max_angle = max_angle;
        self
    }

    pub fn speed(mut self, default_speed: f64) -> Self {
        self.default_speed = default_speed;
        self
    }

    /// Falls back to `servo_<channel>` when no name was configured.
    pub fn resolved_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("servo_{}", self.channel))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementRecord {
    pub timestamp: DateTime<Utc>,
    pub from_angle: f64,
    pub to_angle: f64,
    pub distance: f64,
    /// degrees/second
    pub speed: f64,
    /// seconds
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl LogEntry {
    pub fn now(message: String) -> Self {
        Self {
            timestamp: Utc::now(),
            message,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthCounters {
    /// Celsius
    pub temperature: f64,
    /// mA
    pub current: f64,
    /// V
    pub voltage: f64,
    pub error_count: u64,
    pub warning_count: u64,
    pub total_movements: u64,
    /// Total degrees moved
    pub total_distance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
    Error,
}

impl HealthStatus {
    /// A recorded error outranks any live reading, so ERROR sticks until the counters are reset.
    pub fn classify(counters: &HealthCounters, thresholds: &Thresholds) -> Self {
        if counters.error_count > 0 {
            return HealthStatus::Error;
        }
        match thresholds.worst(counters.temperature, counters.current) {
            Some(Severity::Critical) => HealthStatus::Critical,
            Some(Severity::Warning) => HealthStatus::Warning,
            None => HealthStatus::Healthy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "HEALTHY",
            HealthStatus::Warning => "WARNING",
            HealthStatus::Critical => "CRITICAL",
            HealthStatus::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of a servo, computed on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub name: String,
    pub channel: u8,
    pub current_angle: f64,
    pub target_angle: f64,
    pub is_moving: bool,
    pub health: HealthCounters,
    pub uptime_secs: f64,
    pub status: HealthStatus,
    pub warnings: Vec<LogEntry>,
    pub errors: Vec<LogEntry>,
    pub last_movement: Option<MovementRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovementStats {
    pub total_movements: u64,
    pub total_distance: f64,
    pub average_speed: f64,
    pub last_movement: Option<MovementRecord>,
    pub uptime_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServoInfo {
    pub name: String,
    pub channel: u8,
    pub min_angle: f64,
    pub max_angle: f64,
    pub default_speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServoState {
    pub current_angle: f64,
    pub target_angle: f64,
    pub is_moving: bool,
}

/// Full servo state for external serialization.
#[derive(Debug, Clone, Serialize)]
pub struct ServoExport {
    pub servo_info: ServoInfo,
    pub current_state: ServoState,
    pub health_data: HealthCounters,
    pub calibration: Calibration,
    pub thresholds: Thresholds,
    pub movement_history: Vec<MovementRecord>,
    pub errors: Vec<LogEntry>,
    pub warnings: Vec<LogEntry>,
    pub created_at: DateTime<Utc>,
    pub export_timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_priority() {
        let thresholds = Thresholds::default();
        let mut counters = HealthCounters::default();
        assert_eq!(HealthStatus::classify(&counters, &thresholds), HealthStatus::Healthy);

        counters.temperature = 65.0;
        assert_eq!(HealthStatus::classify(&counters, &thresholds), HealthStatus::Warning);

        counters.current = 1500.0;
        assert_eq!(HealthStatus::classify(&counters, &thresholds), HealthStatus::Critical);

        counters.error_count = 1;
        counters.temperature = 20.0;
        counters.current = 0.0;
        assert_eq!(HealthStatus::classify(&counters, &thresholds), HealthStatus::Error);
    }

    #[test]
    fn test_default_name_from_channel() {
        assert_eq!(ServoSpec::new(3).resolved_name(), "servo_3");
        assert_eq!(ServoSpec::new(3).named("hip").resolved_name(), "hip");
    }

    #[test]
    fn test_status_serializes_uppercase() {
        let json = serde_json::to_string(&HealthStatus::Critical).unwrap();
        assert_eq!(json, "\"CRITICAL\"");
    }
}
