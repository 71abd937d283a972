// Domain errors for servo control and fleet monitoring
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActuatorError {
    #[error("Invalid angle: {angle}° (range: {min}-{max})")]
    AngleOutOfRange { angle: f64, min: f64, max: f64 },

    #[error("Servo movement failed: {0}")]
    Driver(String),

    #[error("Invalid calibration: {0}")]
    InvalidCalibration(String),

    #[error("Invalid range: min_angle {min} must be less than max_angle {max}")]
    InvalidRange { min: f64, max: f64 },
}

/// Failure reported by a hardware driver when it cannot position a channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("channel {channel}: {reason}")]
pub struct DriverError {
    pub channel: u8,
    pub reason: String,
}

impl DriverError {
    pub fn new(channel: u8, reason: impl Into<String>) -> Self {
        Self {
            channel,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorError {
    #[error("actuator '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("actuator '{0}' is not registered")]
    NotRegistered(String),

    #[error("unknown trend metric '{0}' (expected temperature, current, voltage or angle)")]
    UnknownMetric(String),
}
