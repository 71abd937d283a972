// Warning/critical bands for monitored servo metrics
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// °C
    pub temp_warning: f64,
    pub temp_critical: f64,
    /// mA
    pub current_warning: f64,
    pub current_critical: f64,
    /// degrees
    pub position_error_warning: f64,
    pub position_error_critical: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            temp_warning: 60.0,
            temp_critical: 75.0,
            current_warning: 800.0,
            current_critical: 1000.0,
            position_error_warning: 5.0,
            position_error_critical: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Critical,
}

impl Thresholds {
    pub fn temperature(&self, celsius: f64) -> Option<Severity> {
        band(celsius, self.temp_warning, self.temp_critical)
    }

    pub fn current(&self, milliamps: f64) -> Option<Severity> {
        band(milliamps, self.current_warning, self.current_critical)
    }

    /// Worst band reached by either temperature or current.
    pub fn worst(&self, celsius: f64, milliamps: f64) -> Option<Severity> {
        self.temperature(celsius).max(self.current(milliamps))
    }
}

/// Critical wins over warning; both bounds are inclusive.
fn band(value: f64, warning: f64, critical: f64) -> Option<Severity> {
    if value >= critical {
        Some(Severity::Critical)
    } else if value >= warning {
        Some(Severity::Warning)
    } else {
        None
    }
}
