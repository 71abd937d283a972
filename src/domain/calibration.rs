// Calibration model and the commanded-to-physical angle transform
use crate::domain::error::ActuatorError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Angle offset in degrees
    pub offset: f64,
    /// Scaling factor (1.0 = no scaling)
    pub scale: f64,
    /// Fine-tuning trim in degrees
    pub trim: f64,
    pub applied_at: Option<DateTime<Utc>>,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            offset: 0.0,
            scale: 1.0,
            trim: 0.0,
            applied_at: None,
        }
    }
}

impl Calibration {
    /// Build a calibration, rejecting parameters that would collapse or fold the range.
    pub fn new(offset: f64, scale: f64, trim: f64) -> Result<Self, ActuatorError> {
        if !offset.is_finite() || !trim.is_finite() {
            return Err(ActuatorError::InvalidCalibration(format!(
                "offset and trim must be finite (offset={}, trim={})",
                offset, trim
            )));
        }
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ActuatorError::InvalidCalibration(format!(
                "scale must be a positive number, got {}",
                scale
            )));
        }

        Ok(Self {
            offset,
            scale,
            trim,
            applied_at: None,
        })
    }

    /// Map a commanded angle to a physical one, clamped into `[min_angle, max_angle]`.
    pub fn apply(&self, angle: f64, min_angle: f64, max_angle: f64) -> f64 {
        let calibrated = angle * self.scale + self.offset + self.trim;
        calibrated.clamp(min_angle, max_angle)
    }
}
