// Domain layer - Servo state, health and alert models
pub mod alert;
pub mod calibration;
pub mod error;
pub mod ring;
pub mod servo;
pub mod thresholds;
