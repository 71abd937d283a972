// Servo controller - Position, calibration, movement history and health for one servo
use crate::application::health_source::HealthSource;
use crate::application::servo_driver::ServoDriver;
use crate::domain::calibration::Calibration;
use crate::domain::error::ActuatorError;
use crate::domain::ring::BoundedLog;
use crate::domain::servo::{
    HealthCounters, HealthSnapshot, HealthStatus, LogEntry, MovementRecord, MovementStats,
    ServoExport, ServoInfo, ServoSpec, ServoState,
};
use crate::domain::thresholds::{Severity, Thresholds};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const MOVEMENT_HISTORY_SIZE: usize = 100;
const LOG_SIZE: usize = 100;

/// How a move should be timed. `duration` wins over `speed`; with neither the
/// servo's default speed is used.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveOptions {
    /// seconds
    pub duration: Option<f64>,
    /// degrees/second
    pub speed: Option<f64>,
    /// Wait for the move to finish before returning
    pub blocking: bool,
}

impl MoveOptions {
    pub fn with_duration(duration: f64) -> Self {
        Self {
            duration: Some(duration),
            ..Self::default()
        }
    }

    pub fn with_speed(speed: f64) -> Self {
        Self {
            speed: Some(speed),
            ..Self::default()
        }
    }

    pub fn blocking(mut self) -> Self {
        self.blocking = true;
        self
    }
}

/// Sensor readings to record; `None` fields keep their previous value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricsUpdate {
    pub temperature: Option<f64>,
    pub current: Option<f64>,
    pub voltage: Option<f64>,
}

#[derive(Debug)]
struct ControllerState {
    current_angle: f64,
    target_angle: f64,
    is_moving: bool,
    /// Bumped on every accepted move so a blocking wait can tell if it was superseded
    move_seq: u64,
    calibration: Calibration,
    thresholds: Thresholds,
    health: HealthCounters,
    history: BoundedLog<MovementRecord>,
    errors: BoundedLog<LogEntry>,
    warnings: BoundedLog<LogEntry>,
}

impl ControllerState {
    fn log_error(&mut self, servo: &str, message: String) {
        tracing::error!(servo = %servo, "{}", message);
        self.errors.push(LogEntry::now(message));
        self.health.error_count += 1;
    }

    fn log_warning(&mut self, servo: &str, message: String) {
        tracing::warn!(servo = %servo, "{}", message);
        self.warnings.push(LogEntry::now(message));
        self.health.warning_count += 1;
    }
}

pub struct ServoController {
    info: ServoInfo,
    driver: Option<Arc<dyn ServoDriver>>,
    created_at: DateTime<Utc>,
    state: Arc<Mutex<ControllerState>>,
}

impl std::fmt::Debug for ServoController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServoController")
            .field("info", &self.info)
            .field("has_driver", &self.driver.is_some())
            .finish()
    }
}

impl ServoController {
    pub fn new(spec: ServoSpec, driver: Option<Arc<dyn ServoDriver>>) -> Result<Self, ActuatorError> {
        // Also rejects NaN bounds
        if spec.min_angle.partial_cmp(&spec.max_angle) != Some(std::cmp::Ordering::Less) {
            return Err(ActuatorError::InvalidRange {
                min: spec.min_angle,
                max: spec.max_angle,
            });
        }

        let info = ServoInfo {
            name: spec.resolved_name(),
            channel: spec.channel,
            min_angle: spec.min_angle,
            max_angle: spec.max_angle,
            default_speed: spec.default_speed,
        };
        let center = (spec.min_angle + spec.max_angle) / 2.0;

        tracing::info!(servo = %info.name, channel = info.channel, "Servo controller initialized");

        Ok(Self {
            info,
            driver,
            created_at: Utc::now(),
            state: Arc::new(Mutex::new(ControllerState {
                current_angle: center,
                target_angle: center,
                is_moving: false,
                move_seq: 0,
                calibration: Calibration::default(),
                thresholds: spec.thresholds.unwrap_or_default(),
                health: HealthCounters::default(),
                history: BoundedLog::new(MOVEMENT_HISTORY_SIZE),
                errors: BoundedLog::new(LOG_SIZE),
                warnings: BoundedLog::new(LOG_SIZE),
            })),
        })
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Move to `angle` (commanded degrees, before calibration).
    ///
    /// The raw angle must lie within the safe range; the calibrated angle is
    /// clamped into it. Every failure is also recorded in the error log.
    pub async fn move_to(&self, angle: f64, options: MoveOptions) -> Result<MovementRecord, ActuatorError> {
        let ServoInfo {
            min_angle,
            max_angle,
            channel,
            ..
        } = self.info;

        let mut state = self.state.lock().await;

        if !(min_angle..=max_angle).contains(&angle) {
            let err = ActuatorError::AngleOutOfRange {
                angle,
                min: min_angle,
                max: max_angle,
            };
            state.log_error(&self.info.name, err.to_string());
            return Err(err);
        }

        let calibrated = state.calibration.apply(angle, min_angle, max_angle);
        let distance = (calibrated - state.current_angle).abs();
        let (speed, duration) = resolve_motion(distance, options, self.info.default_speed);

        let record = MovementRecord {
            timestamp: Utc::now(),
            from_angle: state.current_angle,
            to_angle: calibrated,
            distance,
            speed,
            duration,
        };
        state.history.push(record.clone());
        state.health.total_movements += 1;
        state.health.total_distance += distance;

        if let Some(driver) = &self.driver {
            if let Err(e) = driver.set_position(channel, calibrated).await {
                let err = ActuatorError::Driver(e.to_string());
                state.log_error(&self.info.name, err.to_string());
                return Err(err);
            }
        }

        state.target_angle = calibrated;
        state.move_seq += 1;

        let wait = Duration::try_from_secs_f64(duration).unwrap_or(Duration::ZERO);
        if !options.blocking || wait.is_zero() {
            // No position feedback exists, so a non-blocking move completes immediately
            state.current_angle = calibrated;
            state.is_moving = false;
            return Ok(record);
        }

        state.is_moving = true;
        let seq = state.move_seq;
        drop(state);

        // The servo settles even if the caller stops waiting
        let settle = tokio::spawn(settle_move(
            Arc::clone(&self.state),
            self.info.name.clone(),
            seq,
            calibrated,
            wait,
        ));
        if let Err(e) = settle.await {
            tracing::error!(servo = %self.info.name, error = %e, "Move completion task failed");
        }

        Ok(record)
    }

    /// Replace the calibration wholesale. Degenerate parameters are rejected and
    /// the previous calibration stays in effect.
    pub async fn set_calibration(&self, offset: f64, scale: f64, trim: f64) -> Result<(), ActuatorError> {
        let mut state = self.state.lock().await;

        match Calibration::new(offset, scale, trim) {
            Ok(mut calibration) => {
                calibration.applied_at = Some(Utc::now());
                state.calibration = calibration;
                tracing::info!(servo = %self.info.name, offset, scale, trim, "Calibration updated");
                Ok(())
            }
            Err(err) => {
                state.log_error(&self.info.name, err.to_string());
                Err(err)
            }
        }
    }

    pub async fn calibration(&self) -> Calibration {
        self.state.lock().await.calibration.clone()
    }

    pub async fn set_thresholds(&self, thresholds: Thresholds) {
        self.state.lock().await.thresholds = thresholds;
    }

    /// Record sensor readings. Every reading at or above a threshold is logged,
    /// even if the previous reading was already above it.
    pub async fn update_health_metrics(&self, update: MetricsUpdate) {
        let mut state = self.state.lock().await;
        let name = &self.info.name;

        if let Some(temperature) = update.temperature {
            state.health.temperature = temperature;
            match state.thresholds.temperature(temperature) {
                Some(Severity::Critical) => {
                    state.log_error(name, format!("CRITICAL: Temperature {}°C", temperature))
                }
                Some(Severity::Warning) => {
                    state.log_warning(name, format!("High temperature: {}°C", temperature))
                }
                None => {}
            }
        }

        if let Some(current) = update.current {
            state.health.current = current;
            match state.thresholds.current(current) {
                Some(Severity::Critical) => {
                    state.log_error(name, format!("CRITICAL: Current {}mA", current))
                }
                Some(Severity::Warning) => {
                    state.log_warning(name, format!("High current: {}mA", current))
                }
                None => {}
            }
        }

        if let Some(voltage) = update.voltage {
            state.health.voltage = voltage;
        }
    }

    pub async fn health_status(&self) -> HealthSnapshot {
        let state = self.state.lock().await;

        HealthSnapshot {
            name: self.info.name.clone(),
            channel: self.info.channel,
            current_angle: state.current_angle,
            target_angle: state.target_angle,
            is_moving: state.is_moving,
            health: state.health.clone(),
            uptime_secs: self.uptime_secs(),
            status: HealthStatus::classify(&state.health, &state.thresholds),
            warnings: state.warnings.to_vec(),
            errors: state.errors.to_vec(),
            last_movement: state.history.last().cloned(),
        }
    }

    pub async fn movement_stats(&self) -> MovementStats {
        let state = self.state.lock().await;

        let speeds: Vec<f64> = state
            .history
            .iter()
            .map(|m| m.speed)
            .filter(|speed| *speed > 0.0)
            .collect();
        let average_speed = if speeds.is_empty() {
            0.0
        } else {
            speeds.iter().sum::<f64>() / speeds.len() as f64
        };

        MovementStats {
            total_movements: state.health.total_movements,
            total_distance: state.health.total_distance,
            average_speed,
            last_movement: state.history.last().cloned(),
            uptime_secs: self.uptime_secs(),
        }
    }

    /// Clear error/warning counters and logs. Movement totals are kept.
    pub async fn reset_health_counters(&self) {
        let mut state = self.state.lock().await;
        state.health.error_count = 0;
        state.health.warning_count = 0;
        state.errors.clear();
        state.warnings.clear();

        tracing::info!(servo = %self.info.name, "Health counters reset");
    }

    pub async fn export_snapshot(&self) -> ServoExport {
        let state = self.state.lock().await;

        ServoExport {
            servo_info: self.info.clone(),
            current_state: ServoState {
                current_angle: state.current_angle,
                target_angle: state.target_angle,
                is_moving: state.is_moving,
            },
            health_data: state.health.clone(),
            calibration: state.calibration.clone(),
            thresholds: state.thresholds,
            movement_history: state.history.to_vec(),
            errors: state.errors.to_vec(),
            warnings: state.warnings.to_vec(),
            created_at: self.created_at,
            export_timestamp: Utc::now(),
        }
    }

    fn uptime_secs(&self) -> f64 {
        (Utc::now() - self.created_at).num_milliseconds() as f64 / 1000.0
    }
}

#[async_trait]
impl HealthSource for ServoController {
    fn name(&self) -> &str {
        &self.info.name
    }

    async fn snapshot(&self) -> anyhow::Result<HealthSnapshot> {
        Ok(self.health_status().await)
    }
}

/// Finish a blocking move after `wait`, unless a newer move was accepted meanwhile.
async fn settle_move(state: Arc<Mutex<ControllerState>>, servo: String, seq: u64, angle: f64, wait: Duration) {
    tokio::time::sleep(wait).await;

    let mut state = state.lock().await;
    if state.move_seq == seq {
        state.current_angle = angle;
        state.is_moving = false;
    } else {
        tracing::debug!(servo = %servo, "Blocking move superseded by a newer command");
    }
}

/// Resolve (speed, duration) for a move. Explicit values are kept verbatim.
fn resolve_motion(distance: f64, options: MoveOptions, default_speed: f64) -> (f64, f64) {
    if let Some(duration) = options.duration {
        let speed = if duration > 0.0 { distance / duration } else { default_speed };
        (speed, duration)
    } else if let Some(speed) = options.speed {
        let duration = if speed > 0.0 { distance / speed } else { 0.0 };
        (speed, duration)
    } else {
        let duration = if default_speed > 0.0 { distance / default_speed } else { 0.0 };
        (default_speed, duration)
    }
}
