use crate::application::health_monitor::MonitorSettings;
use crate::domain::servo::ServoSpec;
use crate::domain::thresholds::Thresholds;
use anyhow::Context;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub servos: Vec<ServoSpec>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MonitorConfig {
    pub update_interval_secs: f64,
    pub history_size: usize,
    pub data_dir: String,
    pub thresholds: Thresholds,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            update_interval_secs: 1.0,
            history_size: 1000,
            data_dir: "data/health".to_string(),
            thresholds: Thresholds::default(),
        }
    }
}

impl MonitorConfig {
    pub fn settings(&self) -> anyhow::Result<MonitorSettings> {
        let update_interval = Duration::try_from_secs_f64(self.update_interval_secs)
            .with_context(|| format!("invalid update_interval_secs: {}", self.update_interval_secs))?;
        if update_interval.is_zero() {
            anyhow::bail!("update_interval_secs must be greater than zero");
        }

        Ok(MonitorSettings {
            update_interval,
            history_size: self.history_size,
            default_thresholds: self.thresholds,
        })
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CalibrationConfig {
    pub dir: String,
    pub profile: Option<String>,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            dir: "data/calibrations".to_string(),
            profile: None,
        }
    }
}

impl AppConfig {
    fn validate(&self) -> anyhow::Result<()> {
        self.monitor.settings()?;

        let mut names = HashSet::new();
        for servo in &self.servos {
            let name = servo.resolved_name();
            if servo.min_angle.partial_cmp(&servo.max_angle) != Some(std::cmp::Ordering::Less) {
                anyhow::bail!(
                    "servo {}: min_angle {} must be less than max_angle {}",
                    name,
                    servo.min_angle,
                    servo.max_angle
                );
            }
            if !names.insert(name.clone()) {
                anyhow::bail!("servo name '{}' is configured more than once", name);
            }
        }

        Ok(())
    }
}

pub fn load_config() -> anyhow::Result<AppConfig> {
    load_config_from("config/servos")
}

/// Layer the (optional) config file under `SERVO_HEALTH__*` environment overrides.
pub fn load_config_from(path: &str) -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(config::Environment::with_prefix("SERVO_HEALTH").separator("__"))
        .build()?;

    let app_config: AppConfig = settings.try_deserialize()?;
    app_config.validate()?;
    Ok(app_config)
}
