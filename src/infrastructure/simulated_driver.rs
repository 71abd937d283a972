// Simulated servo driver for running without hardware
use crate::application::servo_driver::ServoDriver;
use crate::domain::error::DriverError;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
pub struct SimulatedDriver {
    positions: Mutex<HashMap<u8, f64>>,
}

impl SimulatedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn last_position(&self, channel: u8) -> Option<f64> {
        self.positions.lock().await.get(&channel).copied()
    }
}

#[async_trait]
impl ServoDriver for SimulatedDriver {
    async fn set_position(&self, channel: u8, angle: f64) -> Result<(), DriverError> {
        if !angle.is_finite() {
            return Err(DriverError::new(channel, format!("cannot command angle {}", angle)));
        }

        tracing::debug!(channel, angle, "Simulated servo command");
        self.positions.lock().await.insert(channel, angle);
        Ok(())
    }
}
