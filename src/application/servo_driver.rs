// Hardware driver trait for positioning a servo channel
use crate::domain::error::DriverError;
use async_trait::async_trait;

#[async_trait]
pub trait ServoDriver: Send + Sync {
    /// Command the servo on `channel` to the given physical angle in degrees.
    async fn set_position(&self, channel: u8, angle: f64) -> Result<(), DriverError>;
}
