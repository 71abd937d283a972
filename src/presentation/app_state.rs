// Application state for HTTP handlers
use crate::application::health_monitor::HealthMonitor;
use crate::application::servo_controller::ServoController;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub monitor: Arc<HealthMonitor>,
    pub servos: HashMap<String, Arc<ServoController>>,
}
