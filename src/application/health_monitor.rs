// Health monitor - Polls registered servos, evaluates thresholds and raises alerts
use crate::application::health_source::HealthSource;
use crate::domain::alert::{
    ActuatorReport, Alert, AlertLevel, HealthRecord, HealthReport, HealthSummary,
    MonitorStatistics, StatusCounts, TrendMetric, TrendPoint,
};
use crate::domain::error::MonitorError;
use crate::domain::ring::BoundedLog;
use crate::domain::servo::{HealthSnapshot, HealthStatus};
use crate::domain::thresholds::{Severity, Thresholds};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const ALERT_LOG_SIZE: usize = 100;
const SUMMARY_ALERTS: usize = 10;
const REPORT_HISTORY: usize = 100;
const STOP_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub update_interval: Duration,
    pub history_size: usize,
    pub default_thresholds: Thresholds,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            update_interval: Duration::from_secs(1),
            history_size: 1000,
            default_thresholds: Thresholds::default(),
        }
    }
}

/// A monitored servo. The monitor only holds a weak reference; the caller owns the servo.
struct Registration {
    /// Distinguishes a re-registration under the same name
    id: u64,
    name: String,
    source: Weak<dyn HealthSource>,
    thresholds: Thresholds,
    registered_at: DateTime<Utc>,
    last_check: Option<DateTime<Utc>>,
    last_status: Option<HealthStatus>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RegistrationInfo {
    pub name: String,
    pub thresholds: Thresholds,
    pub registered_at: DateTime<Utc>,
    pub last_check: Option<DateTime<Utc>>,
    pub last_status: Option<HealthStatus>,
}

struct AlertLog {
    alerts: BoundedLog<Alert>,
    stats: MonitorStatistics,
}

struct MonitorTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct HealthMonitor {
    settings: MonitorSettings,
    registry: RwLock<Vec<Registration>>,
    history: Mutex<HashMap<String, BoundedLog<HealthRecord>>>,
    alerts: Mutex<AlertLog>,
    task: Mutex<Option<MonitorTask>>,
    next_id: AtomicU64,
}

impl HealthMonitor {
    pub fn new(settings: MonitorSettings) -> Self {
        tracing::info!(
            interval_secs = settings.update_interval.as_secs_f64(),
            history_size = settings.history_size,
            "Health monitor initialized"
        );

        Self {
            settings,
            registry: RwLock::new(Vec::new()),
            history: Mutex::new(HashMap::new()),
            alerts: Mutex::new(AlertLog {
                alerts: BoundedLog::new(ALERT_LOG_SIZE),
                stats: MonitorStatistics::new(),
            }),
            task: Mutex::new(None),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register a servo under its own name. Uses the default thresholds when none are given.
    pub async fn register(
        &self,
        source: Arc<dyn HealthSource>,
        thresholds: Option<Thresholds>,
    ) -> Result<(), MonitorError> {
        let name = source.name().to_string();
        let mut registry = self.registry.write().await;

        if registry.iter().any(|r| r.name == name) {
            tracing::warn!(actuator = %name, "Registration rejected: name already registered");
            return Err(MonitorError::AlreadyRegistered(name));
        }

        registry.push(Registration {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            name: name.clone(),
            source: Arc::downgrade(&source),
            thresholds: thresholds.unwrap_or(self.settings.default_thresholds),
            registered_at: Utc::now(),
            last_check: None,
            last_status: None,
        });
        self.history
            .lock()
            .await
            .insert(name.clone(), BoundedLog::new(self.settings.history_size));

        tracing::info!(actuator = %name, "Registered servo for monitoring");
        Ok(())
    }

    pub async fn unregister(&self, name: &str) -> Result<(), MonitorError> {
        let mut registry = self.registry.write().await;
        let Some(idx) = registry.iter().position(|r| r.name == name) else {
            return Err(MonitorError::NotRegistered(name.to_string()));
        };
        registry.remove(idx);
        self.history.lock().await.remove(name);
        drop(registry);

        tracing::info!(actuator = %name, "Unregistered servo");
        Ok(())
    }

    pub async fn set_thresholds(&self, name: &str, thresholds: Thresholds) -> Result<(), MonitorError> {
        let mut registry = self.registry.write().await;
        let registration = registry
            .iter_mut()
            .find(|r| r.name == name)
            .ok_or_else(|| MonitorError::NotRegistered(name.to_string()))?;
        registration.thresholds = thresholds;
        Ok(())
    }

    pub async fn registrations(&self) -> Vec<RegistrationInfo> {
        self.registry
            .read()
            .await
            .iter()
            .map(|r| RegistrationInfo {
                name: r.name.clone(),
                thresholds: r.thresholds,
                registered_at: r.registered_at,
                last_check: r.last_check,
                last_status: r.last_status,
            })
            .collect()
    }

    /// Spawn the background polling loop. Returns false if it is already running.
    pub async fn start_monitoring(self: &Arc<Self>) -> bool {
        let mut task = self.task.lock().await;
        if task.as_ref().is_some_and(|t| !t.handle.is_finished()) {
            tracing::warn!("Monitoring already running");
            return false;
        }

        let cancel = CancellationToken::new();
        let monitor = Arc::clone(self);
        let token = cancel.clone();
        let handle = tokio::spawn(async move { monitor.run(token).await });
        *task = Some(MonitorTask { cancel, handle });

        tracing::info!("Health monitoring started");
        true
    }

    /// Signal the polling loop to stop and wait (bounded) for it to exit.
    /// An in-flight check is allowed to finish.
    pub async fn stop_monitoring(&self) {
        let Some(task) = self.task.lock().await.take() else {
            return;
        };

        task.cancel.cancel();
        match tokio::time::timeout(STOP_TIMEOUT, task.handle).await {
            Ok(Ok(())) => tracing::info!("Health monitoring stopped"),
            Ok(Err(e)) => tracing::error!(error = %e, "Monitoring task ended abnormally"),
            Err(_) => tracing::warn!(
                timeout_secs = STOP_TIMEOUT.as_secs(),
                "Monitoring task did not stop in time"
            ),
        }
    }

    pub async fn is_monitoring(&self) -> bool {
        self.task
            .lock()
            .await
            .as_ref()
            .is_some_and(|t| !t.handle.is_finished())
    }

    async fn run(&self, cancel: CancellationToken) {
        loop {
            if cancel.is_cancelled() {
                break;
            }
            self.check_all().await;

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.settings.update_interval) => {}
            }
        }
        tracing::debug!("Monitoring loop exited");
    }

    /// Check every registered servo in registration order.
    pub async fn check_all(&self) {
        let names: Vec<String> = self.registry.read().await.iter().map(|r| r.name.clone()).collect();
        for name in names {
            self.check_actuator(&name).await;
        }
    }

    /// Poll one servo: record its snapshot, evaluate thresholds and raise alerts.
    /// Returns `None` when the servo is not registered (or was unregistered while
    /// it was being polled) or the check failed.
    pub async fn check_actuator(&self, name: &str) -> Option<HealthSnapshot> {
        // The registry lock is not held while the servo is polled
        let (id, source, thresholds) = {
            let registry = self.registry.read().await;
            let registration = registry.iter().find(|r| r.name == name)?;
            (registration.id, registration.source.clone(), registration.thresholds)
        };

        let result = match source.upgrade() {
            Some(source) => source.snapshot().await,
            None => Err(anyhow::anyhow!("servo is no longer available")),
        };

        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.raise(name, AlertLevel::Error, format!("Health check failed: {:#}", e))
                    .await;
                return None;
            }
        };

        let now = Utc::now();
        tracing::debug!(actuator = %name, status = %snapshot.status, "Health check");

        {
            // Lock order: registry, then history
            let mut registry = self.registry.write().await;
            let Some(registration) = registry.iter_mut().find(|r| r.id == id) else {
                tracing::debug!(actuator = %name, "Servo unregistered during check, result discarded");
                return None;
            };
            registration.last_check = Some(now);
            registration.last_status = Some(snapshot.status);

            if let Some(history) = self.history.lock().await.get_mut(name) {
                history.push(HealthRecord::from_snapshot(&snapshot, now));
            }
        }

        self.evaluate_thresholds(name, &snapshot, &thresholds).await;

        Some(snapshot)
    }

    pub async fn actuator_health(&self, name: &str) -> Option<HealthSnapshot> {
        self.check_actuator(name).await
    }

    pub async fn all_health(&self) -> BTreeMap<String, Option<HealthSnapshot>> {
        let names: Vec<String> = self.registry.read().await.iter().map(|r| r.name.clone()).collect();
        let mut health = BTreeMap::new();
        for name in names {
            let snapshot = self.check_actuator(&name).await;
            health.insert(name, snapshot);
        }
        health
    }

    async fn evaluate_thresholds(&self, name: &str, snapshot: &HealthSnapshot, thresholds: &Thresholds) {
        let temp = snapshot.health.temperature;
        let current = snapshot.health.current;

        match thresholds.temperature(temp) {
            Some(Severity::Critical) => {
                let message = format!(
                    "Temperature critical: {}°C (threshold: {}°C)",
                    temp, thresholds.temp_critical
                );
                self.raise(name, AlertLevel::Critical, message).await;
            }
            Some(Severity::Warning) => {
                let message = format!(
                    "Temperature high: {}°C (threshold: {}°C)",
                    temp, thresholds.temp_warning
                );
                self.raise(name, AlertLevel::Warning, message).await;
            }
            None => {}
        }

        match thresholds.current(current) {
            Some(Severity::Critical) => {
                let message = format!(
                    "Current critical: {}mA (threshold: {}mA)",
                    current, thresholds.current_critical
                );
                self.raise(name, AlertLevel::Critical, message).await;
            }
            Some(Severity::Warning) => {
                let message = format!(
                    "Current high: {}mA (threshold: {}mA)",
                    current, thresholds.current_warning
                );
                self.raise(name, AlertLevel::Warning, message).await;
            }
            None => {}
        }
    }

    async fn raise(&self, name: &str, level: AlertLevel, message: String) {
        match level {
            AlertLevel::Warning => tracing::warn!(actuator = %name, "{}", message),
            AlertLevel::Critical | AlertLevel::Error => {
                tracing::error!(actuator = %name, level = ?level, "{}", message)
            }
        }

        let mut log = self.alerts.lock().await;
        log.alerts.push(Alert::new(name, level, message));
        log.stats.count(level);
    }

    pub async fn summary(&self) -> HealthSummary {
        let mut counts = StatusCounts::default();
        let total_actuators = {
            let registry = self.registry.read().await;
            for registration in registry.iter() {
                counts.record(registration.last_status);
            }
            registry.len()
        };

        let log = self.alerts.lock().await;
        let now = Utc::now();
        let mut statistics = log.stats.clone();
        statistics.uptime_secs = (now - statistics.monitoring_start).num_milliseconds() as f64 / 1000.0;

        HealthSummary {
            timestamp: now,
            total_actuators,
            actuators_by_status: counts,
            recent_alerts: log.alerts.tail(SUMMARY_ALERTS),
            statistics,
        }
    }

    pub async fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().await.alerts.to_vec()
    }

    /// Values of `metric` recorded for `name` within the last `window`.
    pub async fn trends(&self, name: &str, metric: TrendMetric, window: Duration) -> Vec<TrendPoint> {
        let now = Utc::now();
        let cutoff = chrono::Duration::from_std(window)
            .ok()
            .and_then(|w| now.checked_sub_signed(w));

        let history = self.history.lock().await;
        let Some(records) = history.get(name) else {
            return Vec::new();
        };

        records
            .iter()
            .filter(|r| r.timestamp <= now && cutoff.is_none_or(|c| r.timestamp >= c))
            .map(|r| TrendPoint {
                timestamp: r.timestamp,
                value: r.value(metric),
            })
            .collect()
    }

    /// Full structured report. Each servo is checked fresh while building it.
    pub async fn export_report(&self) -> HealthReport {
        let names: Vec<String> = self.registry.read().await.iter().map(|r| r.name.clone()).collect();

        let mut actuators = BTreeMap::new();
        for name in names {
            let current_health = self.check_actuator(&name).await;
            let history = self
                .history
                .lock()
                .await
                .get(&name)
                .map(|h| h.tail(REPORT_HISTORY))
                .unwrap_or_default();
            actuators.insert(
                name,
                ActuatorReport {
                    current_health,
                    history,
                },
            );
        }

        HealthReport {
            generated_at: Utc::now(),
            summary: self.summary().await,
            actuators,
            alerts: self.alerts().await,
        }
    }

    pub async fn clear_alerts(&self) {
        self.alerts.lock().await.alerts.clear();
        tracing::info!("Alerts cleared");
    }

    pub async fn reset_statistics(&self) {
        self.alerts.lock().await.stats = MonitorStatistics::new();
        tracing::info!("Statistics reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::servo_controller::{MetricsUpdate, ServoController};
    use crate::domain::servo::{HealthCounters, ServoSpec};
    use async_trait::async_trait;

    struct BrokenSource;

    #[async_trait]
    impl HealthSource for BrokenSource {
        fn name(&self) -> &str {
            "broken"
        }

        async fn snapshot(&self) -> anyhow::Result<HealthSnapshot> {
            anyhow::bail!("sensor bus offline")
        }
    }

    /// Healthy source that takes `delay` to answer.
    struct SlowSource {
        name: String,
        delay: Duration,
    }

    #[async_trait]
    impl HealthSource for SlowSource {
        fn name(&self) -> &str {
            &self.name
        }

        async fn snapshot(&self) -> anyhow::Result<HealthSnapshot> {
            tokio::time::sleep(self.delay).await;
            Ok(snapshot_with_temp(&self.name, 25.0))
        }
    }

    fn slow(name: &str, delay_ms: u64) -> Arc<SlowSource> {
        Arc::new(SlowSource {
            name: name.to_string(),
            delay: Duration::from_millis(delay_ms),
        })
    }

    fn snapshot_with_temp(name: &str, temperature: f64) -> HealthSnapshot {
        HealthSnapshot {
            name: name.to_string(),
            channel: 0,
            current_angle: 90.0,
            target_angle: 90.0,
            is_moving: false,
            health: HealthCounters {
                temperature,
                ..Default::default()
            },
            uptime_secs: 0.0,
            status: HealthStatus::Healthy,
            warnings: Vec::new(),
            errors: Vec::new(),
            last_movement: None,
        }
    }

    fn servo(name: &str, channel: u8) -> Arc<ServoController> {
        Arc::new(ServoController::new(ServoSpec::new(channel).named(name), None).unwrap())
    }

    fn monitor() -> Arc<HealthMonitor> {
        Arc::new(HealthMonitor::new(MonitorSettings {
            update_interval: Duration::from_millis(20),
            ..Default::default()
        }))
    }

    async fn set_temp(servo: &ServoController, temperature: f64) {
        servo
            .update_health_metrics(MetricsUpdate {
                temperature: Some(temperature),
                ..Default::default()
            })
            .await;
    }

    #[tokio::test]
    async fn test_register_and_summary() {
        let monitor = monitor();
        let servos: Vec<_> = (0..3).map(|i| servo(&format!("leg_{}", i), i)).collect();
        for s in &servos {
            monitor.register(s.clone(), None).await.unwrap();
        }

        let summary = monitor.summary().await;
        assert_eq!(summary.total_actuators, 3);
        assert_eq!(summary.actuators_by_status.unknown, 3);

        monitor.check_all().await;
        let summary = monitor.summary().await;
        assert_eq!(summary.total_actuators, 3);
        assert_eq!(summary.actuators_by_status.total(), 3);
        assert_eq!(summary.actuators_by_status.healthy, 3);
    }

    #[tokio::test]
    async fn test_duplicate_name_is_rejected() {
        let monitor = monitor();
        let first = servo("hip", 0);
        let second = servo("hip", 1);

        monitor.register(first.clone(), None).await.unwrap();
        let result = monitor.register(second.clone(), None).await;
        assert_eq!(result, Err(MonitorError::AlreadyRegistered("hip".to_string())));
        assert_eq!(monitor.registrations().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unregister() {
        let monitor = monitor();
        let s = servo("knee", 0);
        monitor.register(s.clone(), None).await.unwrap();

        assert!(monitor.unregister("knee").await.is_ok());
        assert_eq!(
            monitor.unregister("knee").await,
            Err(MonitorError::NotRegistered("knee".to_string()))
        );
        assert!(monitor.check_actuator("knee").await.is_none());
    }

    #[tokio::test]
    async fn test_check_updates_registration() {
        let monitor = monitor();
        let s = servo("ankle", 0);
        monitor.register(s.clone(), None).await.unwrap();

        let snapshot = monitor.check_actuator("ankle").await.unwrap();
        assert_eq!(snapshot.status, HealthStatus::Healthy);

        let info = &monitor.registrations().await[0];
        assert!(info.last_check.is_some());
        assert_eq!(info.last_status, Some(HealthStatus::Healthy));
    }

    #[tokio::test]
    async fn test_critical_suppresses_warning_for_same_metric() {
        let monitor = monitor();
        let s = servo("hot", 0);
        monitor.register(s.clone(), None).await.unwrap();
        set_temp(&s, 80.0).await;

        monitor.check_actuator("hot").await.unwrap();
        let alerts = monitor.alerts().await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].level, AlertLevel::Critical);
        assert!(alerts[0].message.contains("Temperature critical"));

        let stats = monitor.summary().await.statistics;
        assert_eq!(stats.critical_alerts, 1);
        assert_eq!(stats.warnings, 0);
    }

    #[tokio::test]
    async fn test_temperature_and_current_evaluated_independently() {
        let monitor = monitor();
        let s = servo("busy", 0);
        monitor.register(s.clone(), None).await.unwrap();
        s.update_health_metrics(MetricsUpdate {
            temperature: Some(65.0),
            current: Some(1200.0),
            ..Default::default()
        })
        .await;

        monitor.check_actuator("busy").await.unwrap();
        let levels: Vec<_> = monitor.alerts().await.iter().map(|a| a.level).collect();
        assert_eq!(levels, vec![AlertLevel::Warning, AlertLevel::Critical]);
    }

    #[tokio::test]
    async fn test_custom_thresholds() {
        let monitor = monitor();
        let s = servo("tuned", 0);
        let thresholds = Thresholds {
            temp_warning: 30.0,
            ..Default::default()
        };
        monitor.register(s.clone(), Some(thresholds)).await.unwrap();
        set_temp(&s, 35.0).await;

        monitor.check_actuator("tuned").await.unwrap();
        let alerts = monitor.alerts().await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].level, AlertLevel::Warning);

        monitor.set_thresholds("tuned", Thresholds::default()).await.unwrap();
        monitor.check_actuator("tuned").await.unwrap();
        assert_eq!(monitor.alerts().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_check_raises_error_alert_and_continues() {
        let monitor = monitor();
        let broken = Arc::new(BrokenSource);
        let healthy = servo("healthy", 1);
        monitor.register(broken.clone(), None).await.unwrap();
        monitor.register(healthy.clone(), None).await.unwrap();

        monitor.check_all().await;

        let alerts = monitor.alerts().await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].level, AlertLevel::Error);
        assert_eq!(alerts[0].actuator, "broken");
        assert!(alerts[0].message.contains("sensor bus offline"));

        let registrations = monitor.registrations().await;
        assert_eq!(registrations[0].last_status, None);
        assert_eq!(registrations[1].last_status, Some(HealthStatus::Healthy));
    }

    #[tokio::test]
    async fn test_dropped_servo_raises_error_alert() {
        let monitor = monitor();
        let s = servo("gone", 0);
        monitor.register(s.clone(), None).await.unwrap();
        drop(s);

        assert!(monitor.check_actuator("gone").await.is_none());
        assert_eq!(monitor.alerts().await[0].level, AlertLevel::Error);
    }

    #[tokio::test]
    async fn test_trends_respect_window() {
        let monitor = monitor();
        let s = servo("trend", 0);
        monitor.register(s.clone(), None).await.unwrap();

        let stale = HealthRecord::from_snapshot(
            &snapshot_with_temp("trend", 99.0),
            Utc::now() - chrono::Duration::seconds(120),
        );
        monitor
            .history
            .lock()
            .await
            .get_mut("trend")
            .unwrap()
            .push(stale);

        set_temp(&s, 42.0).await;
        monitor.check_actuator("trend").await.unwrap();

        let points = monitor
            .trends("trend", TrendMetric::Temperature, Duration::from_secs(60))
            .await;
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].value, 42.0);

        let all = monitor
            .trends("trend", TrendMetric::Temperature, Duration::from_secs(600))
            .await;
        assert_eq!(all.len(), 2);

        assert!(monitor.trends("missing", TrendMetric::Angle, Duration::from_secs(60)).await.is_empty());
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let monitor = Arc::new(HealthMonitor::new(MonitorSettings {
            history_size: 5,
            ..Default::default()
        }));
        let s = servo("ring", 0);
        monitor.register(s.clone(), None).await.unwrap();

        for _ in 0..8 {
            monitor.check_actuator("ring").await.unwrap();
        }

        let points = monitor
            .trends("ring", TrendMetric::Angle, Duration::from_secs(60))
            .await;
        assert_eq!(points.len(), 5);
    }

    #[tokio::test]
    async fn test_summary_keeps_last_ten_alerts() {
        let monitor = monitor();
        let s = servo("noisy", 0);
        monitor.register(s.clone(), None).await.unwrap();
        set_temp(&s, 65.0).await;

        for _ in 0..15 {
            monitor.check_actuator("noisy").await.unwrap();
        }

        let summary = monitor.summary().await;
        assert_eq!(summary.recent_alerts.len(), SUMMARY_ALERTS);
        assert_eq!(summary.statistics.total_alerts, 15);
        assert_eq!(summary.statistics.warnings, 15);
        assert_eq!(summary.actuators_by_status.error, 0);
        assert_eq!(summary.actuators_by_status.warning, 1);
    }

    #[tokio::test]
    async fn test_alert_log_keeps_last_hundred() {
        let monitor = monitor();
        let s = servo("chatty", 0);
        monitor.register(s.clone(), None).await.unwrap();

        for i in 0..ALERT_LOG_SIZE + 5 {
            s.update_health_metrics(MetricsUpdate {
                current: Some(800.0 + i as f64),
                ..Default::default()
            })
            .await;
            monitor.check_actuator("chatty").await.unwrap();
        }

        let alerts = monitor.alerts().await;
        assert_eq!(alerts.len(), ALERT_LOG_SIZE);
        // The five oldest (800..=804 mA) were evicted
        assert!(alerts[0].message.starts_with("Current high: 805mA"));
        assert!(alerts[ALERT_LOG_SIZE - 1].message.starts_with("Current high: 904mA"));
        assert_eq!(monitor.summary().await.statistics.total_alerts, 105);
    }

    #[tokio::test]
    async fn test_unregister_during_check_discards_result() {
        let monitor = monitor();
        let source = slow("sluggish", 100);
        monitor.register(source.clone(), None).await.unwrap();

        let check = {
            let monitor = monitor.clone();
            tokio::spawn(async move { monitor.check_actuator("sluggish").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        monitor.unregister("sluggish").await.unwrap();

        assert!(check.await.unwrap().is_none());
        assert!(monitor.registrations().await.is_empty());
        assert!(!monitor.history.lock().await.contains_key("sluggish"));

        // A later registration under the same name starts with no history
        monitor.register(source.clone(), None).await.unwrap();
        let points = monitor
            .trends("sluggish", TrendMetric::Temperature, Duration::from_secs(60))
            .await;
        assert!(points.is_empty());
    }

    #[tokio::test]
    async fn test_reregister_during_check_discards_stale_result() {
        let monitor = monitor();
        let source = slow("sluggish", 100);
        monitor.register(source.clone(), None).await.unwrap();

        let check = {
            let monitor = monitor.clone();
            tokio::spawn(async move { monitor.check_actuator("sluggish").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        monitor.unregister("sluggish").await.unwrap();
        monitor.register(source.clone(), None).await.unwrap();

        assert!(check.await.unwrap().is_none());
        assert_eq!(monitor.registrations().await[0].last_check, None);
        let points = monitor
            .trends("sluggish", TrendMetric::Temperature, Duration::from_secs(60))
            .await;
        assert!(points.is_empty());
    }

    #[tokio::test]
    async fn test_registry_is_usable_during_check_pass() {
        let monitor = monitor();
        let source = slow("sluggish", 200);
        monitor.register(source.clone(), None).await.unwrap();
        let extra = servo("extra", 1);

        let pass = {
            let monitor = monitor.clone();
            tokio::spawn(async move { monitor.check_all().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let registered = tokio::time::timeout(
            Duration::from_millis(50),
            monitor.register(extra.clone(), None),
        )
        .await;
        assert_eq!(registered, Ok(Ok(())));
        assert_eq!(monitor.registrations().await.len(), 2);

        let unregistered = tokio::time::timeout(Duration::from_millis(50), monitor.unregister("extra")).await;
        assert_eq!(unregistered, Ok(Ok(())));
        assert!(!pass.is_finished());

        pass.await.unwrap();
        let registrations = monitor.registrations().await;
        assert_eq!(registrations.len(), 1);
        assert_eq!(registrations[0].last_status, Some(HealthStatus::Healthy));
    }

    #[tokio::test]
    async fn test_clear_alerts_and_reset_statistics() {
        let monitor = monitor();
        let s = servo("reset", 0);
        monitor.register(s.clone(), None).await.unwrap();
        set_temp(&s, 90.0).await;
        monitor.check_actuator("reset").await.unwrap();

        monitor.clear_alerts().await;
        assert!(monitor.alerts().await.is_empty());
        assert_eq!(monitor.summary().await.statistics.total_alerts, 1);

        monitor.reset_statistics().await;
        let stats = monitor.summary().await.statistics;
        assert_eq!(stats.total_alerts, 0);
        assert_eq!(stats.critical_alerts, 0);
    }

    #[tokio::test]
    async fn test_start_and_stop_monitoring() {
        let monitor = monitor();
        let s = servo("polled", 0);
        monitor.register(s.clone(), None).await.unwrap();

        assert!(monitor.start_monitoring().await);
        assert!(!monitor.start_monitoring().await);
        assert!(monitor.is_monitoring().await);

        tokio::time::sleep(Duration::from_millis(100)).await;
        monitor.stop_monitoring().await;
        assert!(!monitor.is_monitoring().await);

        let checked = monitor
            .trends("polled", TrendMetric::Angle, Duration::from_secs(60))
            .await
            .len();
        assert!(checked >= 2);

        // Restart after stop is allowed
        assert!(monitor.start_monitoring().await);
        monitor.stop_monitoring().await;
    }

    #[tokio::test]
    async fn test_export_report() {
        let monitor = monitor();
        let a = servo("a", 0);
        let b = servo("b", 1);
        monitor.register(a.clone(), None).await.unwrap();
        monitor.register(b.clone(), None).await.unwrap();
        monitor.check_all().await;

        let report = monitor.export_report().await;
        assert_eq!(report.actuators.len(), 2);
        assert_eq!(report.actuators["a"].history.len(), 2);
        assert!(report.actuators["b"].current_health.is_some());
        assert_eq!(report.summary.total_actuators, 2);

        let all = monitor.all_health().await;
        assert_eq!(all.len(), 2);
        assert!(all.values().all(|h| h.is_some()));
    }
}
