// Calibration profiles - Named sets of per-servo calibrations persisted as JSON
use crate::application::servo_controller::ServoController;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationEntry {
    pub servo_name: String,
    pub offset: f64,
    pub scale: f64,
    pub trim: f64,
    pub calibrated_at: DateTime<Utc>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CalibrationEntry {
    pub fn new(servo_name: &str, offset: f64, scale: f64, trim: f64) -> Self {
        Self {
            servo_name: servo_name.to_string(),
            offset,
            scale,
            trim,
            calibrated_at: Utc::now(),
            method: None,
            notes: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ProfileFile {
    profile_name: String,
    created_at: DateTime<Utc>,
    servo_count: usize,
    servos: BTreeMap<String, CalibrationEntry>,
}

#[derive(Debug)]
pub struct CalibrationStore {
    dir: PathBuf,
    entries: BTreeMap<String, CalibrationEntry>,
    current_profile: Option<String>,
}

impl CalibrationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            entries: BTreeMap::new(),
            current_profile: None,
        }
    }

    pub fn insert(&mut self, entry: CalibrationEntry) {
        self.entries.insert(entry.servo_name.clone(), entry);
    }

    pub fn get(&self, servo_name: &str) -> Option<&CalibrationEntry> {
        self.entries.get(servo_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current_profile(&self) -> Option<&str> {
        self.current_profile.as_deref()
    }

    fn profile_path(&self, profile_name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", profile_name))
    }

    /// Write all entries as `<dir>/<profile>.json`. Defaults to a timestamped profile name.
    pub async fn save(&mut self, profile_name: Option<&str>) -> anyhow::Result<PathBuf> {
        if self.entries.is_empty() {
            anyhow::bail!("no calibration data to save");
        }

        let profile_name = profile_name
            .map(str::to_string)
            .unwrap_or_else(|| format!("calibration_{}", Utc::now().format("%Y%m%d_%H%M%S")));
        let path = self.profile_path(&profile_name);

        let file = ProfileFile {
            profile_name: profile_name.clone(),
            created_at: Utc::now(),
            servo_count: self.entries.len(),
            servos: self.entries.clone(),
        };

        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let json = serde_json::to_string_pretty(&file)?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::info!(profile = %profile_name, path = %path.display(), "Calibration saved");
        self.current_profile = Some(profile_name);
        Ok(path)
    }

    /// Replace the in-memory entries with a saved profile.
    pub async fn load(&mut self, profile_name: &str) -> anyhow::Result<()> {
        let path = self.profile_path(profile_name);
        let json = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Calibration file not found: {}", path.display()))?;
        let file: ProfileFile = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        tracing::info!(
            profile = %profile_name,
            servos = file.servos.len(),
            created_at = %file.created_at,
            "Calibration loaded"
        );
        self.entries = file.servos;
        self.current_profile = Some(profile_name.to_string());
        Ok(())
    }

    /// Profile names (file stems) available in the store directory, sorted.
    pub async fn list_profiles(&self) -> anyhow::Result<Vec<String>> {
        if !tokio::fs::try_exists(&self.dir).await? {
            return Ok(Vec::new());
        }

        let mut profiles = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    profiles.push(stem.to_string());
                }
            }
        }
        profiles.sort();
        Ok(profiles)
    }

    /// Push the stored calibration for `servo` into the controller.
    pub async fn apply_to(&self, servo: &ServoController) -> anyhow::Result<()> {
        let entry = self
            .get(servo.name())
            .with_context(|| format!("No calibration found for {}", servo.name()))?;

        servo
            .set_calibration(entry.offset, entry.scale, entry.trim)
            .await
            .with_context(|| format!("Failed to apply calibration to {}", servo.name()))?;

        tracing::info!(servo = %servo.name(), "Calibration applied");
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
