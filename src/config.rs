// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application settings.
//!
//! Settings are read from a YAML file in the per-user config directory
//! (or the path in `MAPPINS_CONFIG`). Every field has a default, so a
//! missing file or a partial file is fine.

use crate::models::pan_zoom::validate_zoom_steps;
use crate::util::geometry::Point;
use crate::util::transform::RenderMode;
use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the settings file location.
pub const CONFIG_ENV_VAR: &str = "MAPPINS_CONFIG";

const CONFIG_FILE_NAME: &str = "mappins.yaml";

fn is_positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

/// Seconds to a `Duration`, using `fallback` for values that cannot be
/// represented.
fn seconds(secs: f32, fallback: Duration) -> Duration {
    Duration::try_from_secs_f32(secs).unwrap_or(fallback)
}

/// Per-user directories for this application.
pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "mappins", "mappins")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Name of the pin save file
    pub save_file_name: String,
    /// Directory for the save file; the per-user data directory if unset
    pub save_dir: Option<PathBuf>,
    pub auto_save: bool,
    pub auto_save_interval_secs: f32,
    pub auto_load_on_start: bool,
    /// Delay before the startup load runs
    pub load_delay_secs: f32,
    /// Clear existing pins before inserting loaded ones
    pub load_replaces: bool,
    pub zoom_steps: Vec<f32>,
    pub drag_multiplier: f32,
    /// Map image shown on startup
    pub map_image: Option<PathBuf>,
    /// Map size used when no image is loaded
    pub map_size: [f32; 2],
    /// Screen offset of the pin panel from its pin
    pub panel_offset: [f32; 2],
    pub render_mode: RenderMode,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            save_file_name: "map_pins_data.json".to_string(),
            save_dir: None,
            auto_save: true,
            auto_save_interval_secs: 30.0,
            auto_load_on_start: true,
            load_delay_secs: 0.0,
            load_replaces: false,
            zoom_steps: vec![1.0, 1.5, 2.0, 3.0],
            drag_multiplier: 1.0,
            map_image: None,
            map_size: [1024.0, 768.0],
            panel_offset: [150.0, 0.0],
            render_mode: RenderMode::Overlay,
        }
    }
}

impl MapConfig {
    /// Default settings file location.
    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return Some(PathBuf::from(path));
        }
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Read and validate settings from a YAML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        let config: MapConfig = serde_yaml::from_str(&yaml)
            .with_context(|| format!("parsing settings in {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load settings, falling back to defaults on any problem.
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            log::warn!("No config directory available, using default settings");
            return Self::default();
        };
        if !path.exists() {
            log::info!("No settings file at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => {
                log::info!("Loaded settings from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring settings file: {:#}", e);
                Self::default()
            }
        }
    }

    /// Write settings as YAML.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        validate_zoom_steps(&self.zoom_steps).context("invalid zoom_steps")?;
        if self.save_file_name.trim().is_empty() {
            bail!("save_file_name is empty");
        }
        if !is_positive(self.drag_multiplier) {
            bail!("drag_multiplier must be positive, got {}", self.drag_multiplier);
        }
        if self.auto_save && !is_positive(self.auto_save_interval_secs) {
            bail!("auto_save_interval_secs must be positive when auto_save is on");
        }
        if !self.load_delay_secs.is_finite() || self.load_delay_secs < 0.0 {
            bail!("load_delay_secs must be a non-negative number, got {}", self.load_delay_secs);
        }
        if self.map_size.iter().any(|v| !is_positive(*v)) {
            bail!("map_size must be positive, got {:?}", self.map_size);
        }
        Ok(())
    }

    /// Auto-save period. Unusable values fall back to the default.
    pub fn auto_save_interval(&self) -> Duration {
        let fallback = Duration::from_secs_f32(Self::default().auto_save_interval_secs);
        if !is_positive(self.auto_save_interval_secs) {
            return fallback;
        }
        seconds(self.auto_save_interval_secs, fallback)
    }

    /// Delay before the startup load. Unusable values mean no delay.
    pub fn load_delay(&self) -> Duration {
        seconds(self.load_delay_secs, Duration::ZERO)
    }

    pub fn map_size(&self) -> Point {
        Point::new(self.map_size[0], self.map_size[1])
    }

    pub fn panel_offset(&self) -> Point {
        Point::new(self.panel_offset[0], self.panel_offset[1])
    }

    /// Full path of the save file.
    pub fn save_path(&self) -> Option<PathBuf> {
        let dir = match &self.save_dir {
            Some(dir) => dir.clone(),
            None => project_dirs()?.data_dir().to_path_buf(),
        };
        Some(dir.join(&self.save_file_name))
    }
}
