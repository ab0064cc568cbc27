// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::camera::{CameraConstraints, CameraFacing};
use crate::constants::{camera, cart, render};
use crate::errors::ConfigError;
use crate::pipelines::EncodingQuality;
use crate::session::{CategoryRules, ParameterDefaults};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Requested camera stream settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Ideal capture width in pixels
    pub ideal_width: u32,
    /// Ideal capture height in pixels
    pub ideal_height: u32,
    /// Front (user) or rear (environment) camera
    pub facing: CameraFacing,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            ideal_width: camera::IDEAL_WIDTH,
            ideal_height: camera::IDEAL_HEIGHT,
            facing: CameraFacing::User,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the makeup render service
    pub render_service_url: String,
    /// Upper bound for one render request, in milliseconds
    pub render_timeout_ms: u64,
    /// Abort superseded render requests instead of letting them finish
    pub cancel_superseded: bool,
    /// JPEG preset used when normalizing uploads and camera snapshots
    pub capture_quality: EncodingQuality,
    /// Base URL of the storefront cart API
    pub cart_service_url: String,
    pub camera: CameraSettings,
    /// Parameters restored on session start and reset
    pub defaults: ParameterDefaults,
    /// Product category label → governed region
    pub category_rules: CategoryRules,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            render_service_url: render::DEFAULT_SERVICE_URL.to_string(),
            render_timeout_ms: render::DEFAULT_TIMEOUT.as_millis() as u64,
            cancel_superseded: true,
            capture_quality: EncodingQuality::default(),
            cart_service_url: cart::DEFAULT_SERVICE_URL.to_string(),
            camera: CameraSettings::default(),
            defaults: ParameterDefaults::default(),
            category_rules: CategoryRules::default(),
        }
    }
}

impl Config {
    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }

    pub fn camera_constraints(&self) -> CameraConstraints {
        CameraConstraints {
            ideal_width: self.camera.ideal_width,
            ideal_height: self.camera.ideal_height,
            facing: self.camera.facing,
        }
    }

    /// `<config_dir>/tryon/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tryon").join("config.toml"))
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml_string()?)?;
        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}
