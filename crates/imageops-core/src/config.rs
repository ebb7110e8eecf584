//! Process-wide operator tunables.
//!
//! [`OpsConfig`] is built once at startup and passed explicitly into every
//! operator call. Nothing reads it from ambient state.
//!
//! # Sources
//!
//! - [`OpsConfig::default`] - documented defaults
//! - [`OpsConfig::load`] - JSON (`.json`) or YAML (`.yaml`/`.yml`) file; missing keys keep defaults
//! - [`OpsConfig::load_or_default`] - same, but falls back to defaults on any failure
//!
//! The `IMAGEOPS_LARGE_IMAGE_WARN_MB` environment variable overrides
//! [`OpsConfig::large_image_warn_mb`] when applied with [`OpsConfig::with_env`].
//!
//! # Example
//!
//! ```rust
//! use imageops_core::OpsConfig;
//!
//! let cfg = OpsConfig::from_json_str(r#"{"gamma_max": 4.0}"#).unwrap();
//! assert_eq!(cfg.gamma_max, 4.0);
//! assert_eq!(cfg.gamma_safe_min, 0.2);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use tracing::{debug, warn};

use crate::{OpsError, OpsResult};

/// Environment variable overriding the large allocation warning threshold.
pub const LARGE_IMAGE_WARN_ENV: &str = "IMAGEOPS_LARGE_IMAGE_WARN_MB";

/// Shared numeric tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpsConfig {
    /// Schema version of the configuration file.
    pub version: u32,
    /// Guard added to denominators and used as the "is zero" tolerance.
    pub epsilon: f32,
    /// RGB weights for luma extraction.
    pub luma_weights: [f32; 3],
    /// Lower bound applied to every gamma parameter.
    pub gamma_safe_min: f32,
    /// Upper bound applied to every gamma parameter.
    pub gamma_max: f32,
    /// Maximum side length for crop/reformat outputs.
    pub max_image_dimension: usize,
    /// Maximum side length for scaled or expanded transform outputs.
    pub max_scale_dimension: usize,
    /// Allocations above this many MiB are logged as warnings.
    pub large_image_warn_mb: u64,
}

impl Default for OpsConfig {
    fn default() -> Self {
        Self {
            version: 1,
            epsilon: 1e-6,
            luma_weights: [0.2126, 0.7152, 0.0722],
            gamma_safe_min: 0.2,
            gamma_max: 5.0,
            max_image_dimension: 16384,
            max_scale_dimension: 8192,
            large_image_warn_mb: 2048,
        }
    }
}

impl OpsConfig {
    /// Parses a JSON document. Unknown keys are ignored.
    pub fn from_json_str(s: &str) -> OpsResult<Self> {
        let cfg: Self = serde_json::from_str(s).map_err(|e| OpsError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parses a YAML document. Unknown keys are ignored.
    pub fn from_yaml_str(s: &str) -> OpsResult<Self> {
        let cfg: Self = serde_yaml::from_str(s).map_err(|e| OpsError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Loads a configuration file, picking the format from its extension.
    ///
    /// `.yaml` and `.yml` are read as YAML, everything else as JSON.
    pub fn load(path: impl AsRef<Path>) -> OpsResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text),
            _ => Self::from_json_str(&text),
        }
    }

    /// Loads a configuration file, returning defaults when it is missing or invalid.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(OpsError::Io(e)) => {
                debug!(path = %path.display(), error = %e, "ops config not found; using defaults");
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ops config invalid; using defaults");
                Self::default()
            }
        }
    }

    /// Applies the `IMAGEOPS_LARGE_IMAGE_WARN_MB` override, ignoring unparsable values.
    pub fn with_env(mut self) -> Self {
        if let Ok(raw) = std::env::var(LARGE_IMAGE_WARN_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(mb) => self.large_image_warn_mb = mb,
                Err(_) => debug!(value = %raw, "ignoring unparsable {}", LARGE_IMAGE_WARN_ENV),
            }
        }
        self
    }

    /// Checks that the tunables are usable.
    pub fn validate(&self) -> OpsResult<()> {
        if self.epsilon.is_nan() || self.epsilon <= 0.0 {
            return Err(OpsError::Config(format!("epsilon must be > 0, got {}", self.epsilon)));
        }
        if self.gamma_safe_min.is_nan() || self.gamma_safe_min <= 0.0 || self.gamma_safe_min > self.gamma_max {
            return Err(OpsError::Config(format!(
                "gamma range [{}, {}] is invalid",
                self.gamma_safe_min, self.gamma_max
            )));
        }
        if self.max_image_dimension == 0 || self.max_scale_dimension == 0 {
            return Err(OpsError::Config("dimension limits must be > 0".into()));
        }
        Ok(())
    }

    /// Clamps a gamma parameter into the safe range.
    #[inline]
    pub fn clamp_gamma(&self, gamma: f32) -> f32 {
        if gamma.is_nan() {
            return 1.0;
        }
        gamma.max(self.gamma_safe_min).min(self.gamma_max)
    }

    /// Logs a warning when `width * height * channels` floats exceed the threshold.
    pub fn warn_if_large(&self, width: usize, height: usize, channels: usize) {
        let bytes = (width as u64) * (height as u64) * (channels as u64) * 4;
        let mb = bytes as f64 / (1024.0 * 1024.0);
        if mb > self.large_image_warn_mb as f64 {
            warn!(
                width,
                height,
                estimated_mb = mb,
                threshold_mb = self.large_image_warn_mb,
                "large image allocation"
            );
        }
    }
}
