// src/config.rs
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::drivers::PipelineError;
use crate::keyboard::virtual_key_code;
use crate::types::{ActuatorKind, Band, SourceKind};

/// Startup configuration. Every field has a default, so an empty JSON object
/// (or no file at all) gives the stock 256 Hz / 2 s / threshold 150 setup.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub sampling_rate_hz: f64,
    pub epoch_seconds: f64,
    /// Buffer keeps this many epochs of raw samples.
    pub retention_epochs: usize,
    pub max_plot_points: usize,
    pub alpha_band: Band,
    pub beta_band: Band,
    /// Welch segment duration; `None` means a fixed 1024-sample segment.
    pub welch_window_seconds: Option<f64>,
    pub threshold: f64,
    pub tick_period_ms: u64,
    pub source: SourceKind,
    pub actuator: ActuatorKind,
    pub log_path: PathBuf,
    pub plot_path: Option<PathBuf>,
    /// Stop after this many ticks; runs until the source ends when unset.
    pub max_ticks: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sampling_rate_hz: 256.0,
            epoch_seconds: 2.0,
            retention_epochs: 10,
            max_plot_points: 100,
            alpha_band: Band::new(8.0, 12.0),
            beta_band: Band::new(13.0, 30.0),
            welch_window_seconds: None,
            threshold: 150.0,
            tick_period_ms: 500,
            source: SourceKind::default(),
            actuator: ActuatorKind::default(),
            log_path: PathBuf::from("EEG_Log.txt"),
            plot_path: None,
            max_ticks: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_json(text: &str) -> Result<Self, PipelineError> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| PipelineError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    /// Samples per epoch (`sampling_rate × epoch_duration`).
    pub fn epoch_length(&self) -> usize {
        (self.sampling_rate_hz * self.epoch_seconds).round() as usize
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(self.sampling_rate_hz > 0.0) || !self.sampling_rate_hz.is_finite() {
            return Err(PipelineError::InvalidSampleRate);
        }
        if !self.epoch_seconds.is_finite() || self.epoch_length() < 2 {
            return invalid(format!(
                "epoch of {} s at {} Hz holds fewer than 2 samples",
                self.epoch_seconds, self.sampling_rate_hz
            ));
        }
        if self.retention_epochs == 0 {
            return invalid("retention_epochs must be at least 1".into());
        }
        if self.max_plot_points == 0 {
            return invalid("max_plot_points must be at least 1".into());
        }
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return invalid(format!("threshold must be finite and >= 0, got {}", self.threshold));
        }
        if self.tick_period_ms == 0 {
            return invalid("tick_period_ms must be greater than zero".into());
        }
        for (name, band) in [("alpha_band", self.alpha_band), ("beta_band", self.beta_band)] {
            if !(band.low_hz <= band.high_hz) {
                return invalid(format!(
                    "{name} low edge {} is above high edge {}",
                    band.low_hz, band.high_hz
                ));
            }
        }
        if let ActuatorKind::Key { key } = &self.actuator {
            if virtual_key_code(key).is_none() {
                return invalid(format!("unknown actuator key {key:?}"));
            }
        }
        if let Some(seconds) = self.welch_window_seconds {
            if !(seconds > 0.0) {
                return invalid(format!("welch_window_seconds must be positive, got {seconds}"));
            }
        }
        Ok(())
    }
}

fn invalid(msg: String) -> Result<(), PipelineError> {
    Err(PipelineError::InvalidConfig(msg))
}
