use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("pulse length must be at least 1 ms")]
    ZeroPulseLength,
    #[error("max strokes per minute must be finite and positive, got {0}")]
    InvalidStrokeRate(f64),
    #[error("speed bias must lie in [0.0, 1.0), got {0}")]
    InvalidBias(f64),
    #[error("pwm range must be non-zero")]
    ZeroPwmRange,
    #[error("cumulative on-time cap must be non-zero")]
    ZeroOnTimeCap,
    #[error("sample period must be at least 2 ms")]
    SamplePeriodTooShort,
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Immutable tuning constants for one graver, supplied at construction.
///
/// Every field has a default, so a JSON file only needs to name the
/// values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraverConfig {
    /// Time the solenoid stays energized per stroke.
    pub pulse_length_ms: u64,
    /// Stroke rate at full speed setpoint.
    pub max_strokes_per_minute: f64,
    /// Speed setpoints at or below this never energize the output.
    pub speed_bias: f64,
    pub pwm_frequency_hz: u32,
    /// Full-scale output intensity.
    pub pwm_range: u16,
    /// Energized-time budget before a forced cooldown.
    pub max_cumulative_on_time_ms: u64,
    pub cooldown_ms: u64,
    /// Sampling period of the setpoint sources.
    pub sample_period_ms: u64,
    /// Allow `terminate()` to cut a cooldown short.
    pub cooldown_interruptible: bool,
    /// Minimum SPM change worth reporting.
    pub spm_report_threshold: f64,
}

impl Default for GraverConfig {
    fn default() -> Self {
        Self {
            pulse_length_ms: 15,
            max_strokes_per_minute: 2500.0,
            speed_bias: 0.01,
            pwm_frequency_hz: 1000,
            pwm_range: 1023,
            max_cumulative_on_time_ms: 2000,
            cooldown_ms: 4000,
            sample_period_ms: 100,
            cooldown_interruptible: false,
            spm_report_threshold: 5.0,
        }
    }
}

impl GraverConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pulse_length_ms == 0 {
            return Err(ConfigError::ZeroPulseLength);
        }
        if !self.max_strokes_per_minute.is_finite() || self.max_strokes_per_minute <= 0.0 {
            return Err(ConfigError::InvalidStrokeRate(self.max_strokes_per_minute));
        }
        if !(0.0..1.0).contains(&self.speed_bias) {
            return Err(ConfigError::InvalidBias(self.speed_bias));
        }
        if self.pwm_range == 0 {
            return Err(ConfigError::ZeroPwmRange);
        }
        if self.max_cumulative_on_time_ms == 0 {
            return Err(ConfigError::ZeroOnTimeCap);
        }
        if self.sample_period_ms < 2 {
            return Err(ConfigError::SamplePeriodTooShort);
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn sample_period(&self) -> Duration {
        Duration::from_millis(self.sample_period_ms)
    }

    /// Wait used while speed is below bias: half the sampling period.
    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.sample_period_ms / 2)
    }
}
