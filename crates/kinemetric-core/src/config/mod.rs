// ABOUTME: Analysis configuration with environment overrides and validation
// ABOUTME: Buffer, calibration, ROM, smoothness, and session sections cached in a global OnceLock
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Analysis Configuration Module
//!
//! Every tunable of the analysis pipeline lives here with the constant
//! defaults from [`crate::constants`]. Values can be overridden through
//! environment variables with the `KINEMETRIC_` prefix. Components take their
//! section explicitly; only binaries read [`AnalysisConfig::global`].

mod error;

pub use error::ConfigError;

use crate::constants::{buffer, calibration, rom, session, smoothness};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::warn;

/// Global configuration singleton
static ANALYSIS_CONFIG: OnceLock<AnalysisConfig> = OnceLock::new();

// ============================================================================
// Main Configuration
// ============================================================================

/// Analysis configuration container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Sample buffer sizing
    pub buffer: BufferConfig,
    /// Calibration capture and validity
    pub calibration: CalibrationConfig,
    /// ROM engine parameters
    pub rom: RomConfig,
    /// SPARC parameters
    pub smoothness: SmoothnessConfig,
    /// Session aggregation
    pub session: SessionConfig,
}

impl AnalysisConfig {
    /// Get the global configuration instance
    pub fn global() -> &'static Self {
        ANALYSIS_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                warn!("Failed to load analysis config: {e}, using defaults");
                Self::default()
            })
        })
    }

    /// Load configuration from environment
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values or validation fails
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config = config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if configuration values are invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer.capacity == 0 {
            return Err(ConfigError::ValueOutOfRange("buffer capacity must be > 0"));
        }
        if !(buffer::MIN_EVICTION_FRACTION..=buffer::MAX_EVICTION_FRACTION)
            .contains(&self.buffer.eviction_fraction)
        {
            return Err(ConfigError::ValueOutOfRange(
                "buffer eviction_fraction must be within [0.10, 0.20]",
            ));
        }

        let cal = &self.calibration;
        if cal.samples_per_reference == 0 {
            return Err(ConfigError::ValueOutOfRange(
                "calibration samples_per_reference must be > 0",
            ));
        }
        if cal.max_capture_deviation_m <= 0.0 {
            return Err(ConfigError::ValueOutOfRange(
                "calibration max_capture_deviation_m must be > 0",
            ));
        }
        if cal.grip_offset_m < 0.0 || cal.grip_offset_m >= calibration::MIN_SEGMENT_LENGTH_M {
            return Err(ConfigError::ValueOutOfRange(
                "calibration grip_offset_m must be within [0, 0.25)",
            ));
        }
        if cal.max_profile_age_days <= 0 {
            return Err(ConfigError::ValueOutOfRange(
                "calibration max_profile_age_days must be > 0",
            ));
        }
        if !(0.0..=1.0).contains(&cal.min_accuracy) {
            return Err(ConfigError::ValueOutOfRange(
                "calibration min_accuracy must be within [0, 1]",
            ));
        }
        if cal.max_orientation_deviation <= 0.0 {
            return Err(ConfigError::ValueOutOfRange(
                "calibration max_orientation_deviation must be > 0",
            ));
        }

        if (self.rom.grip_offset_m - cal.grip_offset_m).abs() > f64::EPSILON {
            return Err(ConfigError::InvalidRange(
                "rom grip_offset_m must equal calibration grip_offset_m",
            ));
        }
        if self.rom.min_samples < rom::MIN_ROM_SAMPLES {
            return Err(ConfigError::ValueOutOfRange("rom min_samples must be >= 3"));
        }
        if self.rom.live_window < self.rom.min_samples {
            return Err(ConfigError::InvalidRange(
                "rom live_window must be >= rom min_samples",
            ));
        }
        if self.rom.live_min_interval_s < 0.0 {
            return Err(ConfigError::ValueOutOfRange(
                "rom live_min_interval_s must be >= 0",
            ));
        }

        let sm = &self.smoothness;
        if sm.min_samples < 4 {
            return Err(ConfigError::ValueOutOfRange(
                "smoothness min_samples must be >= 4",
            ));
        }
        if sm.pad_level > 8 {
            return Err(ConfigError::ValueOutOfRange(
                "smoothness pad_level must be <= 8",
            ));
        }
        if sm.max_cutoff_hz <= 0.0 {
            return Err(ConfigError::ValueOutOfRange(
                "smoothness max_cutoff_hz must be > 0",
            ));
        }
        if !(0.0..1.0).contains(&sm.amplitude_threshold) {
            return Err(ConfigError::ValueOutOfRange(
                "smoothness amplitude_threshold must be within [0, 1)",
            ));
        }
        if !(0.0..=1.0).contains(&sm.energy_fraction) || sm.energy_fraction == 0.0 {
            return Err(ConfigError::ValueOutOfRange(
                "smoothness energy_fraction must be within (0, 1]",
            ));
        }
        if !(0.0..1.0).contains(&sm.velocity_leak) || sm.velocity_leak == 0.0 {
            return Err(ConfigError::ValueOutOfRange(
                "smoothness velocity_leak must be within (0, 1)",
            ));
        }
        if sm.max_segment_samples < sm.min_samples {
            return Err(ConfigError::InvalidRange(
                "smoothness max_segment_samples must be >= smoothness min_samples",
            ));
        }

        if self.session.tracking_notice_frames == 0 {
            return Err(ConfigError::ValueOutOfRange(
                "session tracking_notice_frames must be > 0",
            ));
        }

        Ok(())
    }

    /// Helper function to parse and apply an environment variable override
    fn apply_env_var<T: FromStr>(env_var_name: &str, target: &mut T) -> Result<(), ConfigError> {
        if let Ok(val) = env::var(env_var_name) {
            *target = val
                .parse()
                .map_err(|_| ConfigError::Parse(format!("Invalid {env_var_name}")))?;
        }
        Ok(())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut self) -> Result<Self, ConfigError> {
        // Buffer
        Self::apply_env_var("KINEMETRIC_BUFFER_CAPACITY", &mut self.buffer.capacity)?;
        Self::apply_env_var(
            "KINEMETRIC_BUFFER_EVICTION_FRACTION",
            &mut self.buffer.eviction_fraction,
        )?;

        // Calibration
        Self::apply_env_var(
            "KINEMETRIC_CALIBRATION_SAMPLES_PER_REFERENCE",
            &mut self.calibration.samples_per_reference,
        )?;
        Self::apply_env_var(
            "KINEMETRIC_CALIBRATION_MAX_DEVIATION_M",
            &mut self.calibration.max_capture_deviation_m,
        )?;
        Self::apply_env_var(
            "KINEMETRIC_CALIBRATION_MAX_AGE_DAYS",
            &mut self.calibration.max_profile_age_days,
        )?;
        Self::apply_env_var(
            "KINEMETRIC_CALIBRATION_MIN_ACCURACY",
            &mut self.calibration.min_accuracy,
        )?;

        // Grip offset is shared by capture and ROM
        Self::apply_env_var("KINEMETRIC_GRIP_OFFSET_M", &mut self.calibration.grip_offset_m)?;
        self.rom.grip_offset_m = self.calibration.grip_offset_m;

        // ROM
        Self::apply_env_var("KINEMETRIC_ROM_LIVE_WINDOW", &mut self.rom.live_window)?;
        Self::apply_env_var(
            "KINEMETRIC_ROM_LIVE_INTERVAL_S",
            &mut self.rom.live_min_interval_s,
        )?;

        // Smoothness
        Self::apply_env_var(
            "KINEMETRIC_SPARC_MIN_SAMPLES",
            &mut self.smoothness.min_samples,
        )?;
        Self::apply_env_var(
            "KINEMETRIC_SPARC_MAX_CUTOFF_HZ",
            &mut self.smoothness.max_cutoff_hz,
        )?;
        Self::apply_env_var(
            "KINEMETRIC_SPARC_AMPLITUDE_THRESHOLD",
            &mut self.smoothness.amplitude_threshold,
        )?;
        Self::apply_env_var(
            "KINEMETRIC_SPARC_MAX_SEGMENT_SAMPLES",
            &mut self.smoothness.max_segment_samples,
        )?;

        // Session
        Self::apply_env_var(
            "KINEMETRIC_TRACKING_NOTICE_FRAMES",
            &mut self.session.tracking_notice_frames,
        )?;
        Self::apply_env_var("KINEMETRIC_LIVE_ROM", &mut self.session.live_rom_enabled)?;

        Ok(self)
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Bounded sample buffer sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferConfig {
    /// Samples held per modality before batch eviction
    pub capacity: usize,
    /// Fraction of capacity evicted at once when full
    pub eviction_fraction: f64,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: buffer::DEFAULT_CAPACITY,
            eviction_fraction: buffer::DEFAULT_EVICTION_FRACTION,
        }
    }
}

/// Calibration capture and validity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Samples per reference angle
    pub samples_per_reference: usize,
    /// Hold-still bound for capture samples (meters)
    pub max_capture_deviation_m: f64,
    /// Wrist to tracked-point distance (meters)
    pub grip_offset_m: f64,
    /// Stored profiles older than this are not used
    pub max_profile_age_days: i64,
    /// Stored profiles below this accuracy are not used
    pub min_accuracy: f64,
    /// Relative orientation deviation that rejects a capture
    pub max_orientation_deviation: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            samples_per_reference: calibration::SAMPLES_PER_REFERENCE,
            max_capture_deviation_m: calibration::MAX_CAPTURE_DEVIATION_M,
            grip_offset_m: calibration::DEFAULT_GRIP_OFFSET_M,
            max_profile_age_days: calibration::MAX_PROFILE_AGE_DAYS,
            min_accuracy: calibration::MIN_ACCURACY,
            max_orientation_deviation: calibration::MAX_ORIENTATION_DEVIATION,
        }
    }
}

impl CalibrationConfig {
    /// Maximum profile age as a duration
    #[must_use]
    pub fn max_profile_age(&self) -> Duration {
        Duration::days(self.max_profile_age_days)
    }
}

/// ROM engine parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RomConfig {
    /// Wrist to tracked-point distance (meters)
    pub grip_offset_m: f64,
    /// Fewest positions that define an arc
    pub min_samples: usize,
    /// Positions in the live estimate window
    pub live_window: usize,
    /// Minimum spacing between live estimates (seconds)
    pub live_min_interval_s: f64,
}

impl Default for RomConfig {
    fn default() -> Self {
        Self {
            grip_offset_m: calibration::DEFAULT_GRIP_OFFSET_M,
            min_samples: rom::MIN_ROM_SAMPLES,
            live_window: rom::LIVE_WINDOW,
            live_min_interval_s: rom::LIVE_MIN_INTERVAL_S,
        }
    }
}

/// SPARC parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothnessConfig {
    /// Fewest speed samples analyzed
    pub min_samples: usize,
    /// Zero-padding level
    pub pad_level: u32,
    /// Upper bound on the analyzed band (Hz)
    pub max_cutoff_hz: f64,
    /// Normalized magnitude below which the band is trimmed
    pub amplitude_threshold: f64,
    /// Fraction of spectral energy that sets the adaptive cutoff
    pub energy_fraction: f64,
    /// Per-sample decay of integrated inertial velocity
    pub velocity_leak: f64,
    /// Speed samples kept per segment; a segment without reps keeps only the latest
    pub max_segment_samples: usize,
}

impl Default for SmoothnessConfig {
    fn default() -> Self {
        Self {
            min_samples: smoothness::MIN_SAMPLES,
            pad_level: smoothness::PAD_LEVEL,
            max_cutoff_hz: smoothness::MAX_CUTOFF_HZ,
            amplitude_threshold: smoothness::AMPLITUDE_THRESHOLD,
            energy_fraction: smoothness::ENERGY_FRACTION,
            velocity_leak: smoothness::VELOCITY_LEAK,
            max_segment_samples: smoothness::MAX_SEGMENT_SAMPLES,
        }
    }
}

/// Session aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Consecutive non-normal pose frames before a tracking notice
    pub tracking_notice_frames: u32,
    /// Publish live ROM estimates while a session runs
    pub live_rom_enabled: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tracking_notice_frames: session::TRACKING_NOTICE_FRAMES,
            live_rom_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_defaults_validate() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_eviction_fraction_bounds() {
        let mut config = AnalysisConfig::default();
        config.buffer.eviction_fraction = 0.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValueOutOfRange(_))
        ));
    }

    #[test]
    #[serial]
    fn test_grip_override_applies_to_rom() {
        env::set_var("KINEMETRIC_GRIP_OFFSET_M", "0.12");
        let config = AnalysisConfig::load();
        env::remove_var("KINEMETRIC_GRIP_OFFSET_M");

        let config = config.unwrap();
        assert!((config.calibration.grip_offset_m - 0.12).abs() < 1e-12);
        assert!((config.rom.grip_offset_m - 0.12).abs() < 1e-12);
    }

    #[test]
    #[serial]
    fn test_unparsable_override_is_rejected() {
        env::set_var("KINEMETRIC_BUFFER_CAPACITY", "lots");
        let result = AnalysisConfig::load();
        env::remove_var("KINEMETRIC_BUFFER_CAPACITY");

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
