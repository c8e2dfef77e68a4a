// ABOUTME: Integration tests for analysis configuration loading and validation
// ABOUTME: Environment overrides run serially since they mutate process-wide state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use kinemetric::config::{AnalysisConfig, ConfigError};
use serial_test::serial;
use std::env;

const OVERRIDES: [&str; 5] = [
    "KINEMETRIC_BUFFER_CAPACITY",
    "KINEMETRIC_BUFFER_EVICTION_FRACTION",
    "KINEMETRIC_GRIP_OFFSET_M",
    "KINEMETRIC_SPARC_MIN_SAMPLES",
    "KINEMETRIC_LIVE_ROM",
];

fn clear_overrides() {
    for name in OVERRIDES {
        env::remove_var(name);
    }
}

#[test]
fn test_default_config_validation() {
    let config = AnalysisConfig::default();
    assert!(config.validate().is_ok());
    assert!(
        (config.rom.grip_offset_m - config.calibration.grip_offset_m).abs() < f64::EPSILON
    );
}

#[test]
fn test_mismatched_grip_offsets_are_rejected() {
    let mut config = AnalysisConfig::default();
    config.rom.grip_offset_m += 0.05;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidRange(_))
    ));
}

#[test]
fn test_live_window_must_cover_min_samples() {
    let mut config = AnalysisConfig::default();
    config.rom.live_window = config.rom.min_samples - 1;
    assert!(config.validate().is_err());
}

#[test]
fn test_segment_cap_must_cover_min_samples() {
    let mut config = AnalysisConfig::default();
    config.smoothness.max_segment_samples = config.smoothness.min_samples - 1;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidRange(_))
    ));
}

#[test]
#[serial]
fn test_environment_variable_override() {
    clear_overrides();
    env::set_var("KINEMETRIC_BUFFER_CAPACITY", "1200");
    env::set_var("KINEMETRIC_GRIP_OFFSET_M", "0.12");
    env::set_var("KINEMETRIC_SPARC_MIN_SAMPLES", "40");
    env::set_var("KINEMETRIC_LIVE_ROM", "false");

    let config = AnalysisConfig::load().unwrap();

    assert_eq!(config.buffer.capacity, 1200);
    assert!((config.calibration.grip_offset_m - 0.12).abs() < 1e-12);
    assert!((config.rom.grip_offset_m - 0.12).abs() < 1e-12);
    assert_eq!(config.smoothness.min_samples, 40);
    assert!(!config.session.live_rom_enabled);

    clear_overrides();
}

#[test]
#[serial]
fn test_unparseable_override_is_a_parse_error() {
    clear_overrides();
    env::set_var("KINEMETRIC_BUFFER_CAPACITY", "lots");

    let error = AnalysisConfig::load().unwrap_err();
    assert!(matches!(error, ConfigError::Parse(ref message) if message.contains("KINEMETRIC_BUFFER_CAPACITY")));

    clear_overrides();
}

#[test]
#[serial]
fn test_out_of_range_override_fails_validation() {
    clear_overrides();
    env::set_var("KINEMETRIC_BUFFER_EVICTION_FRACTION", "0.5");

    assert!(matches!(
        AnalysisConfig::load(),
        Err(ConfigError::ValueOutOfRange(_))
    ));

    clear_overrides();
}

#[test]
#[serial]
fn test_load_without_overrides_matches_defaults() {
    clear_overrides();
    assert_eq!(AnalysisConfig::load().unwrap(), AnalysisConfig::default());
}
