// ABOUTME: Output formatting helpers for kinemetric-cli
// ABOUTME: JSON output for reports and events, and a readable calibration summary
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use kinemetric::errors::AppResult;
use kinemetric::models::{CalibrationKey, CalibrationProfile};
use serde::Serialize;

/// Print a value as indented JSON
pub fn print_json_pretty<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a value as one JSON line
pub fn print_json_line<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

/// Display a stored calibration and whether sessions would use it
pub fn display_calibration(key: &CalibrationKey, profile: &CalibrationProfile, invalid: Option<&str>) {
    println!("Calibration for {key}");
    println!("{}", "=".repeat(48));
    println!("   Segment length: {:.3} m", profile.segment_length_m);
    println!(
        "   Pivot joint:    ({:.3}, {:.3}, {:.3})",
        profile.reference_joint.x, profile.reference_joint.y, profile.reference_joint.z
    );
    println!("   Accuracy:       {:.2}", profile.accuracy);
    println!(
        "   Captured:       {}",
        profile.captured_at.format("%Y-%m-%d %H:%M UTC")
    );
    match invalid {
        None => println!("   Status:         usable"),
        Some(reason) => println!("   Status:         not used ({reason}), sessions fall back to defaults"),
    }
}
