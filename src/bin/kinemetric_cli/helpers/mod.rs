// ABOUTME: Shared helpers for kinemetric-cli
// ABOUTME: Default store location and output formatting
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub mod display;

use std::path::PathBuf;

/// Calibration store under the platform data directory, or the working directory
pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .map_or_else(|| PathBuf::from("."), |dir| dir.join("kinemetric"))
        .join("calibration.json")
}
