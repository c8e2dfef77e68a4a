// ABOUTME: Calibration store commands for kinemetric-cli
// ABOUTME: Shows, invalidates, and prunes stored per-user calibrations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::Utc;
use kinemetric::analysis::calibration::CalibrationStore;
use kinemetric::config::AnalysisConfig;
use kinemetric::errors::AppResult;
use kinemetric::models::CalibrationKey;
use std::path::Path;
use tracing::{info, warn};

use crate::helpers::display::display_calibration;

type Result<T> = AppResult<T>;

fn open_store(store_path: &Path, config: &AnalysisConfig) -> Result<CalibrationStore> {
    Ok(CalibrationStore::open(
        store_path,
        config.calibration.clone(),
    )?)
}

/// Show the stored calibration for a user and device
pub fn show(store_path: &Path, config: &AnalysisConfig, user: String, device: String) -> Result<()> {
    let store = open_store(store_path, config)?;
    let key = CalibrationKey::new(user, device);

    let Some(profile) = store.snapshot(&key) else {
        println!("No calibration stored for {key} in {}", store_path.display());
        return Ok(());
    };
    let reason = profile.invalid_reason(
        Utc::now(),
        config.calibration.max_profile_age(),
        config.calibration.min_accuracy,
    );
    display_calibration(&key, &profile, reason.as_deref());
    Ok(())
}

/// Remove the stored calibration for a user and device
pub fn invalidate(
    store_path: &Path,
    config: &AnalysisConfig,
    user: String,
    device: String,
) -> Result<()> {
    let store = open_store(store_path, config)?;
    let key = CalibrationKey::new(user, device);

    if store.invalidate(&key)? {
        println!("Calibration for {key} removed");
    } else {
        warn!(%key, "nothing to invalidate");
        println!("No calibration stored for {key}");
    }
    Ok(())
}

/// Remove every calibration past the age limit
pub fn prune(store_path: &Path, config: &AnalysisConfig) -> Result<()> {
    let store = open_store(store_path, config)?;
    let removed = store.invalidate_stale(Utc::now())?;
    info!(removed, remaining = store.len(), "calibration store pruned");
    println!("Removed {removed} stale calibration(s), {} remaining", store.len());
    Ok(())
}
