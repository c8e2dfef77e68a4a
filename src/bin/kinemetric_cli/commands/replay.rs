// ABOUTME: Replay command for kinemetric-cli
// ABOUTME: Runs recordings through sessions in parallel, or streams rep events with --follow
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use kinemetric::analysis::calibration::CalibrationStore;
use kinemetric::config::AnalysisConfig;
use kinemetric::errors::{AppError, AppResult};
use kinemetric::models::{CalibrationKey, CalibrationProfile, DetectionProfile, ExerciseId, Side};
use kinemetric::replay::{replay_files, replay_following, ReplaySettings};
use std::path::{Path, PathBuf};
use tokio::task;
use tracing::{error, info};

use crate::helpers::display::{print_json_line, print_json_pretty};

type Result<T> = AppResult<T>;

/// Parsed replay arguments
pub struct ReplayRequest {
    pub exercise: ExerciseId,
    /// Overrides the profile's default side for joint-angle exercises
    pub side: Option<Side>,
    pub user: Option<String>,
    pub device: Option<String>,
    /// Stream events instead of printing one report per recording
    pub follow: bool,
    pub recordings: Vec<PathBuf>,
}

/// Replay every requested recording
pub async fn run(request: ReplayRequest, store_path: &Path, config: AnalysisConfig) -> Result<()> {
    let mut profile = DetectionProfile::for_exercise(request.exercise);
    if let Some(side) = request.side {
        profile = profile.with_side(side);
    }
    let calibration = resolve_calibration(
        request.user.as_deref(),
        request.device.as_deref(),
        store_path,
        &config,
    )?;
    let settings = ReplaySettings {
        profile,
        calibration,
        config,
    };

    info!(
        exercise = %request.exercise,
        recordings = request.recordings.len(),
        follow = request.follow,
        "starting replay"
    );

    if request.follow {
        follow_each(request.recordings, &settings).await
    } else {
        replay_all(request.recordings, settings).await
    }
}

fn resolve_calibration(
    user: Option<&str>,
    device: Option<&str>,
    store_path: &Path,
    config: &AnalysisConfig,
) -> Result<CalibrationProfile> {
    let (Some(user), Some(device)) = (user, device) else {
        return Ok(CalibrationProfile::default_profile());
    };
    let store = CalibrationStore::open(store_path, config.calibration.clone())?;
    Ok(store.profile_for(&CalibrationKey::new(user, device)))
}

async fn replay_all(paths: Vec<PathBuf>, settings: ReplaySettings) -> Result<()> {
    let total = paths.len();
    let results = task::spawn_blocking(move || replay_files(&paths, &settings))
        .await
        .map_err(|e| AppError::internal(format!("replay worker failed: {e}")))?;

    let mut failures = 0_usize;
    for result in results {
        match result {
            Ok(report) => print_json_pretty(&report)?,
            Err(e) => {
                failures += 1;
                error!(error = %e, "recording replay failed");
            }
        }
    }

    if failures > 0 {
        return Err(AppError::internal(format!(
            "{failures} of {total} recordings failed to replay"
        )));
    }
    Ok(())
}

async fn follow_each(paths: Vec<PathBuf>, settings: &ReplaySettings) -> Result<()> {
    for path in paths {
        let (mut events, handle) = replay_following(path, settings.clone()).await?;
        while let Some(event) = events.recv().await {
            print_json_line(&event)?;
        }
        let report = handle
            .await
            .map_err(|e| AppError::internal(format!("replay worker failed: {e}")))??;
        info!(
            reps = report.metrics.rep_count,
            samples = report.samples,
            skipped = report.skipped_lines,
            "follow replay finished"
        );
    }
    Ok(())
}
