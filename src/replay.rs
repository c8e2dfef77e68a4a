// ABOUTME: Replays recorded sensor streams through a session to reproduce rep, ROM, and smoothness output
// ABOUTME: Sequential, rayon-parallel across recordings, and a streaming mode over a tokio channel
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Offline replay of sensor recordings
//!
//! Each recording gets its own [`SessionAggregator`], so independent
//! recordings replay in parallel without sharing analysis state.

use crate::recording::{load_recording, Recording};
use kinemetric_analysis::session::SessionAggregator;
use kinemetric_core::config::AnalysisConfig;
use kinemetric_core::errors::{AppError, AppResult, SessionError};
use kinemetric_core::models::{
    CalibrationProfile, DetectionProfile, SensorSample, SessionEvent, SessionMetrics,
};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task;
use tracing::{info, warn};

/// Everything needed to replay one recording
#[derive(Debug, Clone)]
pub struct ReplaySettings {
    /// Exercise profile driving detection
    pub profile: DetectionProfile,
    /// Calibration used for ROM
    pub calibration: CalibrationProfile,
    /// Analysis configuration
    pub config: AnalysisConfig,
}

/// Outcome of replaying one recording
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayReport {
    /// Recording path, when replayed from a file
    pub source: Option<PathBuf>,
    /// Samples fed
    pub samples: usize,
    /// Lines skipped while reading
    pub skipped_lines: usize,
    /// Final session metrics
    pub metrics: SessionMetrics,
}

/// Replay samples through a fresh session
///
/// # Errors
///
/// Returns an error only if the session rejects a sample, which cannot happen
/// for a session started here unless its state is corrupted
pub fn replay_samples(
    settings: &ReplaySettings,
    samples: impl IntoIterator<Item = SensorSample>,
) -> Result<SessionMetrics, SessionError> {
    let mut session = SessionAggregator::new(settings.calibration.clone(), settings.config.clone());
    session.start_session(settings.profile);
    drive(&mut session, samples)
}

fn drive(
    session: &mut SessionAggregator,
    samples: impl IntoIterator<Item = SensorSample>,
) -> Result<SessionMetrics, SessionError> {
    for sample in samples {
        session.feed(sample)?;
    }
    session.end_session()
}

fn report(source: Option<PathBuf>, recording: Recording, metrics: SessionMetrics) -> ReplayReport {
    ReplayReport {
        source,
        samples: recording.samples.len(),
        skipped_lines: recording.skipped_lines,
        metrics,
    }
}

/// Replay one recording file
///
/// # Errors
///
/// Returns an error if the file cannot be read
pub fn replay_file(path: &Path, settings: &ReplaySettings) -> AppResult<ReplayReport> {
    let recording = load_recording(path)?;
    if recording.is_empty() {
        warn!(path = %path.display(), "recording contains no samples");
    }
    let metrics = replay_samples(settings, recording.samples.iter().cloned())?;
    info!(
        path = %path.display(),
        reps = metrics.rep_count,
        average_rom = metrics.average_rom,
        "recording replayed"
    );
    Ok(report(Some(path.to_path_buf()), recording, metrics))
}

/// Replay several recordings in parallel, one session each, preserving input order
#[must_use]
pub fn replay_files(paths: &[PathBuf], settings: &ReplaySettings) -> Vec<AppResult<ReplayReport>> {
    paths
        .par_iter()
        .map(|path| replay_file(path, settings))
        .collect()
}

/// Replay one recording on a blocking worker while streaming its events
///
/// Events arrive on the returned receiver in the order the session publishes
/// them; the join handle yields the final report.
///
/// # Errors
///
/// Returns an error if the file cannot be read
pub async fn replay_following(
    path: PathBuf,
    settings: ReplaySettings,
) -> AppResult<(
    UnboundedReceiver<SessionEvent>,
    task::JoinHandle<AppResult<ReplayReport>>,
)> {
    let reader_path = path.clone();
    let recording = task::spawn_blocking(move || load_recording(&reader_path))
        .await
        .map_err(|e| AppError::internal(format!("recording reader task failed: {e}")))??;

    let mut session = SessionAggregator::new(settings.calibration, settings.config);
    let events = session.subscribe();
    session.start_session(settings.profile);

    let handle = task::spawn_blocking(move || -> AppResult<ReplayReport> {
        let metrics = drive(&mut session, recording.samples.iter().cloned())?;
        Ok(report(Some(path), recording, metrics))
    });
    Ok((events, handle))
}
