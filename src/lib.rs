// ABOUTME: Main library entry point for the kinemetric rehabilitation motion-analysis platform
// ABOUTME: Re-exports the core and analysis crates and adds logging, recordings, and replay
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Kinemetric
//!
//! Turns raw rehabilitation sensor streams (device IMU, world-tracked device
//! pose, camera body-pose keypoints) into a repetition count, a range of
//! motion per repetition, and a movement smoothness score.
//!
//! ## Architecture
//!
//! - **kinemetric-core**: errors, constants, data model, detection profiles, configuration
//! - **kinemetric-analysis**: buffers, calibration, detectors, ROM engine, SPARC, sessions
//! - this crate: logging setup, JSON-lines recordings, and offline replay
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use kinemetric::analysis::session::SessionAggregator;
//! use kinemetric::config::AnalysisConfig;
//! use kinemetric::models::{CalibrationProfile, DetectionProfile, ExerciseId};
//!
//! let mut session = SessionAggregator::new(
//!     CalibrationProfile::default_profile(),
//!     AnalysisConfig::default(),
//! );
//! session.start_session(DetectionProfile::for_exercise(ExerciseId::PendulumSwing));
//! // feed samples as they arrive, then:
//! let metrics = session.end_session();
//! ```

// ── Public API ──────────────────────────────────────────────────────────
// Used by the CLI binary (src/bin/) and integration tests (tests/).

/// Structured logging configuration
pub mod logging;

/// JSON-lines sensor recordings
pub mod recording;

/// Offline replay of recordings through sessions
pub mod replay;

/// Analysis engine
pub use kinemetric_analysis as analysis;

/// Configuration, constants, errors, and the data model
pub use kinemetric_core::{config, constants, errors, models};
