// ABOUTME: Motion-analysis engine turning raw sensor streams into reps, ROM, and smoothness
// ABOUTME: Buffers, calibration, classification, detectors, ROM geometry, SPARC, and sessions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Kinemetric Analysis
//!
//! Numeric core of the kinemetric platform. Data flows one way: sensor
//! samples enter per-modality [`buffer::SampleBuffer`]s, the
//! [`detectors`] mark repetitions, the [`rom`] engine and [`smoothness`]
//! analyzer measure each repetition's segment, and the [`session`]
//! aggregator publishes events and final metrics. [`calibration`] and the
//! [`classifier`] feed the ROM engine.
//!
//! Nothing here blocks or performs I/O apart from the calibration store's
//! JSON file.

/// Bounded sample buffers with batch eviction
pub mod buffer;

/// Reference-hold capture, triangulation, and the calibration store
pub mod calibration;

/// Proximal versus distal joint motion classification
pub mod classifier;

/// Rep detector state machines selected by detection profile
pub mod detectors;

/// Named joint angles from camera keypoints
pub mod joint_angles;

/// Plane fitting and chord-to-angle ROM estimation
pub mod rom;

/// Spectral arc length smoothness
pub mod smoothness;

/// Session aggregation and event publishing
pub mod session;
