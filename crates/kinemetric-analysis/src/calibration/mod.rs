// ABOUTME: Calibration service: reference-hold capture, triangulation, and the profile store
// ABOUTME: Re-exports capture helpers and the persisted calibration store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Calibration service
//!
//! A user holds the tracked device at 0°, 90°, and 180°. Each hold is
//! validated for stillness, the three centroids are triangulated into a
//! tracked-point radius and a pivot, and the anatomical segment length is the
//! radius minus the grip offset. Profiles are stored per user and device and
//! are only used while fresh and accurate.

mod capture;
mod store;

pub use capture::{
    estimate_tracked_radius, orientation_accuracy, triangulate_pivot, CalibrationCapture,
    CapturedReference, OrientationAccuracy,
};
pub use store::CalibrationStore;
