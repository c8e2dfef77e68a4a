// ABOUTME: ROM engine: movement-plane fit, chord extent, and anatomical chord-to-angle conversion
// ABOUTME: Also fuses the chord estimate with gyro sweep and provides a live HUD estimator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! ROM engine
//!
//! Positions of one repetition are assumed to lie near a plane. The plane
//! normal is the minimum-variance eigenvector of their covariance; points are
//! projected onto the two remaining axes and the largest distance from the
//! first projected point is the chord of the movement arc.
//!
//! A rigid link sweeps the same angle at every radius, so the anatomical angle
//! is recovered with the calibrated segment length. The angle implied at the
//! tracked point's radius (segment plus grip) is kept for diagnostics only.

use crate::classifier::MotionClassification;
use kinemetric_core::config::RomConfig;
use kinemetric_core::constants::rom::MIN_ROM_SAMPLES;
use kinemetric_core::models::{AngleRange, CalibrationProfile, Point2, PositionSample, Vec3};
use nalgebra::{Matrix3, SymmetricEigen, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Best-fit movement plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionPlane {
    /// Centroid of the fitted points
    pub origin: Vec3,
    /// Minimum-variance axis
    pub normal: Vec3,
    /// Maximum-variance in-plane axis
    pub u: Vec3,
    /// Second in-plane axis
    pub v: Vec3,
    /// Variance along `u`, `v`, and `normal`
    pub variances: [f64; 3],
}

impl ProjectionPlane {
    /// Project a point into plane coordinates
    #[must_use]
    pub fn project(&self, point: Vec3) -> Point2 {
        let offset = point - self.origin;
        Point2::new(offset.dot(self.u), offset.dot(self.v))
    }
}

/// Fit the movement plane by eigen-decomposition of the position covariance
///
/// Returns `None` for fewer than three points or non-finite input.
#[must_use]
pub fn fit_projection_plane(points: &[Vec3]) -> Option<ProjectionPlane> {
    if points.len() < MIN_ROM_SAMPLES {
        return None;
    }
    let origin = Vec3::centroid(points)?;

    let mut covariance = Matrix3::<f64>::zeros();
    for point in points {
        let d = *point - origin;
        let column = Vector3::new(d.x, d.y, d.z);
        covariance += column * column.transpose();
    }
    covariance /= points.len() as f64;
    if covariance.iter().any(|value| !value.is_finite()) {
        return None;
    }

    let eigen = SymmetricEigen::new(covariance);
    let mut order = [0_usize, 1, 2];
    order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));
    let axis = |index: usize| {
        let column = eigen.eigenvectors.column(index);
        Vec3::new(column[0], column[1], column[2])
    };

    Some(ProjectionPlane {
        origin,
        u: axis(order[0]),
        v: axis(order[1]),
        normal: axis(order[2]),
        variances: [
            eigen.eigenvalues[order[0]].max(0.0),
            eigen.eigenvalues[order[1]].max(0.0),
            eigen.eigenvalues[order[2]].max(0.0),
        ],
    })
}

/// Angle in degrees subtended by `chord` on a circle of `radius`
#[must_use]
pub fn chord_to_angle(chord_m: f64, radius_m: f64) -> f64 {
    if radius_m <= 0.0 || !chord_m.is_finite() {
        return 0.0;
    }
    let half = (chord_m.max(0.0) / (2.0 * radius_m)).min(1.0);
    (2.0 * half.asin()).to_degrees()
}

/// One ROM estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RomEstimate {
    /// Anatomical ROM in degrees, clamped to the range
    pub rom_degrees: f64,
    /// Angle implied at the tracked point's radius (diagnostic)
    pub tracked_point_degrees: f64,
    /// Largest in-plane distance from the first point (meters)
    pub chord_m: f64,
    /// Whether the anatomical angle had to be clamped
    pub clamped: bool,
    /// Positions analyzed
    pub sample_count: usize,
}

impl RomEstimate {
    /// Neutral result for too few samples
    #[must_use]
    pub const fn insufficient(sample_count: usize) -> Self {
        Self {
            rom_degrees: 0.0,
            tracked_point_degrees: 0.0,
            chord_m: 0.0,
            clamped: false,
            sample_count,
        }
    }

    /// Whether enough positions were available to measure
    #[must_use]
    pub const fn is_measured(&self) -> bool {
        self.sample_count >= MIN_ROM_SAMPLES
    }
}

/// Chord-based ROM estimation for one calibrated user
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RomEngine {
    segment_length_m: f64,
    grip_offset_m: f64,
    range: AngleRange,
    min_samples: usize,
}

impl RomEngine {
    /// Engine for a segment length, grip offset, and anatomical range
    #[must_use]
    pub fn new(segment_length_m: f64, grip_offset_m: f64, range: AngleRange) -> Self {
        Self {
            segment_length_m,
            grip_offset_m: grip_offset_m.max(0.0),
            range,
            min_samples: MIN_ROM_SAMPLES,
        }
    }

    /// Engine for a calibration profile
    #[must_use]
    pub fn from_calibration(
        profile: &CalibrationProfile,
        config: &RomConfig,
        range: AngleRange,
    ) -> Self {
        Self {
            min_samples: config.min_samples.max(MIN_ROM_SAMPLES),
            ..Self::new(profile.segment_length_m, config.grip_offset_m, range)
        }
    }

    /// Calibrated anatomical segment length (meters)
    #[must_use]
    pub const fn segment_length_m(&self) -> f64 {
        self.segment_length_m
    }

    /// Radius of the tracked point's arc (meters)
    #[must_use]
    pub fn tracked_radius_m(&self) -> f64 {
        self.segment_length_m + self.grip_offset_m
    }

    /// Anatomical range results are clamped to
    #[must_use]
    pub const fn range(&self) -> AngleRange {
        self.range
    }

    /// Estimate ROM from the positions of one repetition, in time order
    #[must_use]
    pub fn estimate(&self, positions: &[Vec3]) -> RomEstimate {
        if positions.len() < self.min_samples {
            debug!(
                samples = positions.len(),
                required = self.min_samples,
                "too few positions for ROM, neutral result"
            );
            return RomEstimate::insufficient(positions.len());
        }
        let Some(plane) = fit_projection_plane(positions) else {
            debug!(samples = positions.len(), "movement plane could not be fitted");
            return RomEstimate::insufficient(positions.len());
        };

        let start = plane.project(positions[0]);
        let chord_m = positions[1..]
            .iter()
            .map(|point| plane.project(*point).distance(start))
            .fold(0.0_f64, f64::max);

        let anatomical = chord_to_angle(chord_m, self.segment_length_m);
        let tracked_point_degrees = chord_to_angle(chord_m, self.tracked_radius_m());
        let rom_degrees = self.range.clamp(anatomical);
        let clamped = (rom_degrees - anatomical).abs() > f64::EPSILON;
        if clamped {
            warn!(
                computed_degrees = anatomical,
                min = self.range.min,
                max = self.range.max,
                "ROM outside anatomical range, clamped"
            );
        }
        debug!(
            rom_degrees,
            tracked_point_degrees,
            chord_m,
            samples = positions.len(),
            "ROM estimated"
        );

        RomEstimate {
            rom_degrees,
            tracked_point_degrees,
            chord_m,
            clamped,
            sample_count: positions.len(),
        }
    }

    /// Combine the chord estimate with the integrated gyro sweep
    ///
    /// Without a sweep the chord estimate stands; without a measured chord the
    /// sweep stands.
    #[must_use]
    pub fn fuse(
        &self,
        estimate: &RomEstimate,
        swept_degrees: Option<f64>,
        classification: &MotionClassification,
    ) -> f64 {
        let fused = match (estimate.is_measured(), swept_degrees) {
            (true, Some(swept)) => {
                let weights = classification.fusion_weights();
                weights
                    .chord
                    .mul_add(estimate.rom_degrees, weights.swept * swept)
            }
            (true, None) => estimate.rom_degrees,
            (false, Some(swept)) => swept,
            (false, None) => 0.0,
        };
        self.range.clamp(fused)
    }
}

/// Best-effort ROM over a short sliding window for on-screen feedback
///
/// Never used for reported ROM.
#[derive(Debug, Clone)]
pub struct LiveRomEstimator {
    engine: RomEngine,
    window: VecDeque<Vec3>,
    capacity: usize,
    min_interval_s: f64,
    last_emitted: Option<f64>,
}

impl LiveRomEstimator {
    /// Estimator over the newest `capacity` positions, emitting at most every `min_interval_s`
    #[must_use]
    pub fn new(engine: RomEngine, capacity: usize, min_interval_s: f64) -> Self {
        let capacity = capacity.max(MIN_ROM_SAMPLES);
        Self {
            engine,
            window: VecDeque::with_capacity(capacity),
            capacity,
            min_interval_s,
            last_emitted: None,
        }
    }

    /// Estimator configured from the ROM section
    #[must_use]
    pub fn from_config(engine: RomEngine, config: &RomConfig) -> Self {
        Self::new(engine, config.live_window, config.live_min_interval_s)
    }

    /// Add a position; returns an estimate when one is due
    pub fn push(&mut self, sample: &PositionSample) -> Option<f64> {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(sample.position);

        if self.window.len() < MIN_ROM_SAMPLES
            || self
                .last_emitted
                .is_some_and(|last| sample.timestamp - last < self.min_interval_s)
        {
            return None;
        }
        self.last_emitted = Some(sample.timestamp);
        let positions: Vec<Vec3> = self.window.iter().copied().collect();
        Some(self.engine.estimate(&positions).rom_degrees)
    }

    /// Forget the window
    pub fn reset(&mut self) {
        self.window.clear();
        self.last_emitted = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::JointDominance;

    fn arc(radius: f64, degrees: f64, steps: usize) -> Vec<Vec3> {
        (0..=steps)
            .map(|i| {
                let theta = (degrees * i as f64 / steps as f64).to_radians();
                Vec3::new(radius * theta.sin(), -radius * theta.cos(), 0.0)
            })
            .collect()
    }

    #[test]
    fn test_chord_to_angle_limits() {
        assert!((chord_to_angle(2.0, 1.0) - 180.0).abs() < 1e-9);
        assert!((chord_to_angle(5.0, 1.0) - 180.0).abs() < 1e-9);
        assert!(chord_to_angle(0.0, 1.0).abs() < 1e-12);
        assert!(chord_to_angle(1.0, 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_tracked_point_angle_is_smaller() {
        let engine = RomEngine::new(0.6, 0.15, AngleRange::new(0.0, 180.0));
        let estimate = engine.estimate(&arc(0.6, 90.0, 40));
        assert!((estimate.rom_degrees - 90.0).abs() < 1e-6);
        assert!(estimate.tracked_point_degrees < estimate.rom_degrees);
        assert!(!estimate.clamped);
    }

    #[test]
    fn test_clamps_to_profile_range() {
        let engine = RomEngine::new(0.3, 0.15, AngleRange::new(0.0, 150.0));
        let estimate = engine.estimate(&arc(0.3, 175.0, 60));
        assert!((estimate.rom_degrees - 150.0).abs() < 1e-9);
        assert!(estimate.clamped);
    }

    #[test]
    fn test_two_points_are_insufficient() {
        let engine = RomEngine::new(0.6, 0.15, AngleRange::new(0.0, 180.0));
        let estimate = engine.estimate(&[Vec3::ZERO, Vec3::UP]);
        assert!(!estimate.is_measured());
        assert!(estimate.rom_degrees.abs() < f64::EPSILON);
    }

    #[test]
    fn test_fusion_weights_by_dominance() {
        let engine = RomEngine::new(0.6, 0.15, AngleRange::new(0.0, 180.0));
        let estimate = engine.estimate(&arc(0.6, 60.0, 30));
        let distal = MotionClassification {
            dominance: JointDominance::Distal,
            ratio: 0.2,
        };
        let fused = engine.fuse(&estimate, Some(100.0), &distal);
        assert!((fused - (0.3 * 60.0 + 0.7 * 100.0)).abs() < 1e-6);

        let only_sweep = engine.fuse(&RomEstimate::insufficient(1), Some(42.0), &distal);
        assert!((only_sweep - 42.0).abs() < f64::EPSILON);
    }
}
