// ABOUTME: Three-reference calibration capture and the triangulation that turns it into a profile
// ABOUTME: Hold-still validation, radius and pivot estimation, and orientation-based accuracy scoring
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use kinemetric_core::config::CalibrationConfig;
use kinemetric_core::errors::CalibrationError;
use kinemetric_core::models::{CalibrationProfile, PoseFrame, Quaternion, ReferenceAngle, Vec3};
use std::collections::BTreeMap;
use std::f64::consts::{PI, SQRT_2};
use tracing::{debug, info, warn};

/// Radii below this mean the three references were captured in one place
const MIN_TRACKED_RADIUS_M: f64 = 0.05;

/// One accepted reference hold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapturedReference {
    /// Centroid of the hold samples
    pub position: Vec3,
    /// Orientation of the sample nearest the centroid
    pub orientation: Quaternion,
    /// Largest sample-to-centroid distance (meters)
    pub spread_m: f64,
}

/// Orientation agreement with the expected reference separations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationAccuracy {
    /// 1 − mean relative deviation, in [0, 1]
    pub accuracy: f64,
    /// Largest relative deviation of any pair, as a fraction
    pub worst_deviation: f64,
}

/// Stateful capture of the 0°, 90°, and 180° reference holds
///
/// Each hold is recorded independently so the collaborator can re-prompt a
/// single position after a rejection.
#[derive(Debug, Clone)]
pub struct CalibrationCapture {
    config: CalibrationConfig,
    references: BTreeMap<ReferenceAngle, CapturedReference>,
}

impl CalibrationCapture {
    /// Start an empty capture
    #[must_use]
    pub fn new(config: &CalibrationConfig) -> Self {
        Self {
            config: config.clone(),
            references: BTreeMap::new(),
        }
    }

    /// Record one reference hold from the frames captured while the user held still
    ///
    /// Frames with non-normal tracking are ignored. The newest
    /// `samples_per_reference` usable frames are averaged.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientSamples` when too few frames had normal tracking and
    /// `HighVariance` when any sample strayed beyond the hold-still bound. Both
    /// are retryable; a rejected hold leaves earlier holds intact.
    pub fn record(
        &mut self,
        angle: ReferenceAngle,
        frames: &[PoseFrame],
    ) -> Result<Vec3, CalibrationError> {
        let usable: Vec<_> = frames.iter().filter_map(PoseFrame::to_sample).collect();
        let required = self.config.samples_per_reference;
        if usable.len() < required {
            debug!(%angle, usable = usable.len(), required, "calibration hold lacks samples");
            return Err(CalibrationError::InsufficientSamples {
                angle,
                required,
                actual: usable.len(),
            });
        }

        let window = &usable[usable.len() - required..];
        let positions: Vec<Vec3> = window.iter().map(|s| s.position).collect();
        let Some(centroid) = Vec3::centroid(&positions) else {
            return Err(CalibrationError::InsufficientSamples {
                angle,
                required,
                actual: 0,
            });
        };

        let mut spread_m = 0.0_f64;
        let mut nearest = window[0];
        let mut nearest_distance = f64::INFINITY;
        for sample in window {
            let distance = sample.position.distance(centroid);
            spread_m = spread_m.max(distance);
            if distance < nearest_distance {
                nearest_distance = distance;
                nearest = *sample;
            }
        }

        if spread_m > self.config.max_capture_deviation_m {
            warn!(
                %angle,
                deviation_m = spread_m,
                limit_m = self.config.max_capture_deviation_m,
                "calibration hold rejected, user moved during capture"
            );
            return Err(CalibrationError::HighVariance {
                angle,
                deviation_m: spread_m,
                limit_m: self.config.max_capture_deviation_m,
            });
        }

        self.references.insert(
            angle,
            CapturedReference {
                position: centroid,
                orientation: nearest.orientation,
                spread_m,
            },
        );
        debug!(%angle, spread_m, "calibration hold accepted");
        Ok(centroid)
    }

    /// Whether every reference angle has been captured
    #[must_use]
    pub fn is_complete(&self) -> bool {
        ReferenceAngle::ALL
            .iter()
            .all(|angle| self.references.contains_key(angle))
    }

    /// Accepted hold for one reference angle
    #[must_use]
    pub fn reference(&self, angle: ReferenceAngle) -> Option<&CapturedReference> {
        self.references.get(&angle)
    }

    /// Discard every hold
    pub fn reset(&mut self) {
        self.references.clear();
    }

    /// Triangulate the captured holds into a profile
    ///
    /// `up` is the world up axis, used to orient the pivot when the holds are
    /// collinear.
    ///
    /// # Errors
    ///
    /// Returns `MissingReference` until every hold is recorded,
    /// `DegenerateGeometry` when the holds do not span an arc, and `Inaccurate`
    /// when the device orientations disagree with the reference angles.
    pub fn finish(&self, up: Vec3, now: DateTime<Utc>) -> Result<CalibrationProfile, CalibrationError> {
        let [zero, quarter, half] = self.required_references()?;

        let radius = estimate_tracked_radius(zero.position, quarter.position, half.position)
            .ok_or(CalibrationError::DegenerateGeometry(
                "reference positions coincide",
            ))?;
        let pivot = triangulate_pivot(zero.position, quarter.position, half.position, radius, up);

        let scored = orientation_accuracy(zero.orientation, quarter.orientation, half.orientation);
        if scored.worst_deviation > self.config.max_orientation_deviation {
            warn!(
                accuracy = scored.accuracy,
                worst_deviation = scored.worst_deviation,
                "calibration orientations disagree with reference angles"
            );
            return Err(CalibrationError::Inaccurate {
                accuracy: scored.accuracy,
                worst_deviation: scored.worst_deviation * 100.0,
            });
        }

        let profile = CalibrationProfile::new(
            radius - self.config.grip_offset_m,
            pivot,
            scored.accuracy,
            now,
        );
        info!(
            segment_length_m = profile.segment_length_m,
            tracked_radius_m = radius,
            accuracy = profile.accuracy,
            "calibration complete"
        );
        Ok(profile)
    }

    fn required_references(&self) -> Result<[CapturedReference; 3], CalibrationError> {
        let get = |angle| {
            self.references
                .get(&angle)
                .copied()
                .ok_or(CalibrationError::MissingReference(angle))
        };
        Ok([
            get(ReferenceAngle::Zero)?,
            get(ReferenceAngle::Quarter)?,
            get(ReferenceAngle::Half)?,
        ])
    }
}

/// Radius of the tracked point's arc from the three reference positions
///
/// The 0°→90° and 90°→180° chords subtend a right angle (chord = R√2); the
/// 0°→180° chord is a diameter. The three estimates are averaged.
#[must_use]
pub fn estimate_tracked_radius(p0: Vec3, p90: Vec3, p180: Vec3) -> Option<f64> {
    let r1 = p0.distance(p90) / SQRT_2;
    let r2 = p90.distance(p180) / SQRT_2;
    let r3 = p0.distance(p180) / 2.0;
    let radius = (r1 + r2 + r3) / 3.0;
    (radius.is_finite() && radius >= MIN_TRACKED_RADIUS_M).then_some(radius)
}

/// Pivot joint location: center of the circle of `radius` through p0 and p180,
/// on the side of the chord away from p90
#[must_use]
pub fn triangulate_pivot(p0: Vec3, p90: Vec3, p180: Vec3, radius: f64, up: Vec3) -> Vec3 {
    let midpoint = (p0 + p180) / 2.0;
    let chord = p180 - p0;
    let half_chord = chord.norm() / 2.0;
    let offset = (radius * radius - half_chord * half_chord).max(0.0).sqrt();
    if offset <= f64::EPSILON {
        return midpoint;
    }

    let arc_normal = chord.cross(p90 - p0);
    let in_plane = arc_normal.cross(chord).normalized().map_or_else(
        || {
            // Collinear holds: offset against the up axis, perpendicular to the chord
            let chord_dir = chord.normalized().unwrap_or(Vec3::UP);
            (up - chord_dir * up.dot(chord_dir)).normalized().map(|v| -v)
        },
        Some,
    );
    let Some(mut direction) = in_plane else {
        return midpoint;
    };
    if direction.dot(p90 - midpoint) > 0.0 {
        direction = -direction;
    }
    midpoint + direction * offset
}

/// Accuracy from how well the orientation separations match 90°, 90°, and 180°
#[must_use]
pub fn orientation_accuracy(q0: Quaternion, q90: Quaternion, q180: Quaternion) -> OrientationAccuracy {
    let pairs = [
        (q0.angle_to(q90), PI / 2.0),
        (q90.angle_to(q180), PI / 2.0),
        (q0.angle_to(q180), PI),
    ];
    let deviations: Vec<f64> = pairs
        .iter()
        .map(|(actual, expected)| (actual - expected).abs() / expected)
        .collect();
    let mean = deviations.iter().sum::<f64>() / deviations.len() as f64;
    let worst = deviations.iter().copied().fold(0.0_f64, f64::max);
    OrientationAccuracy {
        accuracy: (1.0 - mean).clamp(0.0, 1.0),
        worst_deviation: worst,
    }
}
