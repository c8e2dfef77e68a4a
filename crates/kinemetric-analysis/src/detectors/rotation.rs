// ABOUTME: Rotation-accumulation rep detector integrating signed angular velocity about one axis
// ABOUTME: Emits a rep each time accumulated rotation crosses the target, then restarts from zero
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{Debounce, ProfileDetector, RepDetector};
use kinemetric_core::constants::detection::MAX_INTEGRATION_GAP_S;
use kinemetric_core::models::{DetectionMethod, DetectionProfile, InertialSample, ReferenceAxis, RepMark};
use tracing::debug;

/// Rotation-accumulation parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationAccumulationConfig {
    /// Accumulated rotation that completes one rep (degrees)
    pub target_degrees: f64,
    /// Device axis integrated
    pub axis: ReferenceAxis,
    /// Minimum time between marks (seconds)
    pub min_debounce_s: f64,
    /// Samples integrated before a crossing counts
    pub min_samples: usize,
}

/// Counts full turns by integrating angular velocity
#[derive(Debug, Clone)]
pub struct RotationAccumulationDetector {
    config: RotationAccumulationConfig,
    accumulated_degrees: f64,
    samples_since_mark: usize,
    last_timestamp: Option<f64>,
    segment_start: Option<f64>,
    debounce: Debounce,
    marks: u32,
}

impl RotationAccumulationDetector {
    /// Create a detector
    #[must_use]
    pub const fn new(config: RotationAccumulationConfig) -> Self {
        Self {
            config,
            accumulated_degrees: 0.0,
            samples_since_mark: 0,
            last_timestamp: None,
            segment_start: None,
            debounce: Debounce::new(config.min_debounce_s),
            marks: 0,
        }
    }

    /// Create a detector from a rotation-accumulation profile
    #[must_use]
    pub fn from_profile(profile: &DetectionProfile) -> Option<Self> {
        match ProfileDetector::from_profile(profile) {
            ProfileDetector::RotationAccumulation(detector) => Some(detector),
            _ => None,
        }
    }

    /// Signed rotation accumulated since the last mark (degrees)
    #[must_use]
    pub const fn accumulated_degrees(&self) -> f64 {
        self.accumulated_degrees
    }
}

impl RepDetector for RotationAccumulationDetector {
    type Sample = InertialSample;

    fn process(&mut self, sample: &InertialSample) -> Option<RepMark> {
        let timestamp = sample.timestamp;
        let Some(previous) = self.last_timestamp.replace(timestamp) else {
            self.segment_start = Some(timestamp);
            return None;
        };
        let dt = (timestamp - previous).clamp(0.0, MAX_INTEGRATION_GAP_S);
        let rate = sample.angular_velocity.dot(self.config.axis.unit());
        self.accumulated_degrees += rate.to_degrees() * dt;
        self.samples_since_mark += 1;

        if self.accumulated_degrees.abs() < self.config.target_degrees
            || self.samples_since_mark < self.config.min_samples
            || !self.debounce.ready(timestamp)
        {
            return None;
        }

        let peak = self.accumulated_degrees.abs();
        let turn_seconds = self.segment_start.map_or(0.0, |start| timestamp - start);
        self.accumulated_degrees = 0.0;
        self.samples_since_mark = 0;
        self.segment_start = Some(timestamp);
        self.debounce.accept(timestamp);
        self.marks += 1;
        debug!(degrees = peak, turn_seconds, timestamp, "rotation accumulation rep");
        Some(RepMark {
            timestamp,
            boundary: timestamp,
            method: DetectionMethod::RotationAccumulation,
            measured_rom_degrees: None,
            peak,
        })
    }

    fn method(&self) -> DetectionMethod {
        DetectionMethod::RotationAccumulation
    }

    fn reset(&mut self) {
        self.accumulated_degrees = 0.0;
        self.samples_since_mark = 0;
        self.last_timestamp = None;
        self.segment_start = None;
        self.debounce.reset();
        self.marks = 0;
    }

    fn marks_emitted(&self) -> u32 {
        self.marks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinemetric_core::models::{Quaternion, Vec3};

    fn spin(t: f64, rad_s: f64) -> InertialSample {
        InertialSample {
            acceleration: Vec3::ZERO,
            angular_velocity: Vec3::new(0.0, 0.0, rad_s),
            orientation: Quaternion::IDENTITY,
            timestamp: t,
        }
    }

    fn detector() -> RotationAccumulationDetector {
        RotationAccumulationDetector::new(RotationAccumulationConfig {
            target_degrees: 350.0,
            axis: ReferenceAxis::Z,
            min_debounce_s: 0.5,
            min_samples: 10,
        })
    }

    #[test]
    fn test_back_and_forth_cancels_out() {
        let mut detector = detector();
        let samples: Vec<_> = (0..600)
            .map(|i| {
                let t = f64::from(i) / 60.0;
                let rate = if (i / 30) % 2 == 0 { 3.0 } else { -3.0 };
                spin(t, rate)
            })
            .collect();
        assert!(detector.process_batch(&samples).is_empty());
        assert!(detector.accumulated_degrees().abs() < 200.0);
    }

    #[test]
    fn test_sensor_gap_is_capped() {
        let mut detector = detector();
        detector.process(&spin(0.0, 6.0));
        // A 5 s dropout must not integrate into a full turn
        assert!(detector.process(&spin(5.0, 6.0)).is_none());
        assert!(detector.accumulated_degrees() < 90.0);
    }
}
