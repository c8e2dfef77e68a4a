// ABOUTME: Rep detector family: one state machine per detection method, selected by profile
// ABOUTME: RepDetector trait, shared debounce gate, and the ProfileDetector modality router
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Rep detectors
//!
//! Each detector is a pure state machine over one sensor modality. Exercises
//! never get their own detector: a [`DetectionProfile`] picks the method and
//! supplies the thresholds, and [`ProfileDetector`] routes samples of the
//! matching modality into it.

mod acceleration;
mod direction;
mod joint_angle;
mod rotation;

pub use acceleration::{AccelerationReversalConfig, AccelerationReversalDetector};
pub use direction::{DirectionReversalConfig, DirectionReversalDetector};
pub use joint_angle::{JointAngleThresholdConfig, JointAngleThresholdDetector, JointPhase};
pub use rotation::{RotationAccumulationConfig, RotationAccumulationDetector};

use kinemetric_core::models::{
    DetectionMethod, DetectionProfile, DetectorTuning, InertialSample, JointPose, PositionSample,
    RepMark,
};

/// Shared contract of every rep detector
pub trait RepDetector {
    /// Sample type consumed
    type Sample;

    /// Feed one sample; returns a mark when a repetition completes
    fn process(&mut self, sample: &Self::Sample) -> Option<RepMark>;

    /// Method tag carried by emitted marks
    fn method(&self) -> DetectionMethod;

    /// Return to the initial state, forgetting debounce history
    fn reset(&mut self);

    /// Marks emitted since creation or the last reset
    fn marks_emitted(&self) -> u32;

    /// Feed a batch of samples and collect every mark
    fn process_batch(&mut self, samples: &[Self::Sample]) -> Vec<RepMark> {
        samples
            .iter()
            .filter_map(|sample| self.process(sample))
            .collect()
    }
}

/// Minimum spacing between accepted marks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Debounce {
    min_interval_s: f64,
    last_accepted: Option<f64>,
}

impl Debounce {
    /// Gate requiring `min_interval_s` between accepted marks
    #[must_use]
    pub const fn new(min_interval_s: f64) -> Self {
        Self {
            min_interval_s,
            last_accepted: None,
        }
    }

    /// Whether a mark at `timestamp` would be accepted
    #[must_use]
    pub fn ready(&self, timestamp: f64) -> bool {
        self.last_accepted
            .is_none_or(|last| timestamp - last >= self.min_interval_s)
    }

    /// Record an accepted mark
    pub fn accept(&mut self, timestamp: f64) {
        self.last_accepted = Some(timestamp);
    }

    /// Timestamp of the last accepted mark
    #[must_use]
    pub const fn last_accepted(&self) -> Option<f64> {
        self.last_accepted
    }

    /// Forget the last accepted mark
    pub fn reset(&mut self) {
        self.last_accepted = None;
    }
}

/// Detector selected by a detection profile, routing samples by modality
///
/// Samples of a modality the selected method does not consume are ignored.
#[derive(Debug, Clone)]
pub enum ProfileDetector {
    /// Inertial acceleration reversal
    AccelerationReversal(AccelerationReversalDetector),
    /// World-pose velocity direction reversal
    DirectionReversal(DirectionReversalDetector),
    /// Inertial rotation accumulation
    RotationAccumulation(RotationAccumulationDetector),
    /// Camera joint-angle threshold
    JointAngleThreshold(JointAngleThresholdDetector),
}

impl ProfileDetector {
    /// Build the detector the profile's method calls for
    #[must_use]
    pub fn from_profile(profile: &DetectionProfile) -> Self {
        let debounce = profile.min_debounce_seconds;
        let min_samples = profile.min_samples;
        match profile.tuning {
            DetectorTuning::AccelerationReversal {
                threshold_g,
                valley_fraction,
                axis,
                smoothing_alpha,
            } => Self::AccelerationReversal(AccelerationReversalDetector::new(
                AccelerationReversalConfig {
                    threshold_g,
                    valley_fraction,
                    axis,
                    smoothing_alpha,
                    min_debounce_s: debounce,
                    min_samples,
                },
            )),
            DetectorTuning::DirectionReversal {
                min_speed_mps,
                reversal_dot,
                window,
            } => Self::DirectionReversal(DirectionReversalDetector::new(DirectionReversalConfig {
                min_speed_mps,
                reversal_dot,
                window,
                min_debounce_s: debounce,
                min_samples,
            })),
            DetectorTuning::RotationAccumulation {
                target_degrees,
                axis,
            } => Self::RotationAccumulation(RotationAccumulationDetector::new(
                RotationAccumulationConfig {
                    target_degrees,
                    axis,
                    min_debounce_s: debounce,
                    min_samples,
                },
            )),
            DetectorTuning::JointAngleThreshold {
                angle,
                engage_degrees,
                disengage_degrees,
            } => Self::JointAngleThreshold(JointAngleThresholdDetector::new(
                JointAngleThresholdConfig {
                    angle,
                    engage_degrees,
                    disengage_degrees,
                    min_debounce_s: debounce,
                    min_samples,
                },
            )),
        }
    }

    /// Feed an inertial sample
    pub fn process_inertial(&mut self, sample: &InertialSample) -> Option<RepMark> {
        match self {
            Self::AccelerationReversal(detector) => detector.process(sample),
            Self::RotationAccumulation(detector) => detector.process(sample),
            Self::DirectionReversal(_) | Self::JointAngleThreshold(_) => None,
        }
    }

    /// Feed a world-tracked position sample
    pub fn process_position(&mut self, sample: &PositionSample) -> Option<RepMark> {
        match self {
            Self::DirectionReversal(detector) => detector.process(sample),
            _ => None,
        }
    }

    /// Feed a camera body-pose frame
    pub fn process_joints(&mut self, pose: &JointPose) -> Option<RepMark> {
        match self {
            Self::JointAngleThreshold(detector) => detector.process(pose),
            _ => None,
        }
    }

    /// Method tag of the selected detector
    #[must_use]
    pub fn method(&self) -> DetectionMethod {
        match self {
            Self::AccelerationReversal(d) => d.method(),
            Self::DirectionReversal(d) => d.method(),
            Self::RotationAccumulation(d) => d.method(),
            Self::JointAngleThreshold(d) => d.method(),
        }
    }

    /// Reset the selected detector
    pub fn reset(&mut self) {
        match self {
            Self::AccelerationReversal(d) => d.reset(),
            Self::DirectionReversal(d) => d.reset(),
            Self::RotationAccumulation(d) => d.reset(),
            Self::JointAngleThreshold(d) => d.reset(),
        }
    }

    /// Marks emitted by the selected detector
    #[must_use]
    pub fn marks_emitted(&self) -> u32 {
        match self {
            Self::AccelerationReversal(d) => d.marks_emitted(),
            Self::DirectionReversal(d) => d.marks_emitted(),
            Self::RotationAccumulation(d) => d.marks_emitted(),
            Self::JointAngleThreshold(d) => d.marks_emitted(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinemetric_core::models::ExerciseId;

    #[test]
    fn test_debounce_gate() {
        let mut gate = Debounce::new(0.3);
        assert!(gate.ready(0.0));
        gate.accept(1.0);
        assert!(!gate.ready(1.2));
        assert!(gate.ready(1.3));
        gate.reset();
        assert!(gate.ready(1.01));
    }

    #[test]
    fn test_profile_selects_method() {
        for id in ExerciseId::ALL {
            let profile = DetectionProfile::for_exercise(id);
            assert_eq!(ProfileDetector::from_profile(&profile).method(), profile.method());
        }
    }
}
