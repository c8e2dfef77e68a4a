// ABOUTME: Motion classifier separating shoulder-driven from wrist-driven device motion
// ABOUTME: Compares travelled path with the path an arc of the expected radius would give
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use kinemetric_core::constants::classifier::{
    DISTAL_RATIO_MAX, MIN_ANGULAR_DISPLACEMENT_RAD, WINDOW,
};
use kinemetric_core::constants::detection::MAX_INTEGRATION_GAP_S;
use kinemetric_core::models::{InertialSample, PositionSample};
use serde::{Deserialize, Serialize};

/// Which joint dominates the observed motion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointDominance {
    /// Proximal joint (shoulder): the device travels the full arc
    Proximal,
    /// Distal joint (wrist): the device rotates with little travel
    Distal,
    /// Too little rotation to tell
    Indeterminate,
}

/// Relative trust in the chord-based and rotation-based ROM estimates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    /// Weight of the chord-to-angle estimate
    pub chord: f64,
    /// Weight of the integrated gyroscope sweep
    pub swept: f64,
}

/// Result of one classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionClassification {
    /// Dominant joint
    pub dominance: JointDominance,
    /// Travelled path over expected arc length (1.0 for a pure arc about the pivot)
    pub ratio: f64,
}

impl MotionClassification {
    /// Classification that trusts the chord estimate alone
    pub const INDETERMINATE: Self = Self {
        dominance: JointDominance::Indeterminate,
        ratio: 0.0,
    };

    /// Fusion weights for ROM estimation
    #[must_use]
    pub const fn fusion_weights(&self) -> FusionWeights {
        match self.dominance {
            JointDominance::Proximal => FusionWeights {
                chord: 0.8,
                swept: 0.2,
            },
            JointDominance::Distal => FusionWeights {
                chord: 0.3,
                swept: 0.7,
            },
            JointDominance::Indeterminate => FusionWeights {
                chord: 1.0,
                swept: 0.0,
            },
        }
    }
}

/// Classifies recent motion against the calibrated tracked-point radius
#[derive(Debug, Clone, Copy)]
pub struct MotionClassifier {
    expected_radius_m: f64,
}

impl MotionClassifier {
    /// Classifier for a tracked point moving on an arc of `expected_radius_m`
    #[must_use]
    pub const fn new(expected_radius_m: f64) -> Self {
        Self { expected_radius_m }
    }

    /// Classify the most recent window of positions and inertial samples
    #[must_use]
    pub fn classify(
        &self,
        positions: &[PositionSample],
        inertial: &[InertialSample],
    ) -> MotionClassification {
        let positions = &positions[positions.len().saturating_sub(WINDOW)..];
        let inertial = &inertial[inertial.len().saturating_sub(WINDOW)..];

        let path_m: f64 = positions
            .windows(2)
            .map(|pair| pair[1].position.distance(pair[0].position))
            .sum();
        let angular_rad = angular_displacement(inertial);

        if angular_rad < MIN_ANGULAR_DISPLACEMENT_RAD
            || positions.len() < 2
            || self.expected_radius_m <= 0.0
        {
            return MotionClassification::INDETERMINATE;
        }

        let ratio = path_m / (self.expected_radius_m * angular_rad);
        let dominance = if ratio < DISTAL_RATIO_MAX {
            JointDominance::Distal
        } else {
            JointDominance::Proximal
        };
        MotionClassification { dominance, ratio }
    }
}

/// Rotation magnitude integrated over the samples (radians); gaps are capped
#[must_use]
pub fn angular_displacement(inertial: &[InertialSample]) -> f64 {
    inertial
        .windows(2)
        .map(|pair| {
            let dt = (pair[1].timestamp - pair[0].timestamp).clamp(0.0, MAX_INTEGRATION_GAP_S);
            pair[1].angular_velocity.norm() * dt
        })
        .sum()
}
