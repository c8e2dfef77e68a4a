// ABOUTME: Per-exercise detection profiles looked up by exercise id from a constant table
// ABOUTME: Sensor modality, detection method, method-specific tuning, debounce, and anatomical range
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::geometry::Vec3;
use super::samples::{BodyJoint, Side};
use crate::constants::detection::{DEFAULT_REVERSAL_DOT, ROTATION_TARGET_DEGREES};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Exercises with a detection profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExerciseId {
    /// Hand-held side-to-side fanning motion
    SideToSideFan,
    /// Hand-held pendulum swing tracked in world space
    PendulumSwing,
    /// Hand-held forward reach tracked in world space
    ForwardReach,
    /// Hand-held arm circles counted by accumulated rotation
    ArmCircles,
    /// Camera-observed shoulder raise
    ShoulderRaise,
    /// Camera-observed elbow flexion
    ElbowFlexion,
}

impl ExerciseId {
    /// Every exercise with a profile
    pub const ALL: [Self; 6] = [
        Self::SideToSideFan,
        Self::PendulumSwing,
        Self::ForwardReach,
        Self::ArmCircles,
        Self::ShoulderRaise,
        Self::ElbowFlexion,
    ];

    /// Stable kebab-case name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SideToSideFan => "side-to-side-fan",
            Self::PendulumSwing => "pendulum-swing",
            Self::ForwardReach => "forward-reach",
            Self::ArmCircles => "arm-circles",
            Self::ShoulderRaise => "shoulder-raise",
            Self::ElbowFlexion => "elbow-flexion",
        }
    }
}

impl fmt::Display for ExerciseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown exercise: {s}"))
    }
}

/// Sensor stream that drives rep detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorModality {
    /// Device IMU (acceleration, angular velocity)
    Inertial,
    /// World-tracked device pose
    WorldPose,
    /// Camera body-pose keypoints
    CameraPose,
}

/// Detection method tag, also carried by every rep event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// Smoothed acceleration peak followed by a sign reversal
    AccelerationReversal,
    /// 3D velocity direction reversal
    DirectionReversal,
    /// Accumulated rotation crossing a target
    RotationAccumulation,
    /// Joint angle crossing engage/disengage thresholds
    JointAngleThreshold,
}

/// Device-frame axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceAxis {
    /// Device X
    X,
    /// Device Y
    Y,
    /// Device Z
    Z,
}

impl ReferenceAxis {
    /// Unit vector along the axis
    #[must_use]
    pub const fn unit(self) -> Vec3 {
        match self {
            Self::X => Vec3::new(1.0, 0.0, 0.0),
            Self::Y => Vec3::new(0.0, 1.0, 0.0),
            Self::Z => Vec3::new(0.0, 0.0, 1.0),
        }
    }
}

/// Named joint angle extracted from a camera pose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointAngleKind {
    /// Upper-arm elevation relative to the trunk (0° arm down, 180° overhead)
    ShoulderElevation(Side),
    /// Elbow flexion (0° straight arm)
    ElbowFlexion(Side),
    /// Knee flexion (0° straight leg)
    KneeFlexion(Side),
}

impl JointAngleKind {
    /// End of the moving chain, followed for limb smoothness
    #[must_use]
    pub const fn distal_joint(self) -> BodyJoint {
        match self {
            Self::ShoulderElevation(side) | Self::ElbowFlexion(side) => side.wrist(),
            Self::KneeFlexion(side) => side.ankle(),
        }
    }
}

/// Inclusive angle range in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleRange {
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
}

impl AngleRange {
    /// Create a range
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Clamp a value into the range
    #[must_use]
    pub fn clamp(&self, degrees: f64) -> f64 {
        degrees.clamp(self.min, self.max)
    }

    /// Whether a value lies inside the range
    #[must_use]
    pub fn contains(&self, degrees: f64) -> bool {
        (self.min..=self.max).contains(&degrees)
    }
}

/// Method-specific detector parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum DetectorTuning {
    /// Accelerometer-reversal parameters
    AccelerationReversal {
        /// Trigger threshold (g)
        threshold_g: f64,
        /// Opposite-sign fraction of the threshold that closes a peak
        valley_fraction: f64,
        /// Device axis the acceleration is projected onto
        axis: ReferenceAxis,
        /// Exponential moving average weight of the newest sample
        smoothing_alpha: f64,
    },
    /// Velocity-direction-reversal parameters
    DirectionReversal {
        /// Minimum window speed; slower motion is treated as jitter (m/s)
        min_speed_mps: f64,
        /// Dot product below which directions count as reversed
        reversal_dot: f64,
        /// Positions in the sliding velocity window
        window: usize,
    },
    /// Rotation-accumulation parameters
    RotationAccumulation {
        /// Accumulated rotation that completes one rep (degrees)
        target_degrees: f64,
        /// Device axis integrated
        axis: ReferenceAxis,
    },
    /// Joint-angle-threshold parameters
    JointAngleThreshold {
        /// Tracked joint angle
        angle: JointAngleKind,
        /// Angle that starts peak tracking (degrees)
        engage_degrees: f64,
        /// Angle that closes the rep (degrees)
        disengage_degrees: f64,
    },
}

/// Per-exercise tuning, selected by exercise id and never mutated at runtime
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionProfile {
    /// Exercise this profile belongs to
    pub exercise: ExerciseId,
    /// Stream that drives detection
    pub modality: SensorModality,
    /// Method-specific parameters
    pub tuning: DetectorTuning,
    /// Minimum time between accepted reps (seconds)
    pub min_debounce_seconds: f64,
    /// Samples required in a sustained direction before a peak is recognized
    pub min_samples: usize,
    /// Smallest clinically meaningful ROM (degrees)
    pub therapeutic_min_degrees: f64,
    /// Anatomical range reported ROM is clamped to
    pub anatomical_range: AngleRange,
}

impl DetectionProfile {
    /// Look up the profile for an exercise
    #[must_use]
    pub const fn for_exercise(exercise: ExerciseId) -> Self {
        match exercise {
            ExerciseId::SideToSideFan => Self {
                exercise,
                modality: SensorModality::Inertial,
                tuning: DetectorTuning::AccelerationReversal {
                    threshold_g: 0.18,
                    valley_fraction: 0.5,
                    axis: ReferenceAxis::X,
                    smoothing_alpha: 0.5,
                },
                min_debounce_seconds: 0.28,
                min_samples: 3,
                therapeutic_min_degrees: 5.0,
                anatomical_range: AngleRange::new(0.0, 180.0),
            },
            ExerciseId::PendulumSwing => Self {
                exercise,
                modality: SensorModality::WorldPose,
                tuning: DetectorTuning::DirectionReversal {
                    min_speed_mps: 0.05,
                    reversal_dot: DEFAULT_REVERSAL_DOT,
                    window: 6,
                },
                min_debounce_seconds: 0.30,
                min_samples: 4,
                therapeutic_min_degrees: 5.0,
                anatomical_range: AngleRange::new(0.0, 180.0),
            },
            ExerciseId::ForwardReach => Self {
                exercise,
                modality: SensorModality::WorldPose,
                tuning: DetectorTuning::DirectionReversal {
                    min_speed_mps: 0.06,
                    reversal_dot: DEFAULT_REVERSAL_DOT,
                    window: 6,
                },
                min_debounce_seconds: 0.40,
                min_samples: 5,
                therapeutic_min_degrees: 15.0,
                anatomical_range: AngleRange::new(0.0, 180.0),
            },
            ExerciseId::ArmCircles => Self {
                exercise,
                modality: SensorModality::Inertial,
                tuning: DetectorTuning::RotationAccumulation {
                    target_degrees: ROTATION_TARGET_DEGREES,
                    axis: ReferenceAxis::Z,
                },
                min_debounce_seconds: 0.50,
                min_samples: 10,
                therapeutic_min_degrees: 30.0,
                anatomical_range: AngleRange::new(0.0, 180.0),
            },
            ExerciseId::ShoulderRaise => Self {
                exercise,
                modality: SensorModality::CameraPose,
                tuning: DetectorTuning::JointAngleThreshold {
                    angle: JointAngleKind::ShoulderElevation(Side::Right),
                    engage_degrees: 40.0,
                    disengage_degrees: 25.0,
                },
                min_debounce_seconds: 0.50,
                min_samples: 5,
                therapeutic_min_degrees: 20.0,
                anatomical_range: AngleRange::new(0.0, 180.0),
            },
            ExerciseId::ElbowFlexion => Self {
                exercise,
                modality: SensorModality::CameraPose,
                tuning: DetectorTuning::JointAngleThreshold {
                    angle: JointAngleKind::ElbowFlexion(Side::Right),
                    engage_degrees: 45.0,
                    disengage_degrees: 20.0,
                },
                min_debounce_seconds: 0.40,
                min_samples: 5,
                therapeutic_min_degrees: 25.0,
                anatomical_range: AngleRange::new(0.0, 150.0),
            },
        }
    }

    /// Detection method tag
    #[must_use]
    pub const fn method(&self) -> DetectionMethod {
        match self.tuning {
            DetectorTuning::AccelerationReversal { .. } => DetectionMethod::AccelerationReversal,
            DetectorTuning::DirectionReversal { .. } => DetectionMethod::DirectionReversal,
            DetectorTuning::RotationAccumulation { .. } => DetectionMethod::RotationAccumulation,
            DetectorTuning::JointAngleThreshold { .. } => DetectionMethod::JointAngleThreshold,
        }
    }

    /// Headline trigger threshold in the method's own unit
    /// (g, m/s, degrees of rotation, or engage angle)
    #[must_use]
    pub const fn trigger_threshold(&self) -> f64 {
        match self.tuning {
            DetectorTuning::AccelerationReversal { threshold_g, .. } => threshold_g,
            DetectorTuning::DirectionReversal { min_speed_mps, .. } => min_speed_mps,
            DetectorTuning::RotationAccumulation { target_degrees, .. } => target_degrees,
            DetectorTuning::JointAngleThreshold { engage_degrees, .. } => engage_degrees,
        }
    }

    /// Copy of this profile with a different side for camera joint angles
    #[must_use]
    pub fn with_side(mut self, side: Side) -> Self {
        if let DetectorTuning::JointAngleThreshold {
            angle,
            engage_degrees,
            disengage_degrees,
        } = self.tuning
        {
            let angle = match angle {
                JointAngleKind::ShoulderElevation(_) => JointAngleKind::ShoulderElevation(side),
                JointAngleKind::ElbowFlexion(_) => JointAngleKind::ElbowFlexion(side),
                JointAngleKind::KneeFlexion(_) => JointAngleKind::KneeFlexion(side),
            };
            self.tuning = DetectorTuning::JointAngleThreshold {
                angle,
                engage_degrees,
                disengage_degrees,
            };
        }
        self
    }
}
