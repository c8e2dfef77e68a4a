// ABOUTME: Sensor sample types consumed from the inertial, world-tracking, and camera collaborators
// ABOUTME: InertialSample, PoseFrame/PositionSample, JointPose keypoints, and the SensorSample envelope
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::geometry::{Point2, Quaternion, Vec3};
use crate::constants::detection::MIN_JOINT_CONFIDENCE;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Anything carrying a monotonic timestamp in seconds
pub trait Timestamped {
    /// Sample time in seconds on the producer's monotonic clock
    fn timestamp(&self) -> f64;
}

/// One IMU reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InertialSample {
    /// Gravity-compensated linear acceleration in g, device frame
    pub acceleration: Vec3,
    /// Angular velocity in rad/s, device frame
    pub angular_velocity: Vec3,
    /// Device orientation in the world frame
    #[serde(default)]
    pub orientation: Quaternion,
    /// Seconds, monotonic
    pub timestamp: f64,
}

impl Timestamped for InertialSample {
    fn timestamp(&self) -> f64 {
        self.timestamp
    }
}

/// World-tracking quality reported with each pose frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingQuality {
    /// Tracking is reliable
    #[default]
    Normal,
    /// Tracking is degraded (fast motion, low texture, relocalizing)
    Limited,
    /// Tracking is lost
    Lost,
}

/// One world-tracked device pose frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    /// Translation in a gravity-aligned world frame (meters)
    pub position: Vec3,
    /// Device orientation
    #[serde(default)]
    pub orientation: Quaternion,
    /// Seconds, monotonic
    pub timestamp: f64,
    /// Tracking quality for this frame
    #[serde(default)]
    pub tracking: TrackingQuality,
}

impl PoseFrame {
    /// Usable position sample, or `None` while tracking is not normal
    #[must_use]
    pub fn to_sample(&self) -> Option<PositionSample> {
        (self.tracking == TrackingQuality::Normal).then_some(PositionSample {
            position: self.position,
            orientation: self.orientation,
            timestamp: self.timestamp,
        })
    }
}

impl Timestamped for PoseFrame {
    fn timestamp(&self) -> f64 {
        self.timestamp
    }
}

/// One 3D device-pose sample accepted for analysis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    /// Position in meters
    pub position: Vec3,
    /// Orientation at capture time
    pub orientation: Quaternion,
    /// Seconds, strictly increasing within a stream
    pub timestamp: f64,
}

impl Timestamped for PositionSample {
    fn timestamp(&self) -> f64 {
        self.timestamp
    }
}

/// Body joints reported by the camera pose estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyJoint {
    /// Nose
    Nose,
    /// Base of the neck
    Neck,
    /// Left shoulder
    LeftShoulder,
    /// Right shoulder
    RightShoulder,
    /// Left elbow
    LeftElbow,
    /// Right elbow
    RightElbow,
    /// Left wrist
    LeftWrist,
    /// Right wrist
    RightWrist,
    /// Left hip
    LeftHip,
    /// Right hip
    RightHip,
    /// Left knee
    LeftKnee,
    /// Right knee
    RightKnee,
    /// Left ankle
    LeftAnkle,
    /// Right ankle
    RightAnkle,
}

impl fmt::Display for BodyJoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Body side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Left side of the body
    Left,
    /// Right side of the body
    Right,
}

impl Side {
    /// Shoulder joint on this side
    #[must_use]
    pub const fn shoulder(self) -> BodyJoint {
        match self {
            Self::Left => BodyJoint::LeftShoulder,
            Self::Right => BodyJoint::RightShoulder,
        }
    }

    /// Shoulder joint on the other side
    #[must_use]
    pub const fn opposite_shoulder(self) -> BodyJoint {
        match self {
            Self::Left => BodyJoint::RightShoulder,
            Self::Right => BodyJoint::LeftShoulder,
        }
    }

    /// Elbow joint on this side
    #[must_use]
    pub const fn elbow(self) -> BodyJoint {
        match self {
            Self::Left => BodyJoint::LeftElbow,
            Self::Right => BodyJoint::RightElbow,
        }
    }

    /// Wrist joint on this side
    #[must_use]
    pub const fn wrist(self) -> BodyJoint {
        match self {
            Self::Left => BodyJoint::LeftWrist,
            Self::Right => BodyJoint::RightWrist,
        }
    }

    /// Hip joint on this side
    #[must_use]
    pub const fn hip(self) -> BodyJoint {
        match self {
            Self::Left => BodyJoint::LeftHip,
            Self::Right => BodyJoint::RightHip,
        }
    }

    /// Knee joint on this side
    #[must_use]
    pub const fn knee(self) -> BodyJoint {
        match self {
            Self::Left => BodyJoint::LeftKnee,
            Self::Right => BodyJoint::RightKnee,
        }
    }

    /// Ankle joint on this side
    #[must_use]
    pub const fn ankle(self) -> BodyJoint {
        match self {
            Self::Left => BodyJoint::LeftAnkle,
            Self::Right => BodyJoint::RightAnkle,
        }
    }
}

/// One detected joint in normalized, un-mirrored image space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// Normalized horizontal position
    pub x: f64,
    /// Normalized vertical position (grows downward)
    pub y: f64,
    /// Detection confidence in [0, 1]
    pub confidence: f64,
}

impl Keypoint {
    /// Create a keypoint, clamping confidence into [0, 1]
    #[must_use]
    pub fn new(x: f64, y: f64, confidence: f64) -> Self {
        Self {
            x,
            y,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Position as a point
    #[must_use]
    pub const fn point(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

/// One camera-derived body-pose frame
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JointPose {
    /// Detected joints; absent joints are simply missing
    pub joints: BTreeMap<BodyJoint, Keypoint>,
    /// Seconds, monotonic
    pub timestamp: f64,
}

impl JointPose {
    /// Create an empty frame
    #[must_use]
    pub const fn new(timestamp: f64) -> Self {
        Self {
            joints: BTreeMap::new(),
            timestamp,
        }
    }

    /// Builder-style insert
    #[must_use]
    pub fn with_joint(mut self, joint: BodyJoint, keypoint: Keypoint) -> Self {
        self.joints.insert(joint, keypoint);
        self
    }

    /// Joint if present with at least the minimum usable confidence
    #[must_use]
    pub fn joint(&self, joint: BodyJoint) -> Option<&Keypoint> {
        self.joints
            .get(&joint)
            .filter(|kp| kp.confidence >= MIN_JOINT_CONFIDENCE)
    }
}

impl Timestamped for JointPose {
    fn timestamp(&self) -> f64 {
        self.timestamp
    }
}

/// Envelope for routing any modality into a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SensorSample {
    /// IMU reading
    Inertial(InertialSample),
    /// World-tracked pose frame
    Pose(PoseFrame),
    /// Camera body-pose frame
    Joints(JointPose),
}

impl Timestamped for SensorSample {
    fn timestamp(&self) -> f64 {
        match self {
            Self::Inertial(s) => s.timestamp,
            Self::Pose(s) => s.timestamp,
            Self::Joints(s) => s.timestamp,
        }
    }
}
