// ABOUTME: Core data model for the motion-analysis core
// ABOUTME: Re-exports geometry, sensor samples, calibration, detection profiles, and output events
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Learned body geometry and reference angles
pub mod calibration;
/// Rep marks, rep events, session events, and session metrics
pub mod events;
/// Vector, point, and quaternion value types
pub mod geometry;
/// Per-exercise detection profiles
pub mod profile;
/// Sensor samples from the inertial, world-tracking, and camera collaborators
pub mod samples;

pub use calibration::{clamp_segment_length, CalibrationKey, CalibrationProfile, ReferenceAngle};
pub use events::{consistency_score, QualityGrade, RepEvent, RepMark, SessionEvent, SessionMetrics};
pub use geometry::{Point2, Quaternion, Vec3};
pub use profile::{
    AngleRange, DetectionMethod, DetectionProfile, DetectorTuning, ExerciseId, JointAngleKind,
    ReferenceAxis, SensorModality,
};
pub use samples::{
    BodyJoint, InertialSample, JointPose, Keypoint, PoseFrame, PositionSample, SensorSample,
    Side, Timestamped, TrackingQuality,
};
