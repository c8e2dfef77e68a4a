// ABOUTME: Named joint angles from camera body-pose keypoints with explicit fallback references
// ABOUTME: Shoulder elevation against the trunk, and elbow/knee flexion from three-joint chains
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use kinemetric_core::models::{BodyJoint, JointAngleKind, JointPose, Point2, Side};
use serde::{Deserialize, Serialize};

/// Trunk reference used for shoulder elevation, in fallback order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrunkReference {
    /// Shoulder-to-hip line on the same side
    Hip,
    /// Perpendicular to the line between both shoulders
    ShoulderLine,
    /// Image vertical
    ScreenVertical,
}

/// One joint-angle measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointAngleReading {
    /// Angle in degrees
    pub degrees: f64,
    /// Trunk reference used, for shoulder elevation only
    pub reference: Option<TrunkReference>,
}

/// Measure a named joint angle; `None` when a required joint is missing
#[must_use]
pub fn joint_angle(pose: &JointPose, kind: JointAngleKind) -> Option<JointAngleReading> {
    match kind {
        JointAngleKind::ShoulderElevation(side) => shoulder_elevation(pose, side),
        JointAngleKind::ElbowFlexion(side) => {
            flexion(pose, side.shoulder(), side.elbow(), side.wrist())
        }
        JointAngleKind::KneeFlexion(side) => flexion(pose, side.hip(), side.knee(), side.ankle()),
    }
}

fn point(pose: &JointPose, joint: BodyJoint) -> Option<Point2> {
    pose.joint(joint).map(|kp| kp.point())
}

fn shoulder_elevation(pose: &JointPose, side: Side) -> Option<JointAngleReading> {
    let shoulder = point(pose, side.shoulder())?;
    // Upper arm, or the whole arm when the elbow is occluded
    let arm = point(pose, side.elbow())
        .or_else(|| point(pose, side.wrist()))
        .map(|end| shoulder.to(end))?;

    let (down, reference) = trunk_down(pose, side, shoulder);
    let degrees = arm.angle_between_degrees(down)?;
    Some(JointAngleReading {
        degrees,
        reference: Some(reference),
    })
}

/// Downward trunk direction from the shoulder
fn trunk_down(pose: &JointPose, side: Side, shoulder: Point2) -> (Point2, TrunkReference) {
    if let Some(hip) = point(pose, side.hip()) {
        let down = shoulder.to(hip);
        if down.norm() > f64::EPSILON {
            return (down, TrunkReference::Hip);
        }
    }
    if let Some(other) = point(pose, side.opposite_shoulder()) {
        let line = shoulder.to(other);
        if line.norm() > f64::EPSILON {
            // Image y grows downward: take the perpendicular pointing down
            let perpendicular = Point2::new(-line.y, line.x);
            let down = if perpendicular.y >= 0.0 {
                perpendicular
            } else {
                Point2::new(line.y, -line.x)
            };
            return (down, TrunkReference::ShoulderLine);
        }
    }
    (Point2::new(0.0, 1.0), TrunkReference::ScreenVertical)
}

/// Flexion at `middle`: 0° for a straight chain
fn flexion(
    pose: &JointPose,
    proximal: BodyJoint,
    middle: BodyJoint,
    distal: BodyJoint,
) -> Option<JointAngleReading> {
    let (a, b, c) = (
        point(pose, proximal)?,
        point(pose, middle)?,
        point(pose, distal)?,
    );
    let interior = b.to(a).angle_between_degrees(b.to(c))?;
    Some(JointAngleReading {
        degrees: 180.0 - interior,
        reference: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinemetric_core::models::Keypoint;

    fn pose() -> JointPose {
        JointPose::new(0.0)
            .with_joint(BodyJoint::RightShoulder, Keypoint::new(0.4, 0.3, 0.9))
            .with_joint(BodyJoint::LeftShoulder, Keypoint::new(0.6, 0.3, 0.9))
    }

    #[test]
    fn test_arm_straight_out_is_ninety_degrees_from_hip() {
        let pose = pose()
            .with_joint(BodyJoint::RightHip, Keypoint::new(0.4, 0.7, 0.9))
            .with_joint(BodyJoint::RightElbow, Keypoint::new(0.2, 0.3, 0.9));
        let reading = joint_angle(&pose, JointAngleKind::ShoulderElevation(Side::Right)).unwrap();
        assert!((reading.degrees - 90.0).abs() < 1e-9);
        assert_eq!(reading.reference, Some(TrunkReference::Hip));
    }

    #[test]
    fn test_fallback_chain_without_hip() {
        let overhead = pose().with_joint(BodyJoint::RightElbow, Keypoint::new(0.4, 0.1, 0.9));
        let reading =
            joint_angle(&overhead, JointAngleKind::ShoulderElevation(Side::Right)).unwrap();
        assert_eq!(reading.reference, Some(TrunkReference::ShoulderLine));
        assert!((reading.degrees - 180.0).abs() < 1e-9);

        let alone = JointPose::new(0.0)
            .with_joint(BodyJoint::RightShoulder, Keypoint::new(0.4, 0.3, 0.9))
            .with_joint(BodyJoint::RightWrist, Keypoint::new(0.4, 0.6, 0.9));
        let reading = joint_angle(&alone, JointAngleKind::ShoulderElevation(Side::Right)).unwrap();
        assert_eq!(reading.reference, Some(TrunkReference::ScreenVertical));
        assert!(reading.degrees.abs() < 1e-9);
    }

    #[test]
    fn test_elbow_flexion_needs_all_three_joints() {
        let bent = pose()
            .with_joint(BodyJoint::RightElbow, Keypoint::new(0.4, 0.5, 0.9))
            .with_joint(BodyJoint::RightWrist, Keypoint::new(0.6, 0.5, 0.9));
        let reading = joint_angle(&bent, JointAngleKind::ElbowFlexion(Side::Right)).unwrap();
        assert!((reading.degrees - 90.0).abs() < 1e-9);

        let low_confidence = pose()
            .with_joint(BodyJoint::RightElbow, Keypoint::new(0.4, 0.5, 0.9))
            .with_joint(BodyJoint::RightWrist, Keypoint::new(0.6, 0.5, 0.1));
        assert!(joint_angle(&low_confidence, JointAngleKind::ElbowFlexion(Side::Right)).is_none());
    }
}
