// ABOUTME: Integration tests for SPARC smoothness and the device and limb pipelines
// ABOUTME: Smooth bell profiles score near the reference; submovements score lower
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use kinemetric::analysis::smoothness::{
    sparc, DeviceMotionSmoothness, LimbMotionSmoothness, SparcParams,
};
use kinemetric::models::{BodyJoint, InertialSample, JointPose, Keypoint, Quaternion, Vec3};
use std::f64::consts::PI;

/// Minimum-jerk speed profile
fn minimum_jerk(samples: usize) -> Vec<f64> {
    (0..samples)
        .map(|i| {
            let t = i as f64 / (samples - 1) as f64;
            30.0 * t.powi(2) * (1.0 - t).powi(2)
        })
        .collect()
}

#[test]
fn test_single_smooth_movement_scores_near_reference() {
    let score = sparc(&minimum_jerk(60), 60.0, &SparcParams::default()).unwrap();
    assert!(score > -1.8 && score < -1.0, "{score}");
}

#[test]
fn test_submovements_lower_the_score() {
    let params = SparcParams::default();
    let smooth = sparc(&minimum_jerk(60), 60.0, &params).unwrap();

    let mut hesitant = minimum_jerk(60);
    hesitant.extend(minimum_jerk(60));
    let broken = sparc(&hesitant, 60.0, &params).unwrap();

    assert!(broken < smooth - 0.2, "smooth {smooth}, broken {broken}");
}

#[test]
fn test_too_few_samples_have_no_score() {
    let params = SparcParams {
        min_samples: 30,
        ..SparcParams::default()
    };
    assert!(sparc(&minimum_jerk(29), 60.0, &params).is_none());
    assert!(sparc(&minimum_jerk(30), 60.0, &params).is_some());
}

#[test]
fn test_device_pipeline_scores_one_push_pull() {
    let mut pipeline = DeviceMotionSmoothness::new(SparcParams::default(), 0.98);
    for i in 0..=60 {
        let t = f64::from(i) / 60.0;
        pipeline.push(&InertialSample {
            acceleration: Vec3::new(0.2 * (2.0 * PI * t).sin(), 0.0, 0.0),
            angular_velocity: Vec3::ZERO,
            orientation: Quaternion::IDENTITY,
            timestamp: t,
        });
    }
    assert_eq!(pipeline.len(), 60);

    let score = pipeline.finish_segment().unwrap();
    assert!(score < 0.0 && score > -2.5, "{score}");
    assert!(pipeline.is_empty());
    assert!(pipeline.finish_segment().is_none());
}

#[test]
fn test_limb_pipeline_follows_its_joint() {
    let mut pipeline = LimbMotionSmoothness::new(SparcParams::default(), BodyJoint::LeftWrist);
    assert_eq!(pipeline.joint(), BodyJoint::LeftWrist);

    // Minimum-jerk reach of 0.3 normalized units over two seconds at 30 Hz
    for i in 0..=60 {
        let tau = f64::from(i) / 60.0;
        let x = 0.3 * tau.powi(3) * 6.0_f64.mul_add(tau, -15.0).mul_add(tau, 10.0);
        pipeline.push(
            &JointPose::new(f64::from(i) / 30.0)
                .with_joint(BodyJoint::LeftWrist, Keypoint::new(x, 0.5, 0.9))
                .with_joint(BodyJoint::RightWrist, Keypoint::new(0.9 - x, 0.5, 0.9)),
        );
    }

    let score = pipeline.finish_segment().unwrap();
    assert!(score > -1.8 && score < -1.0, "{score}");

    pipeline.reset();
    pipeline.push(&JointPose::new(10.0).with_joint(BodyJoint::LeftWrist, Keypoint::new(0.0, 0.0, 0.9)));
    assert!(pipeline.is_empty());
}
