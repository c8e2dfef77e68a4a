// ABOUTME: Integration tests for the three-reference calibration capture and triangulation
// ABOUTME: Validates segment length recovery, hold-still rejection, and accuracy scoring
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::Utc;
use common::init_test_logging;
use kinemetric::analysis::calibration::CalibrationCapture;
use kinemetric::config::CalibrationConfig;
use kinemetric::errors::CalibrationError;
use kinemetric::models::{PoseFrame, Quaternion, ReferenceAngle, TrackingQuality, Vec3};

const PIVOT: Vec3 = Vec3::new(0.0, 1.4, 0.0);
const RADIUS: f64 = 0.75;

fn reference_position(angle: ReferenceAngle) -> Vec3 {
    match angle {
        ReferenceAngle::Zero => PIVOT + Vec3::new(0.0, -RADIUS, 0.0),
        ReferenceAngle::Quarter => PIVOT + Vec3::new(0.0, 0.0, -RADIUS),
        ReferenceAngle::Half => PIVOT + Vec3::new(0.0, RADIUS, 0.0),
    }
}

fn reference_orientation(angle: ReferenceAngle) -> Quaternion {
    Quaternion::from_axis_angle(Vec3::new(1.0, 0.0, 0.0), angle.degrees().to_radians())
}

fn frame(position: Vec3, orientation: Quaternion, timestamp: f64) -> PoseFrame {
    PoseFrame {
        position,
        orientation,
        timestamp,
        tracking: TrackingQuality::Normal,
    }
}

/// Three frames within 2 cm of each other around the reference position
fn hold(angle: ReferenceAngle) -> Vec<PoseFrame> {
    let center = reference_position(angle);
    let q = reference_orientation(angle);
    [
        Vec3::new(0.01, 0.0, 0.0),
        Vec3::new(-0.01, 0.0, 0.0),
        Vec3::ZERO,
    ]
    .into_iter()
    .enumerate()
    .map(|(i, offset)| frame(center + offset, q, i as f64 * 0.1))
    .collect()
}

fn capture_all(capture: &mut CalibrationCapture) {
    for angle in ReferenceAngle::ALL {
        capture.record(angle, &hold(angle)).unwrap();
    }
}

#[test]
fn test_capture_recovers_segment_length_and_pivot() {
    init_test_logging();
    let config = CalibrationConfig::default();
    let mut capture = CalibrationCapture::new(&config);
    capture_all(&mut capture);
    assert!(capture.is_complete());

    let profile = capture.finish(Vec3::UP, Utc::now()).unwrap();

    assert!(
        (profile.segment_length_m - (RADIUS - config.grip_offset_m)).abs() < 0.01,
        "segment {}",
        profile.segment_length_m
    );
    assert!(profile.reference_joint.distance(PIVOT) < 0.01);
    assert!(profile.accuracy > 0.99);
    assert!(!profile.is_default);
}

#[test]
fn test_moving_during_hold_rejects_only_that_hold() {
    let mut capture = CalibrationCapture::new(&CalibrationConfig::default());
    capture
        .record(ReferenceAngle::Zero, &hold(ReferenceAngle::Zero))
        .unwrap();

    let mut shaky = hold(ReferenceAngle::Quarter);
    shaky[2].position += Vec3::new(0.0, 0.15, 0.0);
    let result = capture.record(ReferenceAngle::Quarter, &shaky);

    assert!(matches!(
        result,
        Err(CalibrationError::HighVariance {
            angle: ReferenceAngle::Quarter,
            ..
        })
    ));
    assert!(capture.reference(ReferenceAngle::Zero).is_some());
    assert!(capture.reference(ReferenceAngle::Quarter).is_none());

    // Re-prompting the single hold completes the capture
    capture
        .record(ReferenceAngle::Quarter, &hold(ReferenceAngle::Quarter))
        .unwrap();
    capture
        .record(ReferenceAngle::Half, &hold(ReferenceAngle::Half))
        .unwrap();
    assert!(capture.finish(Vec3::UP, Utc::now()).is_ok());
}

#[test]
fn test_frames_without_normal_tracking_are_not_counted() {
    let mut capture = CalibrationCapture::new(&CalibrationConfig::default());
    let mut frames = hold(ReferenceAngle::Zero);
    frames[0].tracking = TrackingQuality::Limited;

    let result = capture.record(ReferenceAngle::Zero, &frames);
    assert!(matches!(
        result,
        Err(CalibrationError::InsufficientSamples {
            required: 3,
            actual: 2,
            ..
        })
    ));
}

#[test]
fn test_finish_requires_every_reference() {
    let mut capture = CalibrationCapture::new(&CalibrationConfig::default());
    capture
        .record(ReferenceAngle::Zero, &hold(ReferenceAngle::Zero))
        .unwrap();
    assert!(matches!(
        capture.finish(Vec3::UP, Utc::now()),
        Err(CalibrationError::MissingReference(ReferenceAngle::Quarter))
    ));

    capture.reset();
    assert!(!capture.is_complete());
}

#[test]
fn test_orientations_contradicting_angles_are_inaccurate() {
    let mut capture = CalibrationCapture::new(&CalibrationConfig::default());
    for angle in ReferenceAngle::ALL {
        let still: Vec<PoseFrame> = hold(angle)
            .into_iter()
            .map(|f| PoseFrame {
                orientation: Quaternion::IDENTITY,
                ..f
            })
            .collect();
        capture.record(angle, &still).unwrap();
    }
    assert!(matches!(
        capture.finish(Vec3::UP, Utc::now()),
        Err(CalibrationError::Inaccurate { .. })
    ));
}

#[test]
fn test_holds_in_one_place_are_degenerate() {
    let mut capture = CalibrationCapture::new(&CalibrationConfig::default());
    for angle in ReferenceAngle::ALL {
        let q = Quaternion::from_axis_angle(Vec3::new(1.0, 0.0, 0.0), angle.degrees().to_radians());
        let frames: Vec<PoseFrame> = (0..3)
            .map(|i| frame(PIVOT, q, f64::from(i) * 0.1))
            .collect();
        capture.record(angle, &frames).unwrap();
    }
    assert!(matches!(
        capture.finish(Vec3::UP, Utc::now()),
        Err(CalibrationError::DegenerateGeometry(_))
    ));
}
