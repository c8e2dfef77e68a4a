// ABOUTME: Integration tests for the rep detector family over synthetic sensor signals
// ABOUTME: Covers fan reversal counting, amplitude independence, debounce, rotation, and joint angles
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{fan_signal, init_test_logging, shoulder_raise, spin, swing_frames};
use kinemetric::analysis::detectors::{
    DirectionReversalConfig, DirectionReversalDetector, JointAngleThresholdDetector, ProfileDetector,
    RepDetector, RotationAccumulationDetector,
};
use kinemetric::models::{
    DetectionMethod, DetectionProfile, ExerciseId, PoseFrame, PositionSample, Side,
};

fn positions(theta_deg: f64, radius_m: f64, seconds: f64) -> Vec<PositionSample> {
    swing_frames(theta_deg, radius_m, seconds)
        .iter()
        .filter_map(PoseFrame::to_sample)
        .collect()
}

#[test]
fn test_fan_counts_one_rep_per_reversal() {
    init_test_logging();
    let profile = DetectionProfile::for_exercise(ExerciseId::SideToSideFan);
    let mut detector = ProfileDetector::from_profile(&profile);

    let marks: Vec<_> = fan_signal(4, 0.45)
        .iter()
        .filter_map(|sample| detector.process_inertial(sample))
        .collect();

    assert_eq!(marks.len(), 3);
    assert_eq!(detector.marks_emitted(), 3);
    for pair in marks.windows(2) {
        assert!(pair[1].timestamp > pair[0].timestamp);
        assert!(pair[1].timestamp - pair[0].timestamp >= profile.min_debounce_seconds);
    }
    for mark in &marks {
        assert_eq!(mark.method, DetectionMethod::AccelerationReversal);
        assert!(mark.peak >= 0.36, "peak {}", mark.peak);
        assert!(mark.measured_rom_degrees.is_none());
    }
}

#[test]
fn test_fan_below_threshold_never_counts() {
    let mut detector = ProfileDetector::from_profile(&DetectionProfile::for_exercise(
        ExerciseId::SideToSideFan,
    ));
    let marks = fan_signal(4, 0.25)
        .iter()
        .filter_map(|sample| detector.process_inertial(sample))
        .count();
    assert_eq!(marks, 0);
}

#[test]
fn test_direction_reversal_is_amplitude_independent() {
    init_test_logging();
    let profile = DetectionProfile::for_exercise(ExerciseId::PendulumSwing);
    // Two full cycles plus the start of a third: four reversals at any amplitude
    for theta in [10.0, 45.0, 90.0, 150.0] {
        let mut detector = DirectionReversalDetector::from_profile(&profile).unwrap();
        let marks = detector.process_batch(&positions(theta, 0.75, 4.5));
        assert_eq!(marks.len(), 4, "{theta}° swing");
        for (mark, reversal_at) in marks.iter().zip([1.0, 2.0, 3.0, 4.0]) {
            assert!(
                (mark.timestamp - reversal_at).abs() < 0.1,
                "{theta}° mark at {}",
                mark.timestamp
            );
            assert!(mark.boundary <= mark.timestamp);
        }
    }
}

#[test]
fn test_debounce_counts_from_last_accepted_mark() {
    let mut detector = DirectionReversalDetector::new(DirectionReversalConfig {
        min_speed_mps: 0.05,
        reversal_dot: -0.3,
        window: 6,
        min_debounce_s: 1.5,
        min_samples: 4,
    });
    let marks = detector.process_batch(&positions(60.0, 0.75, 4.5));

    // Reversals near 1, 2, 3, 4 s; the ones 1 s after an accepted mark are dropped
    assert_eq!(marks.len(), 2);
    assert!((marks[0].timestamp - 1.0).abs() < 0.1);
    assert!((marks[1].timestamp - 3.0).abs() < 0.1);
}

#[test]
fn test_detector_ignores_other_modalities() {
    let mut detector = ProfileDetector::from_profile(&DetectionProfile::for_exercise(
        ExerciseId::PendulumSwing,
    ));
    let marks = fan_signal(4, 0.45)
        .iter()
        .filter_map(|sample| detector.process_inertial(sample))
        .count();
    assert_eq!(marks, 0);
    assert_eq!(detector.method(), DetectionMethod::DirectionReversal);
}

#[test]
fn test_rotation_counts_full_turns_in_either_direction() {
    let profile = DetectionProfile::for_exercise(ExerciseId::ArmCircles);

    let mut forward = RotationAccumulationDetector::from_profile(&profile).unwrap();
    assert_eq!(forward.process_batch(&spin(2.0, 360.0)).len(), 2);

    let mut backward = RotationAccumulationDetector::from_profile(&profile).unwrap();
    let marks = backward.process_batch(&spin(2.0, -360.0));
    assert_eq!(marks.len(), 2);
    assert!(marks.iter().all(|mark| mark.peak >= 350.0));

    backward.reset();
    assert_eq!(backward.marks_emitted(), 0);
    assert!(backward.accumulated_degrees().abs() < f64::EPSILON);
}

#[test]
fn test_slow_rotation_does_not_complete_a_turn() {
    let profile = DetectionProfile::for_exercise(ExerciseId::ArmCircles);
    let mut detector = RotationAccumulationDetector::from_profile(&profile).unwrap();
    assert!(detector.process_batch(&spin(2.0, 90.0)).is_empty());
    assert!((detector.accumulated_degrees() - 178.5).abs() < 1.0);
}

#[test]
fn test_joint_angle_reps_measure_peak_over_disengage() {
    init_test_logging();
    let profile = DetectionProfile::for_exercise(ExerciseId::ShoulderRaise);
    let mut detector = JointAngleThresholdDetector::from_profile(&profile).unwrap();

    let marks = detector.process_batch(&shoulder_raise(6.0));

    assert_eq!(marks.len(), 3);
    for mark in &marks {
        let rom = mark.measured_rom_degrees.unwrap();
        assert!((rom - 65.0).abs() < 1.0, "rom {rom}");
        assert!((mark.peak - 90.0).abs() < 1.0);
    }
}

#[test]
fn test_joint_angle_other_side_sees_nothing() {
    let profile =
        DetectionProfile::for_exercise(ExerciseId::ShoulderRaise).with_side(Side::Left);
    let mut detector = JointAngleThresholdDetector::from_profile(&profile).unwrap();
    assert!(detector.process_batch(&shoulder_raise(6.0)).is_empty());
}
