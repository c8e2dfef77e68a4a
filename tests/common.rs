// ABOUTME: Shared test utilities and synthetic sensor signals for integration tests
// ABOUTME: Provides quiet logging setup plus fan, swing, spin, and shoulder-raise generators
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::too_many_lines
)]
//! Shared test utilities for `kinemetric`
//!
//! Signal generators produce the motion shapes the detectors are tuned for,
//! sampled at fixed rates with exact timestamps.

use kinemetric::models::{
    BodyJoint, InertialSample, JointPose, Keypoint, PoseFrame, Quaternion, SensorSample,
    TrackingQuality, Vec3,
};
use std::env;
use std::f64::consts::PI;
use std::sync::Once;
use tracing::Level;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        // TEST_LOG controls the level; default to WARN for quiet tests
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => Level::TRACE,
            Ok("DEBUG") => Level::DEBUG,
            Ok("INFO") => Level::INFO,
            _ => Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Inertial sample with only linear acceleration on the x axis
pub fn accel_x(timestamp: f64, x_g: f64) -> InertialSample {
    InertialSample {
        acceleration: Vec3::new(x_g, 0.0, 0.0),
        angular_velocity: Vec3::ZERO,
        orientation: Quaternion::IDENTITY,
        timestamp,
    }
}

/// Side-to-side fan at 60 Hz: `lobes` alternating half-sine acceleration
/// pulses of `amplitude_g`, 0.4 s long, one every second starting at 0.5 s
pub fn fan_signal(lobes: usize, amplitude_g: f64) -> Vec<InertialSample> {
    let total = 0.5 + lobes as f64 + 0.5;
    let count = (total * 60.0) as usize;
    (0..count)
        .map(|i| {
            let t = i as f64 / 60.0;
            let mut x = 0.0;
            for lobe in 0..lobes {
                let start = 0.5 + lobe as f64;
                if (start..start + 0.4).contains(&t) {
                    let sign = if lobe % 2 == 0 { 1.0 } else { -1.0 };
                    x = sign * amplitude_g * (PI * (t - start) / 0.4).sin();
                }
            }
            accel_x(t, x)
        })
        .collect()
}

/// Pendulum-style swing at 60 Hz on a circle of `radius_m` about the origin in
/// the x/y plane: `theta_deg` wide, one second per half swing at constant rate
pub fn swing_positions(theta_deg: f64, radius_m: f64, seconds: f64) -> Vec<(f64, Vec3)> {
    let theta = theta_deg.to_radians();
    let count = (seconds * 60.0) as usize;
    (0..=count)
        .map(|i| {
            let t = i as f64 / 60.0;
            let phase = t % 2.0;
            let fraction = if phase <= 1.0 { phase } else { 2.0 - phase };
            let angle = (-theta).mul_add(0.5, theta * fraction);
            (
                t,
                Vec3::new(radius_m * angle.sin(), -radius_m * angle.cos(), 0.0),
            )
        })
        .collect()
}

/// Swing as world-tracked pose frames with normal tracking
pub fn swing_frames(theta_deg: f64, radius_m: f64, seconds: f64) -> Vec<PoseFrame> {
    swing_positions(theta_deg, radius_m, seconds)
        .into_iter()
        .map(|(timestamp, position)| PoseFrame {
            position,
            orientation: Quaternion::IDENTITY,
            timestamp,
            tracking: TrackingQuality::Normal,
        })
        .collect()
}

/// Constant spin about the device z axis at 60 Hz
pub fn spin(seconds: f64, degrees_per_second: f64) -> Vec<InertialSample> {
    let rate = degrees_per_second.to_radians();
    let count = (seconds * 60.0) as usize;
    (0..count)
        .map(|i| InertialSample {
            acceleration: Vec3::ZERO,
            angular_velocity: Vec3::new(0.0, 0.0, rate),
            orientation: Quaternion::IDENTITY,
            timestamp: i as f64 / 60.0,
        })
        .collect()
}

/// Right-arm shoulder raise at 30 Hz: elevation 10° + 80°·sin²(πt/2), so a
/// rep peaks at 90° every two seconds
pub fn shoulder_raise(seconds: f64) -> Vec<JointPose> {
    let count = (seconds * 30.0) as usize;
    let shoulder = (0.4, 0.3);
    (0..=count)
        .map(|i| {
            let t = i as f64 / 30.0;
            let elevation = 80.0_f64
                .mul_add((PI * t / 2.0).sin().powi(2), 10.0)
                .to_radians();
            let (dx, dy) = (-elevation.sin(), elevation.cos());
            JointPose::new(t)
                .with_joint(BodyJoint::RightShoulder, Keypoint::new(shoulder.0, shoulder.1, 0.9))
                .with_joint(BodyJoint::RightHip, Keypoint::new(0.4, 0.7, 0.9))
                .with_joint(
                    BodyJoint::RightElbow,
                    Keypoint::new(0.15f64.mul_add(dx, shoulder.0), 0.15f64.mul_add(dy, shoulder.1), 0.9),
                )
                .with_joint(
                    BodyJoint::RightWrist,
                    Keypoint::new(0.3f64.mul_add(dx, shoulder.0), 0.3f64.mul_add(dy, shoulder.1), 0.9),
                )
        })
        .collect()
}

/// Planar arc of `degrees` on a circle of `radius_m`, starting straight down
pub fn arc(radius_m: f64, degrees: f64, steps: usize) -> Vec<Vec3> {
    (0..=steps)
        .map(|i| {
            let theta = (degrees * i as f64 / steps as f64).to_radians();
            Vec3::new(radius_m * theta.sin(), -radius_m * theta.cos(), 0.0)
        })
        .collect()
}

/// Wrap inertial samples for a session
pub fn inertial_samples(samples: &[InertialSample]) -> Vec<SensorSample> {
    samples.iter().copied().map(SensorSample::Inertial).collect()
}

/// Wrap pose frames for a session
pub fn pose_samples(frames: &[PoseFrame]) -> Vec<SensorSample> {
    frames.iter().copied().map(SensorSample::Pose).collect()
}

/// Wrap camera frames for a session
pub fn joint_samples(poses: &[JointPose]) -> Vec<SensorSample> {
    poses.iter().cloned().map(SensorSample::Joints).collect()
}
