// ABOUTME: Spectral arc length (SPARC) smoothness from a speed profile, computed with rustfft
// ABOUTME: Separate device-motion and limb-motion pipelines over bounded per-segment speed series
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Smoothness analyzer
//!
//! SPARC is the negative arc length of the normalized magnitude spectrum of a
//! movement's speed profile, measured over an adaptive band. A single smooth
//! bell-shaped movement scores around -1.5; hesitations and corrective
//! submovements add spectral ripple and push the score further negative.

use crate::buffer::SampleBuffer;
use kinemetric_core::config::SmoothnessConfig;
use kinemetric_core::constants::detection::MAX_INTEGRATION_GAP_S;
use kinemetric_core::constants::physics::STANDARD_GRAVITY_MPS2;
use kinemetric_core::models::{
    BodyJoint, InertialSample, JointPose, Point2, PositionSample, Timestamped, Vec3,
};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use std::iter;
use tracing::debug;

/// Parameters of one SPARC computation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SparcParams {
    /// Fewest speed samples analyzed
    pub min_samples: usize,
    /// Zero-padding level beyond the next power of two
    pub pad_level: u32,
    /// Upper bound on the analyzed band (Hz)
    pub max_cutoff_hz: f64,
    /// Normalized magnitude below which the band is trimmed
    pub amplitude_threshold: f64,
    /// Fraction of spectral energy that sets the adaptive cutoff
    pub energy_fraction: f64,
    /// Speed samples kept per segment
    pub max_segment_samples: usize,
}

impl Default for SparcParams {
    fn default() -> Self {
        Self::from(&SmoothnessConfig::default())
    }
}

impl From<&SmoothnessConfig> for SparcParams {
    fn from(config: &SmoothnessConfig) -> Self {
        Self {
            min_samples: config.min_samples,
            pad_level: config.pad_level,
            max_cutoff_hz: config.max_cutoff_hz,
            amplitude_threshold: config.amplitude_threshold,
            energy_fraction: config.energy_fraction,
            max_segment_samples: config.max_segment_samples,
        }
    }
}

/// Spectral arc length of a uniformly sampled speed profile
///
/// Returns `None` when there are too few samples, the sample rate is not
/// positive, or the profile carries no motion.
#[must_use]
pub fn sparc(speed: &[f64], sample_rate_hz: f64, params: &SparcParams) -> Option<f64> {
    if speed.len() < params.min_samples.max(2) || sample_rate_hz <= 0.0 {
        debug!(
            samples = speed.len(),
            required = params.min_samples,
            "too few speed samples for SPARC"
        );
        return None;
    }

    let nfft = speed.len().next_power_of_two() << params.pad_level;
    let mut buffer: Vec<Complex<f64>> = speed
        .iter()
        .map(|&value| Complex::new(value, 0.0))
        .chain(iter::repeat(Complex::new(0.0, 0.0)))
        .take(nfft)
        .collect();
    FftPlanner::<f64>::new()
        .plan_fft_forward(nfft)
        .process(&mut buffer);

    let bin_hz = sample_rate_hz / nfft as f64;
    let band_bins = ((params.max_cutoff_hz / bin_hz).floor() as usize).min(nfft / 2);
    let magnitudes: Vec<f64> = buffer[..=band_bins].iter().map(|c| c.norm()).collect();
    let peak = magnitudes.iter().copied().fold(0.0_f64, f64::max);
    if peak <= f64::EPSILON {
        debug!("speed profile has no spectral energy");
        return None;
    }
    let normalized: Vec<f64> = magnitudes.iter().map(|m| m / peak).collect();

    let energy_end = energy_cutoff_bin(&normalized, params.energy_fraction);
    let end = normalized[..=energy_end]
        .iter()
        .rposition(|&m| m >= params.amplitude_threshold)
        .unwrap_or(0);
    if end == 0 {
        debug!("SPARC band collapsed to the DC bin");
        return None;
    }

    // Frequency axis normalized to the selected band
    let step = 1.0 / end as f64;
    let length: f64 = normalized[..=end]
        .windows(2)
        .map(|pair| step.hypot(pair[1] - pair[0]))
        .sum();
    Some(-length)
}

/// First bin at which cumulative spectral energy reaches `fraction`
fn energy_cutoff_bin(normalized: &[f64], fraction: f64) -> usize {
    let total: f64 = normalized.iter().map(|m| m * m).sum();
    let target = total * fraction.clamp(0.0, 1.0);
    let mut cumulative = 0.0;
    for (index, m) in normalized.iter().enumerate() {
        cumulative += m * m;
        if cumulative >= target {
            return index;
        }
    }
    normalized.len().saturating_sub(1)
}

/// One speed reading
#[derive(Debug, Clone, Copy, PartialEq)]
struct SpeedPoint {
    speed: f64,
    timestamp: f64,
}

impl Timestamped for SpeedPoint {
    fn timestamp(&self) -> f64 {
        self.timestamp
    }
}

/// Speed series of one movement segment, capped so a segment that never
/// closes keeps only its most recent stretch
#[derive(Debug, Clone)]
struct SpeedSeries {
    points: SampleBuffer<SpeedPoint>,
}

impl SpeedSeries {
    fn new(capacity: usize) -> Self {
        Self {
            points: SampleBuffer::new(capacity),
        }
    }

    fn push(&mut self, speed: f64, timestamp: f64) {
        self.points.push(SpeedPoint { speed, timestamp });
    }

    fn len(&self) -> usize {
        self.points.len()
    }

    fn sample_rate_hz(&self) -> Option<f64> {
        let first = self.points.iter().next()?.timestamp;
        let last = self.points.latest()?.timestamp;
        let span = last - first;
        (span > 0.0).then(|| (self.points.len() - 1) as f64 / span)
    }

    fn score(&self, params: &SparcParams) -> Option<f64> {
        let speeds: Vec<f64> = self.points.iter().map(|point| point.speed).collect();
        sparc(&speeds, self.sample_rate_hz()?, params)
    }

    fn clear(&mut self) {
        self.points.clear();
    }
}

/// Smoothness of the hand-held device's own motion
///
/// Speed comes either from leaky integration of gravity-compensated
/// acceleration, where the leak keeps integration drift from dominating the
/// spectrum, or from differentiating world-tracked positions. A session feeds
/// exactly one of the two inputs.
#[derive(Debug, Clone)]
pub struct DeviceMotionSmoothness {
    params: SparcParams,
    leak: f64,
    velocity: Vec3,
    last_timestamp: Option<f64>,
    last_position: Option<(Vec3, f64)>,
    series: SpeedSeries,
}

impl DeviceMotionSmoothness {
    /// Pipeline with the given SPARC parameters and per-sample velocity leak
    #[must_use]
    pub fn new(params: SparcParams, leak: f64) -> Self {
        Self {
            params,
            leak: leak.clamp(0.0, 1.0),
            velocity: Vec3::ZERO,
            last_timestamp: None,
            last_position: None,
            series: SpeedSeries::new(params.max_segment_samples),
        }
    }

    /// Pipeline configured from the smoothness section
    #[must_use]
    pub fn from_config(config: &SmoothnessConfig) -> Self {
        Self::new(SparcParams::from(config), config.velocity_leak)
    }

    /// Integrate one inertial sample
    pub fn push(&mut self, sample: &InertialSample) {
        let Some(previous) = self.last_timestamp.replace(sample.timestamp) else {
            return;
        };
        let dt = (sample.timestamp - previous).clamp(0.0, MAX_INTEGRATION_GAP_S);
        self.velocity =
            self.velocity * self.leak + sample.acceleration * (STANDARD_GRAVITY_MPS2 * dt);
        self.series.push(self.velocity.norm(), sample.timestamp);
    }

    /// Differentiate one world-tracked position
    pub fn push_position(&mut self, sample: &PositionSample) {
        if let Some((previous, previous_t)) = self.last_position {
            let dt = sample.timestamp - previous_t;
            if dt > 0.0 && dt <= MAX_INTEGRATION_GAP_S {
                self.series
                    .push(sample.position.distance(previous) / dt, sample.timestamp);
            }
        }
        self.last_position = Some((sample.position, sample.timestamp));
    }

    /// Speed samples collected in the current segment
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Whether the current segment is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.len() == 0
    }

    /// Score the current segment and start a new one
    pub fn finish_segment(&mut self) -> Option<f64> {
        let score = self.series.score(&self.params);
        self.series.clear();
        score
    }

    /// Forget all state
    pub fn reset(&mut self) {
        self.velocity = Vec3::ZERO;
        self.last_timestamp = None;
        self.last_position = None;
        self.series.clear();
    }
}

/// Smoothness of the observed limb, from one camera-tracked joint
#[derive(Debug, Clone)]
pub struct LimbMotionSmoothness {
    params: SparcParams,
    joint: BodyJoint,
    last_point: Option<(Point2, f64)>,
    series: SpeedSeries,
}

impl LimbMotionSmoothness {
    /// Pipeline following `joint`
    #[must_use]
    pub fn new(params: SparcParams, joint: BodyJoint) -> Self {
        Self {
            params,
            joint,
            last_point: None,
            series: SpeedSeries::new(params.max_segment_samples),
        }
    }

    /// Joint being followed
    #[must_use]
    pub const fn joint(&self) -> BodyJoint {
        self.joint
    }

    /// Differentiate one camera frame; frames without the joint are skipped
    pub fn push(&mut self, pose: &JointPose) {
        let Some(point) = pose.joint(self.joint).map(|kp| kp.point()) else {
            return;
        };
        if let Some((previous, previous_t)) = self.last_point {
            let dt = pose.timestamp - previous_t;
            if dt > 0.0 {
                self.series.push(point.distance(previous) / dt, pose.timestamp);
            }
        }
        self.last_point = Some((point, pose.timestamp));
    }

    /// Speed samples collected in the current segment
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Whether the current segment is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.len() == 0
    }

    /// Score the current segment and start a new one
    pub fn finish_segment(&mut self) -> Option<f64> {
        let score = self.series.score(&self.params);
        self.series.clear();
        score
    }

    /// Forget all state
    pub fn reset(&mut self) {
        self.last_point = None;
        self.series.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinemetric_core::models::{Keypoint, Quaternion};

    fn minimum_jerk(samples: usize) -> Vec<f64> {
        (0..samples)
            .map(|i| {
                let t = i as f64 / (samples - 1) as f64;
                30.0 * t.powi(2) * (1.0 - t).powi(2)
            })
            .collect()
    }

    #[test]
    fn test_short_or_static_profiles_have_no_score() {
        let params = SparcParams::default();
        assert!(sparc(&[1.0; 10], 60.0, &params).is_none());
        assert!(sparc(&[0.0; 64], 60.0, &params).is_none());
        assert!(sparc(&minimum_jerk(64), 0.0, &params).is_none());
    }

    #[test]
    fn test_smooth_profile_scores_near_reference() {
        let score = sparc(&minimum_jerk(60), 60.0, &SparcParams::default()).unwrap();
        assert!(score < -1.0 && score > -1.8, "{score}");
    }

    #[test]
    fn test_device_pipeline_integrates_acceleration() {
        let mut pipeline = DeviceMotionSmoothness::new(SparcParams::default(), 1.0);
        for i in 0..30 {
            pipeline.push(&InertialSample {
                acceleration: Vec3::new(0.1, 0.0, 0.0),
                angular_velocity: Vec3::ZERO,
                orientation: Quaternion::IDENTITY,
                timestamp: f64::from(i) / 30.0,
            });
        }
        assert_eq!(pipeline.len(), 29);
        assert!((pipeline.velocity.x - 0.1 * STANDARD_GRAVITY_MPS2 * 29.0 / 30.0).abs() < 1e-9);
        pipeline.reset();
        assert!(pipeline.is_empty());
    }

    #[test]
    fn test_limb_pipeline_skips_missing_joint() {
        let mut pipeline = LimbMotionSmoothness::new(SparcParams::default(), BodyJoint::RightWrist);
        pipeline.push(&JointPose::new(0.0).with_joint(BodyJoint::RightWrist, Keypoint::new(0.0, 0.0, 0.9)));
        pipeline.push(&JointPose::new(0.1));
        pipeline.push(&JointPose::new(0.2).with_joint(BodyJoint::RightWrist, Keypoint::new(0.2, 0.0, 0.9)));
        assert_eq!(pipeline.len(), 1);
        assert!((pipeline.series.points.latest().unwrap().speed - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_device_pipeline_differentiates_positions() {
        let mut pipeline = DeviceMotionSmoothness::new(SparcParams::default(), 1.0);
        for i in 0..11 {
            let t = f64::from(i) * 0.1;
            pipeline.push_position(&PositionSample {
                position: Vec3::new(0.5 * t, 0.0, 0.0),
                orientation: Quaternion::IDENTITY,
                timestamp: t,
            });
        }
        assert_eq!(pipeline.len(), 10);
        assert!((pipeline.series.points.latest().unwrap().speed - 0.5).abs() < 1e-9);
        assert!(pipeline.velocity.norm() < f64::EPSILON);
    }

    #[test]
    fn test_open_segment_keeps_bounded_history() {
        let params = SparcParams {
            max_segment_samples: 50,
            ..SparcParams::default()
        };
        let mut pipeline = DeviceMotionSmoothness::new(params, 0.99);
        for i in 0..500 {
            pipeline.push(&InertialSample {
                acceleration: Vec3::new(0.05, 0.0, 0.0),
                angular_velocity: Vec3::ZERO,
                orientation: Quaternion::IDENTITY,
                timestamp: f64::from(i) / 60.0,
            });
        }
        assert!(pipeline.len() <= 50);
        let first = pipeline.series.points.iter().next().unwrap().timestamp;
        assert!(first > 400.0 / 60.0, "oldest kept sample at {first}");
        assert!(pipeline.finish_segment().is_some());
        assert!(pipeline.is_empty());
    }
}
