// ABOUTME: Velocity-direction-reversal rep detector for world-tracked 3D device motion
// ABOUTME: Amplitude-independent: counts one rep per direction reversal of the windowed velocity
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{Debounce, ProfileDetector, RepDetector};
use kinemetric_core::constants::detection::DIRECTION_TRACKING_DOT;
use kinemetric_core::models::{DetectionMethod, DetectionProfile, PositionSample, RepMark, Vec3};
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Velocity-direction-reversal parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionReversalConfig {
    /// Window speeds below this are jitter (m/s)
    pub min_speed_mps: f64,
    /// Dot product below which directions count as reversed
    pub reversal_dot: f64,
    /// Positions in the sliding velocity window
    pub window: usize,
    /// Minimum time between marks (seconds)
    pub min_debounce_s: f64,
    /// Samples the previous direction must have been held
    pub min_samples: usize,
}

/// Counts reversals of the windowed velocity direction
///
/// The reference direction follows gradual turns along an arc and only a
/// sharp reversal counts, so a 15° swing and a 150° swing both give one rep
/// per direction change.
#[derive(Debug, Clone)]
pub struct DirectionReversalDetector {
    config: DirectionReversalConfig,
    window: VecDeque<PositionSample>,
    direction: Option<Vec3>,
    sustained: usize,
    peak_speed: f64,
    debounce: Debounce,
    marks: u32,
}

impl DirectionReversalDetector {
    /// Create a detector
    #[must_use]
    pub fn new(config: DirectionReversalConfig) -> Self {
        let window = config.window.max(2);
        Self {
            config: DirectionReversalConfig { window, ..config },
            window: VecDeque::with_capacity(window),
            direction: None,
            sustained: 0,
            peak_speed: 0.0,
            debounce: Debounce::new(config.min_debounce_s),
            marks: 0,
        }
    }

    /// Create a detector from a direction-reversal profile
    #[must_use]
    pub fn from_profile(profile: &DetectionProfile) -> Option<Self> {
        match ProfileDetector::from_profile(profile) {
            ProfileDetector::DirectionReversal(detector) => Some(detector),
            _ => None,
        }
    }

    /// Current reference direction, once motion has been seen
    #[must_use]
    pub const fn direction(&self) -> Option<Vec3> {
        self.direction
    }

    fn window_velocity(&self) -> Option<(Vec3, f64)> {
        let (oldest, newest) = (self.window.front()?, self.window.back()?);
        let span = newest.timestamp - oldest.timestamp;
        if self.window.len() < self.config.window || span <= 0.0 {
            return None;
        }
        let velocity = (newest.position - oldest.position) / span;
        Some((velocity, velocity.norm()))
    }
}

impl RepDetector for DirectionReversalDetector {
    type Sample = PositionSample;

    fn process(&mut self, sample: &PositionSample) -> Option<RepMark> {
        if self.window.len() == self.config.window {
            self.window.pop_front();
        }
        self.window.push_back(*sample);

        let (velocity, speed) = self.window_velocity()?;
        if speed < self.config.min_speed_mps {
            return None;
        }
        let current = velocity / speed;

        let Some(previous) = self.direction else {
            self.direction = Some(current);
            self.sustained = 1;
            self.peak_speed = speed;
            return None;
        };

        let alignment = previous.dot(current);
        if alignment >= DIRECTION_TRACKING_DOT {
            self.direction = Some(current);
            self.sustained += 1;
            self.peak_speed = self.peak_speed.max(speed);
            return None;
        }
        if alignment >= self.config.reversal_dot {
            // Turning but not reversed yet
            return None;
        }

        let held = self.sustained;
        let peak_speed = self.peak_speed;
        self.direction = Some(current);
        self.sustained = 1;
        self.peak_speed = speed;

        let timestamp = sample.timestamp;
        if held < self.config.min_samples || !self.debounce.ready(timestamp) {
            trace!(held, timestamp, "direction reversal discarded");
            return None;
        }

        self.debounce.accept(timestamp);
        self.marks += 1;
        let boundary = self.window.front().map_or(timestamp, |oldest| oldest.timestamp);
        debug!(alignment, peak_speed_mps = peak_speed, timestamp, "direction reversal rep");
        Some(RepMark {
            timestamp,
            boundary,
            method: DetectionMethod::DirectionReversal,
            measured_rom_degrees: None,
            peak: peak_speed,
        })
    }

    fn method(&self) -> DetectionMethod {
        DetectionMethod::DirectionReversal
    }

    fn reset(&mut self) {
        self.window.clear();
        self.direction = None;
        self.sustained = 0;
        self.peak_speed = 0.0;
        self.debounce.reset();
        self.marks = 0;
    }

    fn marks_emitted(&self) -> u32 {
        self.marks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinemetric_core::models::{ExerciseId, Quaternion};

    fn at(t: f64, x: f64) -> PositionSample {
        PositionSample {
            position: Vec3::new(x, 0.0, 0.0),
            orientation: Quaternion::IDENTITY,
            timestamp: t,
        }
    }

    #[test]
    fn test_stationary_jitter_is_ignored() {
        let mut detector = DirectionReversalDetector::from_profile(&DetectionProfile::for_exercise(
            ExerciseId::PendulumSwing,
        ))
        .unwrap();
        let samples: Vec<_> = (0..300)
            .map(|i| {
                let jitter = if i % 2 == 0 { 0.001 } else { -0.001 };
                at(f64::from(i) / 60.0, jitter)
            })
            .collect();
        assert!(detector.process_batch(&samples).is_empty());
        assert!(detector.direction().is_none());
    }

    #[test]
    fn test_debounce_suppresses_quick_double_reversal() {
        let mut detector = DirectionReversalDetector::new(DirectionReversalConfig {
            min_speed_mps: 0.05,
            reversal_dot: -0.3,
            window: 3,
            min_debounce_s: 1.0,
            min_samples: 2,
        });
        // Out for 0.5 s, back for 0.25 s, out again for 0.5 s at 0.5 m/s
        let mut x = 0.0;
        let mut samples = Vec::new();
        for i in 0..75 {
            let v = if (30..45).contains(&i) { -0.5 } else { 0.5 };
            x += v / 60.0;
            samples.push(at(f64::from(i) / 60.0, x));
        }
        assert_eq!(detector.process_batch(&samples).len(), 1);
    }
}
