// ABOUTME: Accelerometer-reversal rep detector with exponential smoothing and a double-margin peak
// ABOUTME: A rep is a confirmed acceleration peak followed by a sign reversal past the valley level
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{Debounce, ProfileDetector, RepDetector};
use kinemetric_core::constants::detection::{PEAK_CONFIRM_FACTOR, PEAK_ENTRY_FACTOR};
use kinemetric_core::models::{DetectionMethod, DetectionProfile, InertialSample, ReferenceAxis, RepMark};
use tracing::{debug, trace};

/// Accelerometer-reversal parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccelerationReversalConfig {
    /// Trigger threshold (g)
    pub threshold_g: f64,
    /// Opposite-sign fraction of the threshold that closes a peak
    pub valley_fraction: f64,
    /// Device axis the acceleration is projected onto
    pub axis: ReferenceAxis,
    /// EMA weight of the newest sample
    pub smoothing_alpha: f64,
    /// Minimum time between marks (seconds)
    pub min_debounce_s: f64,
    /// Samples that must stay in the peak state
    pub min_samples: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PeakState {
    Idle,
    Active {
        sign: f64,
        peak: f64,
        samples: usize,
        entered_at: f64,
    },
}

/// Detects a confirmed acceleration peak followed by a sign reversal
#[derive(Debug, Clone)]
pub struct AccelerationReversalDetector {
    config: AccelerationReversalConfig,
    smoothed: Option<f64>,
    state: PeakState,
    debounce: Debounce,
    marks: u32,
}

impl AccelerationReversalDetector {
    /// Create a detector
    #[must_use]
    pub const fn new(config: AccelerationReversalConfig) -> Self {
        Self {
            config,
            smoothed: None,
            state: PeakState::Idle,
            debounce: Debounce::new(config.min_debounce_s),
            marks: 0,
        }
    }

    /// Create a detector from an acceleration-reversal profile
    #[must_use]
    pub fn from_profile(profile: &DetectionProfile) -> Option<Self> {
        match ProfileDetector::from_profile(profile) {
            ProfileDetector::AccelerationReversal(detector) => Some(detector),
            _ => None,
        }
    }

    /// Current smoothed projection (g)
    #[must_use]
    pub fn smoothed(&self) -> f64 {
        self.smoothed.unwrap_or(0.0)
    }

    fn smooth(&mut self, raw: f64) -> f64 {
        let alpha = self.config.smoothing_alpha.clamp(0.0, 1.0);
        let next = self
            .smoothed
            .map_or(raw, |prev| alpha.mul_add(raw - prev, prev));
        self.smoothed = Some(next);
        next
    }

    fn enter_if_strong(&mut self, value: f64, timestamp: f64) {
        if value.abs() > self.config.threshold_g * PEAK_ENTRY_FACTOR {
            self.state = PeakState::Active {
                sign: value.signum(),
                peak: value.abs(),
                samples: 1,
                entered_at: timestamp,
            };
        }
    }
}

impl RepDetector for AccelerationReversalDetector {
    type Sample = InertialSample;

    fn process(&mut self, sample: &InertialSample) -> Option<RepMark> {
        let raw = sample.acceleration.dot(self.config.axis.unit());
        let value = self.smooth(raw);
        let timestamp = sample.timestamp;

        match self.state {
            PeakState::Idle => {
                self.enter_if_strong(value, timestamp);
                None
            }
            PeakState::Active {
                sign,
                peak,
                samples,
                entered_at,
            } => {
                let valley = self.config.threshold_g * self.config.valley_fraction;
                if value * sign >= -valley {
                    if value * sign > 0.0 {
                        self.state = PeakState::Active {
                            sign,
                            peak: peak.max(value.abs()),
                            samples: samples + 1,
                            entered_at,
                        };
                    }
                    return None;
                }

                // Reversed past the valley: close this peak and look at the new direction
                self.state = PeakState::Idle;
                let confirmed = peak >= self.config.threshold_g * PEAK_CONFIRM_FACTOR;
                let sustained = samples >= self.config.min_samples;
                let spaced = self.debounce.ready(timestamp);
                self.enter_if_strong(value, timestamp);

                if !(confirmed && sustained && spaced) {
                    trace!(peak, samples, confirmed, sustained, spaced, "acceleration peak discarded");
                    return None;
                }

                self.debounce.accept(timestamp);
                self.marks += 1;
                debug!(peak_g = peak, entered_at, timestamp, "acceleration reversal rep");
                Some(RepMark {
                    timestamp,
                    boundary: timestamp,
                    method: DetectionMethod::AccelerationReversal,
                    measured_rom_degrees: None,
                    peak,
                })
            }
        }
    }

    fn method(&self) -> DetectionMethod {
        DetectionMethod::AccelerationReversal
    }

    fn reset(&mut self) {
        self.smoothed = None;
        self.state = PeakState::Idle;
        self.debounce.reset();
        self.marks = 0;
    }

    fn marks_emitted(&self) -> u32 {
        self.marks
    }
}
