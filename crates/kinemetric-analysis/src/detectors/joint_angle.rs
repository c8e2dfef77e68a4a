// ABOUTME: Joint-angle-threshold rep detector driven by camera body-pose keypoints
// ABOUTME: Engage/disengage hysteresis with peak tracking; ROM is peak minus the disengage angle
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{Debounce, ProfileDetector, RepDetector};
use crate::joint_angles::joint_angle;
use kinemetric_core::models::{DetectionMethod, DetectionProfile, JointAngleKind, JointPose, RepMark};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Joint-angle-threshold parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointAngleThresholdConfig {
    /// Tracked joint angle
    pub angle: JointAngleKind,
    /// Angle that starts peak tracking (degrees)
    pub engage_degrees: f64,
    /// Angle that closes the rep (degrees)
    pub disengage_degrees: f64,
    /// Minimum time between marks (seconds)
    pub min_debounce_s: f64,
    /// Frames required above the engage angle
    pub min_samples: usize,
}

/// Phase of the joint-angle state machine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum JointPhase {
    /// Below the engage angle
    WaitingToStart,
    /// Past the engage angle, tracking the peak
    Climbing {
        /// Largest angle seen this rep (degrees)
        peak: f64,
        /// Frames since engaging
        samples: usize,
        /// When the engage angle was crossed
        started_at: f64,
    },
}

/// Counts reps of a named joint angle with engage/disengage hysteresis
#[derive(Debug, Clone)]
pub struct JointAngleThresholdDetector {
    config: JointAngleThresholdConfig,
    phase: JointPhase,
    debounce: Debounce,
    marks: u32,
}

impl JointAngleThresholdDetector {
    /// Create a detector
    #[must_use]
    pub const fn new(config: JointAngleThresholdConfig) -> Self {
        Self {
            config,
            phase: JointPhase::WaitingToStart,
            debounce: Debounce::new(config.min_debounce_s),
            marks: 0,
        }
    }

    /// Create a detector from a joint-angle profile
    #[must_use]
    pub fn from_profile(profile: &DetectionProfile) -> Option<Self> {
        match ProfileDetector::from_profile(profile) {
            ProfileDetector::JointAngleThreshold(detector) => Some(detector),
            _ => None,
        }
    }

    /// Current phase
    #[must_use]
    pub const fn phase(&self) -> JointPhase {
        self.phase
    }

    /// Feed an already-measured angle
    pub fn process_angle(&mut self, degrees: f64, timestamp: f64) -> Option<RepMark> {
        match self.phase {
            JointPhase::WaitingToStart => {
                if degrees >= self.config.engage_degrees {
                    self.phase = JointPhase::Climbing {
                        peak: degrees,
                        samples: 1,
                        started_at: timestamp,
                    };
                }
                None
            }
            JointPhase::Climbing {
                peak,
                samples,
                started_at,
            } => {
                if degrees > self.config.disengage_degrees {
                    self.phase = JointPhase::Climbing {
                        peak: peak.max(degrees),
                        samples: samples + 1,
                        started_at,
                    };
                    return None;
                }

                self.phase = JointPhase::WaitingToStart;
                if samples < self.config.min_samples || !self.debounce.ready(timestamp) {
                    trace!(peak, samples, timestamp, "joint-angle rep discarded");
                    return None;
                }

                let rom = peak - self.config.disengage_degrees;
                self.debounce.accept(timestamp);
                self.marks += 1;
                debug!(
                    peak_degrees = peak,
                    rom_degrees = rom,
                    duration_s = timestamp - started_at,
                    "joint-angle rep"
                );
                Some(RepMark {
                    timestamp,
                    boundary: timestamp,
                    method: DetectionMethod::JointAngleThreshold,
                    measured_rom_degrees: Some(rom),
                    peak,
                })
            }
        }
    }
}

impl RepDetector for JointAngleThresholdDetector {
    type Sample = JointPose;

    fn process(&mut self, pose: &JointPose) -> Option<RepMark> {
        let Some(reading) = joint_angle(pose, self.config.angle) else {
            trace!(timestamp = pose.timestamp, "joint angle unavailable in frame");
            return None;
        };
        self.process_angle(reading.degrees, pose.timestamp)
    }

    fn method(&self) -> DetectionMethod {
        DetectionMethod::JointAngleThreshold
    }

    fn reset(&mut self) {
        self.phase = JointPhase::WaitingToStart;
        self.debounce.reset();
        self.marks = 0;
    }

    fn marks_emitted(&self) -> u32 {
        self.marks
    }
}
