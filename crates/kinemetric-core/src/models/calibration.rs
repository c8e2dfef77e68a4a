// ABOUTME: Learned body geometry for one user/device and the reference angles used to capture it
// ABOUTME: CalibrationProfile with validity checks, CalibrationKey, and ReferenceAngle
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::geometry::Vec3;
use crate::constants::calibration::{
    DEFAULT_SEGMENT_LENGTH_M, MAX_SEGMENT_LENGTH_M, MIN_SEGMENT_LENGTH_M,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference angles of the tracked segment held during capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReferenceAngle {
    /// Segment at rest (0°)
    Zero,
    /// Segment at a right angle (90°)
    Quarter,
    /// Segment fully raised (180°)
    Half,
}

impl ReferenceAngle {
    /// All reference angles in capture order
    pub const ALL: [Self; 3] = [Self::Zero, Self::Quarter, Self::Half];

    /// Angle in degrees
    #[must_use]
    pub const fn degrees(self) -> f64 {
        match self {
            Self::Zero => 0.0,
            Self::Quarter => 90.0,
            Self::Half => 180.0,
        }
    }
}

impl fmt::Display for ReferenceAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Key of a stored calibration: one profile per user and device
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalibrationKey {
    /// User identifier
    pub user_id: String,
    /// Device identifier
    pub device_id: String,
}

impl CalibrationKey {
    /// Create a key
    #[must_use]
    pub fn new(user_id: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            device_id: device_id.into(),
        }
    }
}

impl fmt::Display for CalibrationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.user_id, self.device_id)
    }
}

/// Learned body geometry for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationProfile {
    /// Anatomical segment length, pivot to wrist (meters)
    pub segment_length_m: f64,
    /// Triangulated pivot joint location in world coordinates
    pub reference_joint: Vec3,
    /// Accuracy score in [0, 1]
    pub accuracy: f64,
    /// When the capture finished
    pub captured_at: DateTime<Utc>,
    /// Substituted conservative profile rather than a real capture
    #[serde(default)]
    pub is_default: bool,
}

impl CalibrationProfile {
    /// Create a profile; segment length is clamped to the plausible range and accuracy to [0, 1]
    #[must_use]
    pub fn new(
        segment_length_m: f64,
        reference_joint: Vec3,
        accuracy: f64,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            segment_length_m: clamp_segment_length(segment_length_m),
            reference_joint,
            accuracy: accuracy.clamp(0.0, 1.0),
            captured_at,
            is_default: false,
        }
    }

    /// Conservative profile used whenever no valid calibration exists
    #[must_use]
    pub fn default_profile() -> Self {
        Self {
            segment_length_m: DEFAULT_SEGMENT_LENGTH_M,
            reference_joint: Vec3::ZERO,
            accuracy: 0.0,
            captured_at: DateTime::<Utc>::UNIX_EPOCH,
            is_default: true,
        }
    }

    /// Age of the capture at `now`
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.captured_at)
    }

    /// Why this profile should not be used, or `None` if it is usable
    #[must_use]
    pub fn invalid_reason(
        &self,
        now: DateTime<Utc>,
        max_age: Duration,
        min_accuracy: f64,
    ) -> Option<String> {
        if self.is_default {
            return Some("default profile".into());
        }
        if self.age(now) > max_age {
            return Some(format!(
                "captured {} days ago (limit {})",
                self.age(now).num_days(),
                max_age.num_days()
            ));
        }
        if self.accuracy < min_accuracy {
            return Some(format!(
                "accuracy {:.2} below {min_accuracy:.2}",
                self.accuracy
            ));
        }
        None
    }
}

/// Clamp a segment length into the physiologically plausible range
#[must_use]
pub fn clamp_segment_length(length_m: f64) -> f64 {
    if length_m.is_finite() {
        length_m.clamp(MIN_SEGMENT_LENGTH_M, MAX_SEGMENT_LENGTH_M)
    } else {
        DEFAULT_SEGMENT_LENGTH_M
    }
}
