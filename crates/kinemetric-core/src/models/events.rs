// ABOUTME: Output contract of the motion-analysis core: rep marks, rep events, and session metrics
// ABOUTME: RepMark from detectors, RepEvent and SessionEvent for collaborators, final SessionMetrics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::profile::{DetectionMethod, ExerciseId};
use crate::constants::session::{GRADE_EXCELLENT, GRADE_FAIR, GRADE_GOOD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Timing mark emitted by a rep detector; the session turns it into a `RepEvent`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepMark {
    /// When the rep was recognized (seconds)
    pub timestamp: f64,
    /// Where the next rep's movement segment starts (seconds, ≤ `timestamp`)
    pub boundary: f64,
    /// Method that produced the mark
    pub method: DetectionMethod,
    /// ROM measured directly by the detector (joint-angle method only)
    pub measured_rom_degrees: Option<f64>,
    /// Peak magnitude in the method's unit (g, m/s, degrees)
    pub peak: f64,
}

/// One completed, accepted repetition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepEvent {
    /// 1-based sequence index within the session
    pub index: u32,
    /// Range of motion in degrees, clamped to the anatomical range
    pub rom_degrees: f64,
    /// Detection time (seconds)
    pub timestamp: f64,
    /// Detection method
    pub method: DetectionMethod,
}

/// Coarse quality grade from completion rate against the therapeutic minimum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityGrade {
    /// At least 90% of candidate reps met the therapeutic minimum
    Excellent,
    /// At least 75%
    Good,
    /// At least 50%
    Fair,
    /// Below 50%, or no candidate reps at all
    Poor,
}

impl QualityGrade {
    /// Grade accepted reps against every candidate rep
    #[must_use]
    pub fn from_counts(accepted: u32, rejected: u32) -> Self {
        let candidates = accepted + rejected;
        if candidates == 0 {
            return Self::Poor;
        }
        let rate = f64::from(accepted) / f64::from(candidates);
        if rate >= GRADE_EXCELLENT {
            Self::Excellent
        } else if rate >= GRADE_GOOD {
            Self::Good
        } else if rate >= GRADE_FAIR {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

/// Aggregated session output, produced exactly once per session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    /// Session identifier
    pub session_id: Uuid,
    /// Exercise performed
    pub exercise: ExerciseId,
    /// Accepted repetitions
    pub rep_count: u32,
    /// Candidate reps dropped for falling below the therapeutic minimum
    pub rejected_reps: u32,
    /// ROM per accepted rep (degrees)
    pub rom_values: Vec<f64>,
    /// Detection time per accepted rep (seconds)
    pub rep_timestamps: Vec<f64>,
    /// Mean ROM (0 when no reps)
    pub average_rom: f64,
    /// Largest ROM (0 when no reps)
    pub max_rom: f64,
    /// SPARC per rep where enough samples were available
    pub smoothness: Vec<f64>,
    /// Mean SPARC, if any was computed
    pub average_smoothness: Option<f64>,
    /// 0-100, from the coefficient of variation of ROM
    pub consistency_score: f64,
    /// Completion grade
    pub quality_grade: QualityGrade,
    /// Wall-clock session start
    pub started_at: DateTime<Utc>,
    /// Wall-clock session end
    pub ended_at: DateTime<Utc>,
    /// Sensor-time span between the first and last sample (seconds)
    pub duration_seconds: f64,
}

/// Consistency score (0-100) from ROM variability; one rep is perfectly consistent
#[must_use]
pub fn consistency_score(rom_values: &[f64]) -> f64 {
    match rom_values.len() {
        0 => 0.0,
        1 => 100.0,
        n => {
            let mean = rom_values.iter().sum::<f64>() / n as f64;
            if mean <= f64::EPSILON {
                return 0.0;
            }
            let variance =
                rom_values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
            let cv = variance.sqrt() / mean;
            (100.0 * (1.0 - cv)).clamp(0.0, 100.0)
        }
    }
}

/// Events published to the caller while a session runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Accepted repetition
    Rep(RepEvent),
    /// Best-effort HUD estimate over a short window; never used for reported ROM
    LiveRom {
        /// Estimated degrees
        degrees: f64,
        /// Sample time (seconds)
        timestamp: f64,
    },
    /// World tracking has been degraded for a sustained streak
    TrackingDegraded {
        /// Consecutive non-normal frames so far
        consecutive_frames: u32,
    },
    /// Final metrics
    Completed(Box<SessionMetrics>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_boundaries() {
        assert_eq!(QualityGrade::from_counts(0, 0), QualityGrade::Poor);
        assert_eq!(QualityGrade::from_counts(9, 1), QualityGrade::Excellent);
        assert_eq!(QualityGrade::from_counts(3, 1), QualityGrade::Good);
        assert_eq!(QualityGrade::from_counts(1, 1), QualityGrade::Fair);
        assert_eq!(QualityGrade::from_counts(1, 3), QualityGrade::Poor);
    }

    #[test]
    fn test_consistency_drops_with_spread() {
        assert!((consistency_score(&[60.0, 60.0, 60.0]) - 100.0).abs() < 1e-9);
        assert!(consistency_score(&[30.0, 90.0]) < consistency_score(&[55.0, 65.0]));
        assert!(consistency_score(&[]).abs() < f64::EPSILON);
    }
}
