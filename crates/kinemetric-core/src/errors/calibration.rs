// ABOUTME: Calibration-specific error types for capture, triangulation, and persistence
// ABOUTME: Provides structured errors that convert into the unified AppError system
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{AppError, ErrorCode};
use crate::models::ReferenceAngle;
use std::io;
use thiserror::Error;

/// Errors raised by the calibration flow and the calibration store
#[derive(Debug, Error)]
pub enum CalibrationError {
    /// Fewer usable samples than required for a reference angle
    #[error("reference {angle} needs {required} samples with normal tracking, got {actual}")]
    InsufficientSamples {
        /// Reference angle being captured
        angle: ReferenceAngle,
        /// Samples required
        required: usize,
        /// Usable samples received
        actual: usize,
    },

    /// A sample strayed too far from the capture centroid
    #[error("reference {angle} rejected: sample deviated {deviation_m:.3} m from centroid (limit {limit_m:.3} m)")]
    HighVariance {
        /// Reference angle being captured
        angle: ReferenceAngle,
        /// Largest sample-to-centroid distance
        deviation_m: f64,
        /// Configured bound
        limit_m: f64,
    },

    /// `finish` called before every reference angle was captured
    #[error("reference {0} has not been captured")]
    MissingReference(ReferenceAngle),

    /// Captured references do not define an arc
    #[error("calibration geometry is degenerate: {0}")]
    DegenerateGeometry(&'static str),

    /// Orientation separation disagreed with the expected reference angles
    #[error("calibration accuracy {accuracy:.2} below acceptable level (worst deviation {worst_deviation:.0}%)")]
    Inaccurate {
        /// Accuracy score in [0, 1]
        accuracy: f64,
        /// Worst relative deviation, percent
        worst_deviation: f64,
    },

    /// Stored format version is not understood
    #[error("stored calibration format version {found} is incompatible (expected {expected})")]
    IncompatibleFormat {
        /// Version found on disk
        found: u32,
        /// Version this build writes
        expected: u32,
    },

    /// File access failed
    #[error("calibration storage failed: {0}")]
    Storage(#[from] io::Error),

    /// Encoding or decoding failed
    #[error("calibration serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CalibrationError {
    /// Capture rejections are retryable: the user is asked to hold still and try again
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::HighVariance { .. } | Self::InsufficientSamples { .. }
        )
    }

    /// The unified error code for this condition
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::HighVariance { .. } => ErrorCode::CalibrationCaptureRejected,
            Self::InsufficientSamples { .. } => ErrorCode::InsufficientSamples,
            Self::MissingReference(_) | Self::DegenerateGeometry(_) | Self::Inaccurate { .. } => {
                ErrorCode::CalibrationInvalid
            }
            Self::IncompatibleFormat { .. } => ErrorCode::CalibrationFormatIncompatible,
            Self::Storage(_) => ErrorCode::StorageError,
            Self::Serialization(_) => ErrorCode::SerializationError,
        }
    }
}

impl From<CalibrationError> for AppError {
    fn from(error: CalibrationError) -> Self {
        let code = error.code();
        Self::new(code, error.to_string()).with_source(error)
    }
}
