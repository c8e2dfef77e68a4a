// ABOUTME: Unified error handling for the motion-analysis core with standard error codes
// ABOUTME: Defines ErrorCode, AppError, AppResult and re-exports domain-specific error enums
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling System
//!
//! Every failure the core can report maps to one `ErrorCode`. Most conditions
//! in the analysis pipeline are recovered locally (neutral results, default
//! calibration, clamping); the codes exist so collaborators and logs can name
//! what happened. No condition here is fatal to the process.

/// Calibration capture and persistence errors
pub mod calibration;
/// Session lifecycle errors
pub mod session;

pub use calibration::CalibrationError;
pub use session::SessionError;

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::io;
use thiserror::Error;

/// Standard error codes used throughout the motion-analysis core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    // Sample sufficiency (1000-1999)
    /// Fewer samples than the modality's minimum window
    #[serde(rename = "INSUFFICIENT_SAMPLES")]
    InsufficientSamples = 1000,

    // Calibration (2000-2999)
    /// Calibration missing, stale, or below the accuracy floor
    #[serde(rename = "CALIBRATION_INVALID")]
    CalibrationInvalid = 2000,
    /// Capture spread exceeded the hold-still bound
    #[serde(rename = "CALIBRATION_CAPTURE_REJECTED")]
    CalibrationCaptureRejected = 2001,
    /// Stored calibration format is not understood
    #[serde(rename = "CALIBRATION_FORMAT_INCOMPATIBLE")]
    CalibrationFormatIncompatible = 2002,

    // Tracking (3000-3999)
    /// World tracking quality is not normal
    #[serde(rename = "TRACKING_DEGRADED")]
    TrackingDegraded = 3000,
    /// Computed ROM fell outside the anatomical range and was clamped
    #[serde(rename = "ROM_OUT_OF_ANATOMICAL_RANGE")]
    RomOutOfAnatomicalRange = 3001,

    // Session lifecycle (4000-4999)
    /// Operation requires an active session
    #[serde(rename = "SESSION_NOT_STARTED")]
    SessionNotStarted = 4000,
    /// Session already ended; input rejected
    #[serde(rename = "SESSION_ENDED")]
    SessionEnded = 4001,

    // Validation (5000-5999)
    /// Input value is invalid
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 5000,

    // Configuration (6000-6999)
    /// Configuration is invalid
    #[serde(rename = "CONFIG_INVALID")]
    ConfigInvalid = 6000,

    // Internal (9000-9999)
    /// Internal failure
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    /// Persistence failed
    #[serde(rename = "STORAGE_ERROR")]
    StorageError = 9002,
    /// Serialization or deserialization failed
    #[serde(rename = "SERIALIZATION_ERROR")]
    SerializationError = 9003,
}

impl ErrorCode {
    /// Whether the condition is retryable by the user-facing collaborator
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::CalibrationCaptureRejected | Self::TrackingDegraded)
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::InsufficientSamples => "Not enough samples to analyze this movement",
            Self::CalibrationInvalid => "Calibration is missing, stale, or inaccurate",
            Self::CalibrationCaptureRejected => "Calibration capture moved too much; hold still",
            Self::CalibrationFormatIncompatible => "Stored calibration format is incompatible",
            Self::TrackingDegraded => "World tracking quality is degraded",
            Self::RomOutOfAnatomicalRange => "Range of motion outside the anatomical range",
            Self::SessionNotStarted => "No session is active",
            Self::SessionEnded => "The session has already ended",
            Self::InvalidInput => "The provided input is invalid",
            Self::ConfigInvalid => "Configuration is invalid",
            Self::InternalError => "An internal error occurred",
            Self::StorageError => "Storage operation failed",
            Self::SerializationError => "Data serialization/deserialization failed",
        }
    }
}

/// Unified error type for the motion-analysis core
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Invalid input
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Internal error
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Storage error
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(ErrorCode::SerializationError, error.to_string()).with_source(error)
    }
}

impl From<io::Error> for AppError {
    fn from(error: io::Error) -> Self {
        Self::storage(error.to_string()).with_source(error)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
