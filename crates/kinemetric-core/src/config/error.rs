// ABOUTME: Configuration error type shared by every analysis configuration section
// ABOUTME: Range, parse, and environment failures raised while loading or validating config
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::errors::{AppError, ErrorCode};
use std::env::VarError;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Two related values are in the wrong order
    #[error("Invalid range: {0}")]
    InvalidRange(&'static str),

    /// Environment variable could not be read
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] VarError),

    /// Environment variable could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// A single value is outside its allowed bounds
    #[error("Value out of range: {0}")]
    ValueOutOfRange(&'static str),
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        Self::new(ErrorCode::ConfigInvalid, error.to_string()).with_source(error)
    }
}
