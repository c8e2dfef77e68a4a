// ABOUTME: Core types and constants for the kinemetric motion-analysis core
// ABOUTME: Foundation crate with error taxonomy, sensor data model, profiles, and configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Kinemetric Core
//!
//! Foundation crate providing shared types and constants for the kinemetric
//! rehabilitation motion-analysis core. This crate is designed to change
//! infrequently so the numeric engine in `kinemetric-analysis` recompiles alone.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and domain-specific errors
//! - **constants**: Physiological bounds, detector factors, and calibration constants
//! - **models**: Sensor samples, calibration profiles, detection profiles, rep events, metrics
//! - **config**: Environment-driven analysis configuration with validation

/// Unified error handling system with standard error codes
pub mod errors;

/// Analysis constants organized by domain
pub mod constants;

/// Core data model (samples, profiles, events, metrics)
pub mod models;

/// Analysis configuration (buffers, calibration, ROM, smoothness, session)
pub mod config;
