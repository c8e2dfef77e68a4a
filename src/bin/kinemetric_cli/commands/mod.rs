// ABOUTME: Re-exports command modules for kinemetric-cli
// ABOUTME: Provides replay, profile table, and calibration store commands
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub mod calibration;
pub mod profiles;
pub mod replay;
