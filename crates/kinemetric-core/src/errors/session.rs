// ABOUTME: Session lifecycle error types for the session aggregator and shared handles
// ABOUTME: Covers hard-stop rejection after endSession and lock poisoning
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{AppError, ErrorCode};
use thiserror::Error;

/// Errors raised by session lifecycle operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// `feed` or `end_session` called before `start_session`
    #[error("no session has been started")]
    NotStarted,

    /// Sample pushed after `end_session`; it was rejected, not queued
    #[error("session {session_id} has ended; sample rejected")]
    SessionEnded {
        /// Session identifier
        session_id: String,
    },

    /// `end_session` called twice; metrics are produced exactly once
    #[error("session {session_id} already produced its metrics")]
    AlreadyEnded {
        /// Session identifier
        session_id: String,
    },

    /// A producer thread panicked while holding a session lock
    #[error("session lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

impl From<SessionError> for AppError {
    fn from(error: SessionError) -> Self {
        let code = match error {
            SessionError::NotStarted => ErrorCode::SessionNotStarted,
            SessionError::SessionEnded { .. } | SessionError::AlreadyEnded { .. } => {
                ErrorCode::SessionEnded
            }
            SessionError::LockPoisoned(_) => ErrorCode::InternalError,
        };
        Self::new(code, error.to_string()).with_source(error)
    }
}
