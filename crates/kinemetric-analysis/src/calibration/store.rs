// ABOUTME: Calibration store keyed by user and device with optional JSON file persistence
// ABOUTME: Validity checks on load substitute the conservative default profile and log why
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use kinemetric_core::config::CalibrationConfig;
use kinemetric_core::constants::calibration::STORE_FORMAT_VERSION;
use kinemetric_core::errors::CalibrationError;
use kinemetric_core::models::{CalibrationKey, CalibrationProfile};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// On-disk envelope; any other version is discarded on load
#[derive(Debug, Serialize, Deserialize)]
struct StoreEnvelope {
    format_version: u32,
    profiles: Vec<StoredCalibration>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredCalibration {
    key: CalibrationKey,
    profile: CalibrationProfile,
}

/// Thread-safe calibration store
///
/// Reads never fail: a missing, stale, or inaccurate profile yields the
/// default profile with a warning so a session can always start.
#[derive(Debug)]
pub struct CalibrationStore {
    profiles: DashMap<CalibrationKey, CalibrationProfile>,
    path: Option<PathBuf>,
    config: CalibrationConfig,
}

impl CalibrationStore {
    /// Store without persistence
    #[must_use]
    pub fn in_memory(config: CalibrationConfig) -> Self {
        Self {
            profiles: DashMap::new(),
            path: None,
            config,
        }
    }

    /// Store persisted to a JSON file, loading whatever is already there
    ///
    /// # Errors
    ///
    /// Returns a storage error if the file exists but cannot be read
    pub fn open(path: impl Into<PathBuf>, config: CalibrationConfig) -> Result<Self, CalibrationError> {
        let store = Self {
            profiles: DashMap::new(),
            path: Some(path.into()),
            config,
        };
        store.reload()?;
        Ok(store)
    }

    /// Backing file, if persisted
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Replace in-memory contents with the file's; returns the number loaded
    ///
    /// An unparsable file or an unknown format version is discarded with a
    /// warning, as is any stale or low-accuracy profile in it.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the file exists but cannot be read
    pub fn reload(&self) -> Result<usize, CalibrationError> {
        let Some(path) = &self.path else {
            return Ok(self.profiles.len());
        };
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no calibration file yet");
                self.profiles.clear();
                return Ok(0);
            }
            Err(e) => return Err(CalibrationError::Storage(e)),
        };

        self.profiles.clear();
        match decode_envelope(&raw) {
            Ok(entries) => {
                let now = Utc::now();
                for entry in entries {
                    if let Some(reason) = entry.profile.invalid_reason(
                        now,
                        self.config.max_profile_age(),
                        self.config.min_accuracy,
                    ) {
                        warn!(key = %entry.key, %reason, "discarding unusable calibration on load");
                        continue;
                    }
                    self.profiles.insert(entry.key, entry.profile);
                }
                info!(path = %path.display(), count = self.profiles.len(), "calibration store loaded");
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding unreadable calibration store");
            }
        }
        Ok(self.profiles.len())
    }

    /// Save a profile and persist the store
    ///
    /// # Errors
    ///
    /// Returns a storage or serialization error if persisting fails; the
    /// in-memory entry is kept either way
    pub fn save(&self, key: CalibrationKey, profile: CalibrationProfile) -> Result<(), CalibrationError> {
        info!(%key, segment_length_m = profile.segment_length_m, "calibration saved");
        self.profiles.insert(key, profile);
        self.persist()
    }

    /// Usable profile for `key` now
    #[must_use]
    pub fn profile_for(&self, key: &CalibrationKey) -> CalibrationProfile {
        self.profile_for_at(key, Utc::now())
    }

    /// Usable profile for `key` at `now`; falls back to the default profile
    #[must_use]
    pub fn profile_for_at(&self, key: &CalibrationKey, now: DateTime<Utc>) -> CalibrationProfile {
        let Some(stored) = self.snapshot(key) else {
            warn!(%key, "no calibration on record, using default profile");
            return CalibrationProfile::default_profile();
        };
        match stored.invalid_reason(now, self.config.max_profile_age(), self.config.min_accuracy) {
            Some(reason) => {
                warn!(%key, %reason, "calibration invalid, using default profile");
                CalibrationProfile::default_profile()
            }
            None => stored,
        }
    }

    /// Stored profile for `key` without validity checks
    #[must_use]
    pub fn snapshot(&self, key: &CalibrationKey) -> Option<CalibrationProfile> {
        self.profiles.get(key).map(|entry| entry.value().clone())
    }

    /// Remove a profile; returns whether one existed
    ///
    /// # Errors
    ///
    /// Returns a storage or serialization error if persisting fails
    pub fn invalidate(&self, key: &CalibrationKey) -> Result<bool, CalibrationError> {
        let removed = self.profiles.remove(key).is_some();
        if removed {
            info!(%key, "calibration invalidated");
            self.persist()?;
        }
        Ok(removed)
    }

    /// Remove every profile past the age limit; returns how many were removed
    ///
    /// # Errors
    ///
    /// Returns a storage or serialization error if persisting fails
    pub fn invalidate_stale(&self, now: DateTime<Utc>) -> Result<usize, CalibrationError> {
        let max_age = self.config.max_profile_age();
        let before = self.profiles.len();
        self.profiles.retain(|_, profile| profile.age(now) <= max_age);
        let removed = before - self.profiles.len();
        if removed > 0 {
            info!(removed, "stale calibrations invalidated");
            self.persist()?;
        }
        Ok(removed)
    }

    /// Number of stored profiles
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    fn persist(&self) -> Result<(), CalibrationError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let mut profiles: Vec<StoredCalibration> = self
            .profiles
            .iter()
            .map(|entry| StoredCalibration {
                key: entry.key().clone(),
                profile: entry.value().clone(),
            })
            .collect();
        profiles.sort_by(|a, b| {
            (&a.key.user_id, &a.key.device_id).cmp(&(&b.key.user_id, &b.key.device_id))
        });
        let envelope = StoreEnvelope {
            format_version: STORE_FORMAT_VERSION,
            profiles,
        };
        let json = serde_json::to_string_pretty(&envelope)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, json)?;
        fs::rename(&staging, path)?;
        debug!(path = %path.display(), "calibration store written");
        Ok(())
    }
}

fn decode_envelope(raw: &str) -> Result<Vec<StoredCalibration>, CalibrationError> {
    let envelope: StoreEnvelope = serde_json::from_str(raw)?;
    if envelope.format_version != STORE_FORMAT_VERSION {
        return Err(CalibrationError::IncompatibleFormat {
            found: envelope.format_version,
            expected: STORE_FORMAT_VERSION,
        });
    }
    Ok(envelope.profiles)
}
