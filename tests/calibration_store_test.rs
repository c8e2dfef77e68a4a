// ABOUTME: Integration tests for the persisted calibration store
// ABOUTME: Covers file round trips, validity fallback and filtering on load, invalidation, unreadable files
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::{Duration, Utc};
use common::init_test_logging;
use kinemetric::analysis::calibration::CalibrationStore;
use kinemetric::config::CalibrationConfig;
use kinemetric::models::{CalibrationKey, CalibrationProfile, Vec3};
use std::fs;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn profile(days_old: i64, accuracy: f64) -> CalibrationProfile {
    CalibrationProfile::new(
        0.62,
        Vec3::new(0.0, 1.4, 0.1),
        accuracy,
        Utc::now() - Duration::days(days_old),
    )
}

#[test]
fn test_saved_profile_survives_reopen() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("calibration.json");
    let key = CalibrationKey::new("user-1", "phone-a");
    let saved = profile(1, 0.95);

    let store = CalibrationStore::open(&path, CalibrationConfig::default()).unwrap();
    assert!(store.is_empty());
    store.save(key.clone(), saved.clone()).unwrap();
    assert!(path.exists());

    let reopened = CalibrationStore::open(&path, CalibrationConfig::default()).unwrap();
    assert_eq!(reopened.len(), 1);
    assert_eq!(reopened.snapshot(&key), Some(saved.clone()));
    assert_eq!(reopened.profile_for(&key), saved);
}

#[test]
fn test_unusable_profiles_fall_back_to_default() {
    let store = CalibrationStore::in_memory(CalibrationConfig::default());
    let stale = CalibrationKey::new("user-1", "old-phone");
    let sloppy = CalibrationKey::new("user-1", "shaky-phone");
    store.save(stale.clone(), profile(40, 0.95)).unwrap();
    store.save(sloppy.clone(), profile(1, 0.4)).unwrap();

    assert!(store.profile_for(&stale).is_default);
    assert!(store.profile_for(&sloppy).is_default);
    assert!(store.profile_for(&CalibrationKey::new("nobody", "none")).is_default);

    // Raw snapshots are still available for inspection
    assert!(!store.snapshot(&stale).unwrap().is_default);
}

#[test]
fn test_reopen_drops_unusable_profiles() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("calibration.json");
    let fresh = CalibrationKey::new("user-1", "phone-a");
    let stale = CalibrationKey::new("user-1", "old-phone");
    let sloppy = CalibrationKey::new("user-1", "shaky-phone");

    let store = CalibrationStore::open(&path, CalibrationConfig::default()).unwrap();
    store.save(fresh.clone(), profile(1, 0.95)).unwrap();
    store.save(stale.clone(), profile(40, 0.95)).unwrap();
    store.save(sloppy.clone(), profile(1, 0.4)).unwrap();
    assert_eq!(store.len(), 3);

    let reopened = CalibrationStore::open(&path, CalibrationConfig::default()).unwrap();
    assert_eq!(reopened.len(), 1);
    assert!(reopened.snapshot(&fresh).is_some());
    assert!(reopened.snapshot(&stale).is_none());
    assert!(reopened.snapshot(&sloppy).is_none());
}

#[test]
fn test_invalidate_persists_removal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("calibration.json");
    let key = CalibrationKey::new("user-2", "tablet");

    let store = CalibrationStore::open(&path, CalibrationConfig::default()).unwrap();
    store.save(key.clone(), profile(0, 0.9)).unwrap();
    assert!(store.invalidate(&key).unwrap());
    assert!(!store.invalidate(&key).unwrap());

    let reopened = CalibrationStore::open(&path, CalibrationConfig::default()).unwrap();
    assert!(reopened.snapshot(&key).is_none());
}

#[test]
fn test_invalidate_stale_removes_only_old_profiles() {
    let store = CalibrationStore::in_memory(CalibrationConfig::default());
    store
        .save(CalibrationKey::new("a", "1"), profile(2, 0.9))
        .unwrap();
    store
        .save(CalibrationKey::new("b", "1"), profile(45, 0.9))
        .unwrap();

    assert_eq!(store.invalidate_stale(Utc::now()).unwrap(), 1);
    assert_eq!(store.len(), 1);
    assert!(store.snapshot(&CalibrationKey::new("a", "1")).is_some());
}

#[test]
fn test_unreadable_files_are_discarded() {
    let dir = TempDir::new().unwrap();

    let garbage = dir.path().join("garbage.json");
    fs::write(&garbage, "definitely not json").unwrap();
    let store = CalibrationStore::open(&garbage, CalibrationConfig::default()).unwrap();
    assert!(store.is_empty());

    let future = dir.path().join("future.json");
    fs::write(&future, r#"{"format_version": 99, "profiles": []}"#).unwrap();
    let store = CalibrationStore::open(&future, CalibrationConfig::default()).unwrap();
    assert!(store.is_empty());
}

#[test]
fn test_readers_tolerate_concurrent_invalidation() {
    let store = Arc::new(CalibrationStore::in_memory(CalibrationConfig::default()));
    let key = CalibrationKey::new("user-3", "watch");
    store.save(key.clone(), profile(0, 0.9)).unwrap();

    thread::scope(|scope| {
        for _ in 0..4 {
            let store = Arc::clone(&store);
            let key = key.clone();
            scope.spawn(move || {
                for _ in 0..200 {
                    let used = store.profile_for(&key);
                    assert!(used.segment_length_m > 0.0);
                }
            });
        }
        scope.spawn(|| {
            for _ in 0..50 {
                store.invalidate(&key).unwrap();
                store.save(key.clone(), profile(0, 0.9)).unwrap();
            }
        });
    });

    assert_eq!(store.len(), 1);
}
