// ABOUTME: Profile table command for kinemetric-cli
// ABOUTME: Lists every exercise with its modality, method, and detection thresholds
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use kinemetric::models::{DetectionProfile, ExerciseId};

/// Print the detection profile table
pub fn print_table() {
    println!(
        "{:<18} {:<11} {:<22} {:>9} {:>9} {:>8} {:>10} {:>12}",
        "EXERCISE", "MODALITY", "METHOD", "TRIGGER", "DEBOUNCE", "SAMPLES", "MIN ROM", "RANGE"
    );
    println!("{}", "-".repeat(108));
    for exercise in ExerciseId::ALL {
        let profile = DetectionProfile::for_exercise(exercise);
        let modality = format!("{:?}", profile.modality);
        let method = format!("{:?}", profile.method());
        let range = format!(
            "{:.0}-{:.0}",
            profile.anatomical_range.min, profile.anatomical_range.max
        );
        println!(
            "{:<18} {:<11} {:<22} {:>9.2} {:>8.2}s {:>8} {:>9.0}° {:>11}°",
            exercise.as_str(),
            modality,
            method,
            profile.trigger_threshold(),
            profile.min_debounce_seconds,
            profile.min_samples,
            profile.therapeutic_min_degrees,
            range,
        );
    }
}
