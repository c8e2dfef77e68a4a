// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Physiological bounds, detector factors, calibration limits, and SPARC parameters
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants module
//!
//! Constants are grouped by the component that owns them. Values that a
//! deployment may reasonably tune are also surfaced through `config`; the
//! ones here are the defaults.

/// Physical constants
pub mod physics {
    /// Standard gravity (m/s²), used to convert g-unit accelerations
    pub const STANDARD_GRAVITY_MPS2: f64 = 9.806_65;
}

/// Bounded sample buffer sizing
pub mod buffer {
    /// Default capacity: 90 s at 60 Hz fits with room to spare
    pub const DEFAULT_CAPACITY: usize = 8192;
    /// Fraction of capacity evicted in one batch when full
    pub const DEFAULT_EVICTION_FRACTION: f64 = 0.15;
    /// Smallest allowed eviction fraction
    pub const MIN_EVICTION_FRACTION: f64 = 0.10;
    /// Largest allowed eviction fraction
    pub const MAX_EVICTION_FRACTION: f64 = 0.20;
}

/// Calibration capture and validity
pub mod calibration {
    /// Samples captured per reference angle
    pub const SAMPLES_PER_REFERENCE: usize = 3;
    /// Maximum sample-to-centroid distance during a hold (meters)
    pub const MAX_CAPTURE_DEVIATION_M: f64 = 0.08;
    /// Distance from the wrist to the tracked point of a hand-held device (meters)
    pub const DEFAULT_GRIP_OFFSET_M: f64 = 0.15;
    /// Segment length used when no valid calibration exists (meters)
    pub const DEFAULT_SEGMENT_LENGTH_M: f64 = 0.60;
    /// Shortest physiologically plausible segment (meters)
    pub const MIN_SEGMENT_LENGTH_M: f64 = 0.25;
    /// Longest physiologically plausible segment (meters)
    pub const MAX_SEGMENT_LENGTH_M: f64 = 0.95;
    /// Profiles older than this are discarded on load
    pub const MAX_PROFILE_AGE_DAYS: i64 = 30;
    /// Profiles below this accuracy are discarded on load
    pub const MIN_ACCURACY: f64 = 0.70;
    /// Relative deviation of orientation separation that invalidates a capture
    pub const MAX_ORIENTATION_DEVIATION: f64 = 0.30;
    /// Persistence envelope version written by this build
    pub const STORE_FORMAT_VERSION: u32 = 1;
}

/// Rep detector factors shared by the detection methods
pub mod detection {
    /// Smoothed acceleration must exceed threshold × this to enter the peak state
    pub const PEAK_ENTRY_FACTOR: f64 = 1.8;
    /// Recorded peak must exceed threshold × this for the rep to count
    pub const PEAK_CONFIRM_FACTOR: f64 = 2.0;
    /// Dot product below which two velocity directions count as reversed (>110°)
    pub const DEFAULT_REVERSAL_DOT: f64 = -0.3;
    /// Dot product above which the reference direction follows the motion
    pub const DIRECTION_TRACKING_DOT: f64 = 0.7;
    /// Rotation target for one accumulated circle, just under a full turn
    pub const ROTATION_TARGET_DEGREES: f64 = 350.0;
    /// Longest gap integrated as-is; longer sensor gaps are capped (seconds)
    pub const MAX_INTEGRATION_GAP_S: f64 = 0.25;
    /// Joints below this confidence are treated as absent
    pub const MIN_JOINT_CONFIDENCE: f64 = 0.3;
}

/// Motion classifier thresholds
pub mod classifier {
    /// Samples considered per classification
    pub const WINDOW: usize = 8;
    /// Ratio below which motion is distal-joint dominated
    pub const DISTAL_RATIO_MAX: f64 = 0.5;
    /// Angular displacement below which no classification is made (radians)
    pub const MIN_ANGULAR_DISPLACEMENT_RAD: f64 = 0.05;
}

/// ROM engine
pub mod rom {
    /// Fewest positions that define an arc
    pub const MIN_ROM_SAMPLES: usize = 3;
    /// Positions in the live HUD window
    pub const LIVE_WINDOW: usize = 45;
    /// Minimum spacing between live estimates (seconds)
    pub const LIVE_MIN_INTERVAL_S: f64 = 0.1;
}

/// Spectral arc length smoothness
pub mod smoothness {
    /// Fewest velocity samples analyzed
    pub const MIN_SAMPLES: usize = 24;
    /// Zero-padding level (powers of two beyond the next power of two)
    pub const PAD_LEVEL: u32 = 4;
    /// Hard upper bound on the analyzed band (Hz)
    pub const MAX_CUTOFF_HZ: f64 = 10.0;
    /// Normalized magnitude below which the band is trimmed
    pub const AMPLITUDE_THRESHOLD: f64 = 0.05;
    /// Fraction of spectral energy that sets the adaptive cutoff
    pub const ENERGY_FRACTION: f64 = 0.99;
    /// Per-sample decay of the integrated inertial velocity
    pub const VELOCITY_LEAK: f64 = 0.98;
    /// Speed samples kept per movement segment before the oldest are evicted
    pub const MAX_SEGMENT_SAMPLES: usize = 4096;
}

/// Session aggregation
pub mod session {
    /// Consecutive non-normal pose frames before a tracking notice
    pub const TRACKING_NOTICE_FRAMES: u32 = 30;
    /// Completion rate for an excellent grade
    pub const GRADE_EXCELLENT: f64 = 0.9;
    /// Completion rate for a good grade
    pub const GRADE_GOOD: f64 = 0.75;
    /// Completion rate for a fair grade
    pub const GRADE_FAIR: f64 = 0.5;
}
