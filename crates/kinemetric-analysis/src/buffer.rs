// ABOUTME: Bounded, append-only sample buffer with batch eviction of the oldest samples
// ABOUTME: Backs the per-session sample streams and the per-segment smoothness series
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use kinemetric_core::config::BufferConfig;
use kinemetric_core::constants::buffer::{
    DEFAULT_EVICTION_FRACTION, MAX_EVICTION_FRACTION, MIN_EVICTION_FRACTION,
};
use kinemetric_core::models::Timestamped;
use std::collections::VecDeque;
use tracing::debug;

/// Append-only buffer that drops the oldest samples in one batch when full
///
/// Capacity is sized so ordinary sessions never evict; eviction is a safety
/// bound for abnormally long sessions.
#[derive(Debug, Clone)]
pub struct SampleBuffer<T> {
    samples: VecDeque<T>,
    capacity: usize,
    eviction_batch: usize,
    evicted_total: u64,
}

impl<T> SampleBuffer<T> {
    /// Buffer with the default eviction fraction
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::with_eviction_fraction(capacity, DEFAULT_EVICTION_FRACTION)
    }

    /// Buffer evicting `ceil(capacity × fraction)` samples at once; the fraction
    /// is clamped to [0.10, 0.20] and capacity is at least 1
    #[must_use]
    pub fn with_eviction_fraction(capacity: usize, fraction: f64) -> Self {
        let capacity = capacity.max(1);
        let fraction = if fraction.is_finite() {
            fraction.clamp(MIN_EVICTION_FRACTION, MAX_EVICTION_FRACTION)
        } else {
            DEFAULT_EVICTION_FRACTION
        };
        let eviction_batch = ((capacity as f64 * fraction).ceil() as usize).clamp(1, capacity);
        Self {
            samples: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            eviction_batch,
            evicted_total: 0,
        }
    }

    /// Buffer sized from configuration
    #[must_use]
    pub fn from_config(config: &BufferConfig) -> Self {
        Self::with_eviction_fraction(config.capacity, config.eviction_fraction)
    }

    /// Append a sample; evicts the oldest batch first when at capacity
    pub fn push(&mut self, sample: T) {
        if self.samples.len() >= self.capacity {
            let drop_count = self.eviction_batch.min(self.samples.len());
            self.samples.drain(..drop_count);
            self.evicted_total += drop_count as u64;
            debug!(
                evicted = drop_count,
                capacity = self.capacity,
                "sample buffer full, evicted oldest batch"
            );
        }
        self.samples.push_back(sample);
    }

    /// Number of samples held
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the buffer is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum samples held before eviction
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples dropped by eviction since creation
    #[must_use]
    pub const fn evicted_total(&self) -> u64 {
        self.evicted_total
    }

    /// Newest sample
    #[must_use]
    pub fn latest(&self) -> Option<&T> {
        self.samples.back()
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.samples.iter()
    }

    /// Drop every sample; the eviction counter is kept
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl<T: Clone> SampleBuffer<T> {
    /// Owned copy of the current contents, oldest first
    #[must_use]
    pub fn snapshot(&self) -> Vec<T> {
        self.samples.iter().cloned().collect()
    }

    /// Owned copy of the newest `count` samples, oldest first
    #[must_use]
    pub fn tail(&self, count: usize) -> Vec<T> {
        let skip = self.samples.len().saturating_sub(count);
        self.samples.iter().skip(skip).cloned().collect()
    }
}

impl<T: Timestamped> SampleBuffer<T> {
    /// Keep only samples with a timestamp at or after `since`
    pub fn retain_since(&mut self, since: f64) {
        while self
            .samples
            .front()
            .is_some_and(|sample| sample.timestamp() < since)
        {
            self.samples.pop_front();
        }
    }

    /// Time covered by the held samples (seconds)
    #[must_use]
    pub fn span_seconds(&self) -> f64 {
        match (self.samples.front(), self.samples.back()) {
            (Some(first), Some(last)) => (last.timestamp() - first.timestamp()).max(0.0),
            _ => 0.0,
        }
    }
}

impl<T> Default for SampleBuffer<T> {
    fn default() -> Self {
        Self::from_config(&BufferConfig::default())
    }
}
