// ABOUTME: JSON-lines sensor recordings: one tagged SensorSample object per line
// ABOUTME: Reading skips malformed lines with a warning and counts them; writing appends lines
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Sensor recording format
//!
//! ```text
//! {"kind":"inertial","acceleration":{"x":0.2,"y":0.0,"z":0.0},"angular_velocity":{"x":0.0,"y":0.0,"z":1.5},"timestamp":0.016}
//! {"kind":"pose","position":{"x":0.1,"y":-0.7,"z":0.0},"orientation":{"w":1.0,"x":0.0,"y":0.0,"z":0.0},"timestamp":0.02,"tracking":"normal"}
//! ```

use kinemetric_core::errors::AppResult;
use kinemetric_core::models::SensorSample;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Samples read from one recording
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recording {
    /// Samples in file order
    pub samples: Vec<SensorSample>,
    /// Lines that did not parse as a sample
    pub skipped_lines: usize,
}

impl Recording {
    /// Number of samples
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no sample was read
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Read a recording from any buffered reader
///
/// Blank lines are ignored; malformed lines are skipped and counted.
///
/// # Errors
///
/// Returns an error only when the underlying reader fails
pub fn read_recording<R: BufRead>(reader: R) -> AppResult<Recording> {
    let mut recording = Recording::default();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<SensorSample>(trimmed) {
            Ok(sample) => recording.samples.push(sample),
            Err(error) => {
                recording.skipped_lines += 1;
                warn!(line = index + 1, %error, "skipping malformed recording line");
            }
        }
    }
    debug!(
        samples = recording.samples.len(),
        skipped = recording.skipped_lines,
        "recording read"
    );
    Ok(recording)
}

/// Read a recording file
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read
pub fn load_recording(path: &Path) -> AppResult<Recording> {
    let file = File::open(path)?;
    read_recording(BufReader::new(file))
}

/// Appends samples as JSON lines
#[derive(Debug)]
pub struct RecordingWriter<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> RecordingWriter<W> {
    /// Wrap a writer
    pub const fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Append one sample
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails
    pub fn write_sample(&mut self, sample: &SensorSample) -> AppResult<()> {
        serde_json::to_writer(&mut self.writer, sample)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Samples written so far
    pub const fn written(&self) -> usize {
        self.written
    }

    /// Flush and return the inner writer
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails
    pub fn finish(mut self) -> AppResult<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Write a whole recording file
///
/// # Errors
///
/// Returns an error if the file cannot be created or written
pub fn save_recording(path: &Path, samples: &[SensorSample]) -> AppResult<()> {
    let mut writer = RecordingWriter::new(BufWriter::new(File::create(path)?));
    for sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finish()?;
    Ok(())
}
