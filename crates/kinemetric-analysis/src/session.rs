// ABOUTME: Session aggregator routing samples by modality into detectors, ROM engine, and smoothness
// ABOUTME: Publishes rep, live ROM, and tracking events over tokio channels; finalizes SessionMetrics once
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Session aggregator
//!
//! One aggregator is the single analysis context of a session: every sample
//! passes through [`SessionAggregator::feed`] in order, so rep events carry a
//! monotonically increasing index. Positions and inertial samples are
//! segmented per repetition; each detected rep closes the current segment,
//! measures it, and starts the next one at the detector's boundary.
//!
//! ROM comes from the first available source: the detector's own measurement
//! (joint angles), the chord estimate fused with the gyro sweep, the gyro
//! sweep alone, or a neutral zero when the segment carried nothing to measure.
//! Measured ROM below the therapeutic minimum drops the rep.

use crate::buffer::SampleBuffer;
use crate::classifier::{angular_displacement, MotionClassification, MotionClassifier};
use crate::detectors::ProfileDetector;
use crate::rom::{LiveRomEstimator, RomEngine};
use crate::smoothness::{DeviceMotionSmoothness, LimbMotionSmoothness, SparcParams};
use chrono::{DateTime, Utc};
use kinemetric_core::config::AnalysisConfig;
use kinemetric_core::constants::classifier::MIN_ANGULAR_DISPLACEMENT_RAD;
use kinemetric_core::errors::SessionError;
use kinemetric_core::models::{
    consistency_score, CalibrationProfile, DetectionProfile, DetectorTuning, InertialSample,
    JointPose, PoseFrame, PositionSample, QualityGrade, RepEvent, RepMark, SensorModality,
    SensorSample, SessionEvent, SessionMetrics, Timestamped, Vec3,
};
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Last accepted timestamp per modality
#[derive(Debug, Clone, Copy, Default)]
struct ModalityClock {
    inertial: Option<f64>,
    pose: Option<f64>,
    joints: Option<f64>,
}

impl ModalityClock {
    /// Accept `timestamp` if it advances its modality's clock
    fn advance(&mut self, sample: &SensorSample) -> bool {
        let timestamp = sample.timestamp();
        let slot = match sample {
            SensorSample::Inertial(_) => &mut self.inertial,
            SensorSample::Pose(_) => &mut self.pose,
            SensorSample::Joints(_) => &mut self.joints,
        };
        if !timestamp.is_finite() || slot.is_some_and(|last| timestamp <= last) {
            return false;
        }
        *slot = Some(timestamp);
        true
    }
}

/// Smoothness pipeline matching the session's modality; each variant is fed
/// by exactly one sample kind
#[derive(Debug, Clone)]
enum SmoothnessPipeline {
    Inertial(DeviceMotionSmoothness),
    WorldPose(DeviceMotionSmoothness),
    Limb(LimbMotionSmoothness),
}

impl SmoothnessPipeline {
    fn for_profile(profile: &DetectionProfile, config: &AnalysisConfig) -> Self {
        match (profile.tuning, profile.modality) {
            (DetectorTuning::JointAngleThreshold { angle, .. }, _) => Self::Limb(
                LimbMotionSmoothness::new(SparcParams::from(&config.smoothness), angle.distal_joint()),
            ),
            (_, SensorModality::WorldPose) => {
                Self::WorldPose(DeviceMotionSmoothness::from_config(&config.smoothness))
            }
            _ => Self::Inertial(DeviceMotionSmoothness::from_config(&config.smoothness)),
        }
    }

    fn finish_segment(&mut self) -> Option<f64> {
        match self {
            Self::Inertial(pipeline) | Self::WorldPose(pipeline) => pipeline.finish_segment(),
            Self::Limb(pipeline) => pipeline.finish_segment(),
        }
    }
}

/// Where a rep's ROM came from
#[derive(Debug, Clone, Copy, PartialEq)]
enum RomSource {
    Measured(f64),
    Unavailable,
}

/// State of the running session
#[derive(Debug)]
struct ActiveSession {
    id: Uuid,
    profile: DetectionProfile,
    started_at: DateTime<Utc>,
    detector: ProfileDetector,
    engine: RomEngine,
    classifier: MotionClassifier,
    live_rom: Option<LiveRomEstimator>,
    smoothness: SmoothnessPipeline,
    inertial: SampleBuffer<InertialSample>,
    positions: SampleBuffer<PositionSample>,
    joints: SampleBuffer<JointPose>,
    clock: ModalityClock,
    segment_start: Option<f64>,
    first_timestamp: Option<f64>,
    last_timestamp: Option<f64>,
    degraded_streak: u32,
    rom_values: Vec<f64>,
    rep_timestamps: Vec<f64>,
    smoothness_scores: Vec<f64>,
    rejected_reps: u32,
}

impl ActiveSession {
    fn new(profile: DetectionProfile, calibration: &CalibrationProfile, config: &AnalysisConfig) -> Self {
        let engine = RomEngine::from_calibration(calibration, &config.rom, profile.anatomical_range);
        let live_rom = (config.session.live_rom_enabled
            && profile.modality == SensorModality::WorldPose)
            .then(|| LiveRomEstimator::from_config(engine, &config.rom));
        Self {
            id: Uuid::new_v4(),
            profile,
            started_at: Utc::now(),
            detector: ProfileDetector::from_profile(&profile),
            engine,
            classifier: MotionClassifier::new(engine.tracked_radius_m()),
            live_rom,
            smoothness: SmoothnessPipeline::for_profile(&profile, config),
            inertial: SampleBuffer::from_config(&config.buffer),
            positions: SampleBuffer::from_config(&config.buffer),
            joints: SampleBuffer::from_config(&config.buffer),
            clock: ModalityClock::default(),
            segment_start: None,
            first_timestamp: None,
            last_timestamp: None,
            degraded_streak: 0,
            rom_values: Vec::new(),
            rep_timestamps: Vec::new(),
            smoothness_scores: Vec::new(),
            rejected_reps: 0,
        }
    }

    fn in_segment(&self, timestamp: f64, end: f64) -> bool {
        self.segment_start.is_none_or(|start| timestamp >= start) && timestamp <= end
    }

    /// ROM of the segment closed by `mark`
    fn segment_rom(&self, mark: &RepMark) -> RomSource {
        let range = self.profile.anatomical_range;
        if let Some(measured) = mark.measured_rom_degrees {
            let clamped = range.clamp(measured);
            if (clamped - measured).abs() > f64::EPSILON {
                warn!(
                    computed_degrees = measured,
                    min = range.min,
                    max = range.max,
                    "ROM outside anatomical range, clamped"
                );
            }
            return RomSource::Measured(clamped);
        }

        let positions: Vec<PositionSample> = self
            .positions
            .iter()
            .filter(|s| self.in_segment(s.timestamp, mark.timestamp))
            .copied()
            .collect();
        let inertial: Vec<InertialSample> = self
            .inertial
            .iter()
            .filter(|s| self.in_segment(s.timestamp, mark.timestamp))
            .copied()
            .collect();

        let points: Vec<Vec3> = positions.iter().map(|s| s.position).collect();
        let estimate = self.engine.estimate(&points);
        let swept_rad = angular_displacement(&inertial);
        let swept = (swept_rad >= MIN_ANGULAR_DISPLACEMENT_RAD).then(|| swept_rad.to_degrees());

        if !estimate.is_measured() && swept.is_none() {
            debug!(
                positions = positions.len(),
                inertial = inertial.len(),
                "insufficient samples for ROM, neutral result"
            );
            return RomSource::Unavailable;
        }
        let classification = if estimate.is_measured() && swept.is_some() {
            self.classifier.classify(&positions, &inertial)
        } else {
            MotionClassification::INDETERMINATE
        };
        debug!(
            chord_degrees = estimate.rom_degrees,
            swept_degrees = swept,
            dominance = ?classification.dominance,
            "fusing segment ROM"
        );
        RomSource::Measured(self.engine.fuse(&estimate, swept, &classification))
    }

    /// Close the current segment at `mark`; returns the accepted rep, if any
    fn close_segment(&mut self, mark: &RepMark) -> Option<RepEvent> {
        let rom = self.segment_rom(mark);
        let smoothness = self.smoothness.finish_segment();

        self.segment_start = Some(mark.boundary.min(mark.timestamp));
        if let Some(start) = self.segment_start {
            self.inertial.retain_since(start);
            self.positions.retain_since(start);
            self.joints.retain_since(start);
        }

        let rom_degrees = match rom {
            RomSource::Measured(degrees) if degrees < self.profile.therapeutic_min_degrees => {
                self.rejected_reps += 1;
                debug!(
                    rom_degrees = degrees,
                    therapeutic_min = self.profile.therapeutic_min_degrees,
                    "rep below therapeutic minimum dropped"
                );
                return None;
            }
            RomSource::Measured(degrees) => degrees,
            // Reps without any ROM source count with a neutral zero; the
            // therapeutic gate only applies to measured ROM
            RomSource::Unavailable => 0.0,
        };

        self.rom_values.push(rom_degrees);
        self.rep_timestamps.push(mark.timestamp);
        if let Some(score) = smoothness {
            self.smoothness_scores.push(score);
        }
        let index = u32::try_from(self.rom_values.len()).unwrap_or(u32::MAX);
        info!(
            session_id = %self.id,
            exercise = %self.profile.exercise,
            index,
            rom_degrees,
            timestamp = mark.timestamp,
            "rep accepted"
        );
        Some(RepEvent {
            index,
            rom_degrees,
            timestamp: mark.timestamp,
            method: mark.method,
        })
    }

    fn rep_count(&self) -> u32 {
        u32::try_from(self.rom_values.len()).unwrap_or(u32::MAX)
    }

    fn finish(self) -> SessionMetrics {
        let rep_count = self.rep_count();
        let average_rom = if self.rom_values.is_empty() {
            0.0
        } else {
            self.rom_values.iter().sum::<f64>() / self.rom_values.len() as f64
        };
        let max_rom = self.rom_values.iter().copied().fold(0.0_f64, f64::max);
        let average_smoothness = (!self.smoothness_scores.is_empty()).then(|| {
            self.smoothness_scores.iter().sum::<f64>() / self.smoothness_scores.len() as f64
        });
        let duration_seconds = match (self.first_timestamp, self.last_timestamp) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        };

        SessionMetrics {
            session_id: self.id,
            exercise: self.profile.exercise,
            rep_count,
            rejected_reps: self.rejected_reps,
            consistency_score: consistency_score(&self.rom_values),
            quality_grade: QualityGrade::from_counts(rep_count, self.rejected_reps),
            rom_values: self.rom_values,
            rep_timestamps: self.rep_timestamps,
            average_rom,
            max_rom,
            smoothness: self.smoothness_scores,
            average_smoothness,
            started_at: self.started_at,
            ended_at: Utc::now(),
            duration_seconds,
        }
    }
}

#[derive(Debug)]
enum SessionState {
    Idle,
    Active(Box<ActiveSession>),
    Ended(Uuid),
}

/// Owns per-session analysis state and publishes session events
#[derive(Debug)]
pub struct SessionAggregator {
    calibration: CalibrationProfile,
    config: AnalysisConfig,
    subscribers: Vec<UnboundedSender<SessionEvent>>,
    state: SessionState,
}

impl SessionAggregator {
    /// Aggregator for one calibrated user
    #[must_use]
    pub const fn new(calibration: CalibrationProfile, config: AnalysisConfig) -> Self {
        Self {
            calibration,
            config,
            subscribers: Vec::new(),
            state: SessionState::Idle,
        }
    }

    /// Receive every event published from now on
    pub fn subscribe(&mut self) -> UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Calibration used for ROM
    #[must_use]
    pub const fn calibration(&self) -> &CalibrationProfile {
        &self.calibration
    }

    /// Replace the calibration; applies from the next session
    pub fn set_calibration(&mut self, calibration: CalibrationProfile) {
        self.calibration = calibration;
    }

    /// Start a session, discarding any previous per-session state
    pub fn start_session(&mut self, profile: DetectionProfile) -> Uuid {
        if let SessionState::Active(previous) = &self.state {
            warn!(session_id = %previous.id, "previous session replaced without ending");
        }
        let session = ActiveSession::new(profile, &self.calibration, &self.config);
        let id = session.id;
        info!(
            session_id = %id,
            exercise = %profile.exercise,
            method = ?profile.method(),
            segment_length_m = self.calibration.segment_length_m,
            default_calibration = self.calibration.is_default,
            "session started"
        );
        self.state = SessionState::Active(Box::new(session));
        id
    }

    /// Identifier of the running or most recently ended session
    #[must_use]
    pub fn session_id(&self) -> Option<Uuid> {
        match &self.state {
            SessionState::Active(session) => Some(session.id),
            SessionState::Ended(id) => Some(*id),
            SessionState::Idle => None,
        }
    }

    /// Whether a session is accepting samples
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active(_))
    }

    /// Accepted reps in the running session
    #[must_use]
    pub fn rep_count(&self) -> u32 {
        match &self.state {
            SessionState::Active(session) => session.rep_count(),
            SessionState::Idle | SessionState::Ended(_) => 0,
        }
    }

    /// Route one sample by modality
    ///
    /// # Errors
    ///
    /// Returns `NotStarted` before the first session and `SessionEnded` after
    /// `end_session`.
    pub fn feed(&mut self, sample: SensorSample) -> Result<Option<RepEvent>, SessionError> {
        let session = match &mut self.state {
            SessionState::Active(session) => session,
            SessionState::Idle => return Err(SessionError::NotStarted),
            SessionState::Ended(id) => {
                return Err(SessionError::SessionEnded {
                    session_id: id.to_string(),
                })
            }
        };

        if !session.clock.advance(&sample) {
            debug!(timestamp = sample.timestamp(), "non-increasing timestamp dropped");
            return Ok(None);
        }
        let timestamp = sample.timestamp();
        session.first_timestamp.get_or_insert(timestamp);
        session.last_timestamp = Some(timestamp);

        let mut events = Vec::new();
        let mark = match sample {
            SensorSample::Inertial(inertial) => {
                session.inertial.push(inertial);
                if let SmoothnessPipeline::Inertial(pipeline) = &mut session.smoothness {
                    pipeline.push(&inertial);
                }
                session.detector.process_inertial(&inertial)
            }
            SensorSample::Pose(frame) => Self::route_pose(
                session,
                &frame,
                self.config.session.tracking_notice_frames,
                &mut events,
            ),
            SensorSample::Joints(pose) => {
                if let SmoothnessPipeline::Limb(pipeline) = &mut session.smoothness {
                    pipeline.push(&pose);
                }
                let mark = session.detector.process_joints(&pose);
                session.joints.push(pose);
                mark
            }
        };

        let rep = mark.and_then(|mark| session.close_segment(&mark));
        if let Some(rep) = rep {
            events.push(SessionEvent::Rep(rep));
        }
        for event in events {
            self.publish(event);
        }
        Ok(rep)
    }

    fn route_pose(
        session: &mut ActiveSession,
        frame: &PoseFrame,
        notice_frames: u32,
        events: &mut Vec<SessionEvent>,
    ) -> Option<RepMark> {
        let Some(sample) = frame.to_sample() else {
            session.degraded_streak = session.degraded_streak.saturating_add(1);
            if session.degraded_streak == notice_frames {
                warn!(
                    session_id = %session.id,
                    consecutive_frames = session.degraded_streak,
                    tracking = ?frame.tracking,
                    "world tracking degraded"
                );
                events.push(SessionEvent::TrackingDegraded {
                    consecutive_frames: session.degraded_streak,
                });
            }
            return None;
        };
        if session.degraded_streak > 0 {
            debug!(frames = session.degraded_streak, "world tracking recovered");
            session.degraded_streak = 0;
        }

        session.positions.push(sample);
        if let SmoothnessPipeline::WorldPose(pipeline) = &mut session.smoothness {
            pipeline.push_position(&sample);
        }
        if let Some(degrees) = session.live_rom.as_mut().and_then(|live| live.push(&sample)) {
            events.push(SessionEvent::LiveRom {
                degrees,
                timestamp: sample.timestamp,
            });
        }
        session.detector.process_position(&sample)
    }

    /// Finalize the session; later samples are rejected
    ///
    /// # Errors
    ///
    /// Returns `NotStarted` when no session was started and `AlreadyEnded`
    /// when the session has already been finalized.
    pub fn end_session(&mut self) -> Result<SessionMetrics, SessionError> {
        let session = match mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::Active(session) => session,
            SessionState::Idle => return Err(SessionError::NotStarted),
            SessionState::Ended(id) => {
                self.state = SessionState::Ended(id);
                return Err(SessionError::AlreadyEnded {
                    session_id: id.to_string(),
                });
            }
        };
        self.state = SessionState::Ended(session.id);

        let metrics = session.finish();
        info!(
            session_id = %metrics.session_id,
            exercise = %metrics.exercise,
            reps = metrics.rep_count,
            rejected = metrics.rejected_reps,
            average_rom = metrics.average_rom,
            grade = ?metrics.quality_grade,
            "session ended"
        );
        self.publish(SessionEvent::Completed(Box::new(metrics.clone())));
        Ok(metrics)
    }

    fn publish(&mut self, event: SessionEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// Thread-safe handle over one aggregator for concurrent sample producers
///
/// `end_session` flips a hard-stop flag before taking the analysis lock, so
/// producers racing the end are rejected instead of queued behind it.
#[derive(Debug, Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<SessionAggregator>>,
    stopped: Arc<AtomicBool>,
}

impl SharedSession {
    /// Wrap an aggregator
    #[must_use]
    pub fn new(aggregator: SessionAggregator) -> Self {
        Self {
            inner: Arc::new(Mutex::new(aggregator)),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, SessionAggregator>, SessionError> {
        self.inner
            .lock()
            .map_err(|_| SessionError::LockPoisoned("session aggregator"))
    }

    /// Receive every event published from now on
    ///
    /// # Errors
    ///
    /// Returns `LockPoisoned` if a producer panicked while holding the lock.
    pub fn subscribe(&self) -> Result<UnboundedReceiver<SessionEvent>, SessionError> {
        Ok(self.lock()?.subscribe())
    }

    /// Start a session and accept samples again
    ///
    /// # Errors
    ///
    /// Returns `LockPoisoned` if a producer panicked while holding the lock.
    pub fn start_session(&self, profile: DetectionProfile) -> Result<Uuid, SessionError> {
        let mut aggregator = self.lock()?;
        let id = aggregator.start_session(profile);
        self.stopped.store(false, Ordering::SeqCst);
        Ok(id)
    }

    /// Feed one sample from any producer thread
    ///
    /// # Errors
    ///
    /// Returns `SessionEnded` once `end_session` has been called, plus any
    /// error of [`SessionAggregator::feed`].
    pub fn feed(&self, sample: SensorSample) -> Result<Option<RepEvent>, SessionError> {
        if self.stopped.load(Ordering::SeqCst) {
            // Never wait on the lock once stopped
            let session_id = self
                .inner
                .try_lock()
                .ok()
                .and_then(|aggregator| aggregator.session_id())
                .map_or_else(|| String::from("unknown"), |id| id.to_string());
            return Err(SessionError::SessionEnded { session_id });
        }
        self.lock()?.feed(sample)
    }

    /// Stop accepting samples and finalize the session
    ///
    /// # Errors
    ///
    /// Returns the errors of [`SessionAggregator::end_session`].
    pub fn end_session(&self) -> Result<SessionMetrics, SessionError> {
        self.stopped.store(true, Ordering::SeqCst);
        self.lock()?.end_session()
    }

    /// Accepted reps in the running session
    ///
    /// # Errors
    ///
    /// Returns `LockPoisoned` if a producer panicked while holding the lock.
    pub fn rep_count(&self) -> Result<u32, SessionError> {
        Ok(self.lock()?.rep_count())
    }
}
