//! Session accumulator and end-of-session summary
//!
//! The session log is an append-only sequence of finger vector sets, one
//! per frame that produced a usable hand. Once the capture stream ends the
//! accumulator is closed and only summarizing remains possible.

use std::fmt;

use nalgebra::Vector3;
use ndarray::Array3;
use tracing::{debug, info};

use crate::landmarks::Finger;
use crate::vectors::FingerVectorSet;
use crate::{Error, Result};

/// Components per finger vector
pub const AXES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closed,
}

#[derive(Debug)]
pub struct SessionAccumulator {
    log: Vec<FingerVectorSet>,
    state: SessionState,
    /// Hard cap on logged frames; reaching it behaves like allocation failure
    frame_limit: Option<usize>,
}

impl SessionAccumulator {
    pub fn new() -> Self {
        Self {
            log: Vec::new(),
            state: SessionState::Open,
            frame_limit: None,
        }
    }

    /// Accumulator that refuses to grow past `max_frames`
    pub fn with_frame_limit(max_frames: usize) -> Self {
        Self {
            frame_limit: Some(max_frames),
            ..Self::new()
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn log(&self) -> &[FingerVectorSet] {
        &self.log
    }

    /// Append one frame's vectors. Fails if the session is closed or the
    /// log can no longer grow; neither failure modifies the log.
    pub fn append(&mut self, set: FingerVectorSet) -> Result<()> {
        if self.state == SessionState::Closed {
            return Err(Error::AccumulatorClosed);
        }
        if self.frame_limit.is_some_and(|limit| self.log.len() >= limit) {
            return Err(Error::ResourceExhausted { frames: self.log.len() });
        }
        self.log
            .try_reserve(1)
            .map_err(|_| Error::ResourceExhausted { frames: self.log.len() })?;
        self.log.push(set);
        debug!(frames = self.log.len(), "appended finger vectors");
        Ok(())
    }

    /// Stop accepting frames. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.state == SessionState::Open {
            self.state = SessionState::Closed;
            info!(frames = self.log.len(), "session closed");
        }
    }

    pub fn summarize(&self) -> SessionSummary {
        SessionSummary::from_log(&self.log)
    }

    /// Session log as a `(frames, 5, 3)` array
    pub fn to_array(&self) -> Array3<f64> {
        log_to_array(&self.log)
    }
}

impl Default for SessionAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

fn log_to_array(log: &[FingerVectorSet]) -> Array3<f64> {
    Array3::from_shape_fn((log.len(), Finger::COUNT, AXES), |(frame, finger, axis)| {
        f64::from(log[frame].vectors()[finger][axis])
    })
}

/// Global statistics over every `(frame, finger, axis)` sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub shape: (usize, usize, usize),
    pub frame_count: usize,
    /// `None` for an empty session
    pub stats: Option<Statistics>,
    /// Most recently appended vectors
    pub last: Option<FingerVectorSet>,
}

impl SessionSummary {
    pub fn from_log(log: &[FingerVectorSet]) -> Self {
        let samples = log_to_array(log);
        let shape = samples.dim();

        let stats = samples.mean().map(|mean| Statistics {
            mean,
            std: samples.std(0.0),
            min: samples.iter().copied().fold(f64::INFINITY, f64::min),
            max: samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        });

        Self {
            shape,
            frame_count: log.len(),
            stats,
            last: log.last().copied(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count == 0
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(50);
        writeln!(f, "{rule}")?;
        writeln!(f, "CAPTURED VECTOR SUMMARY")?;
        writeln!(f, "{rule}")?;
        writeln!(
            f,
            "Array shape: ({}, {}, {})",
            self.shape.0, self.shape.1, self.shape.2
        )?;
        writeln!(f, "Total frames: {}", self.frame_count)?;

        if let Some(stats) = &self.stats {
            writeln!(f, "Global mean: {:.4}", stats.mean)?;
            writeln!(f, "Standard deviation: {:.4}", stats.std)?;
            writeln!(f, "Minimum: {:.4}", stats.min)?;
            writeln!(f, "Maximum: {:.4}", stats.max)?;
        }

        if let Some(last) = &self.last {
            writeln!(f)?;
            writeln!(f, "Wrist -> fingertip vectors (last frame):")?;
            for (finger, v) in last.iter() {
                writeln!(f, "  {}", format_vector(finger, v))?;
            }
        }
        Ok(())
    }
}

fn format_vector(finger: Finger, v: &Vector3<f32>) -> String {
    format!("{:<6} [x={:.3}, y={:.3}, z={:.3}]", finger.name(), v.x, v.y, v.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(x: f32, y: f32, z: f32) -> FingerVectorSet {
        FingerVectorSet::uniform(Vector3::new(x, y, z))
    }

    #[test]
    fn test_empty_session_summary() {
        let acc = SessionAccumulator::new();
        let summary = acc.summarize();
        assert_eq!(summary.frame_count, 0);
        assert_eq!(summary.shape, (0, 5, 3));
        assert!(summary.stats.is_none());
        assert!(summary.last.is_none());
        assert!(summary.is_empty());
    }

    #[test]
    fn test_single_uniform_frame() {
        let mut acc = SessionAccumulator::new();
        acc.append(uniform(0.25, 0.25, 0.25)).unwrap();
        let summary = acc.summarize();
        let stats = summary.stats.unwrap();
        assert_eq!(summary.frame_count, 1);
        assert_eq!(stats.min, stats.max);
        assert_eq!(stats.min, stats.mean);
        assert_eq!(stats.std, 0.0);
    }

    #[test]
    fn test_symmetric_frames_have_zero_mean() {
        let mut acc = SessionAccumulator::new();
        acc.append(uniform(1.0, 0.0, 0.0)).unwrap();
        acc.append(uniform(0.0, 1.0, 0.0)).unwrap();
        acc.append(uniform(-1.0, -1.0, 0.0)).unwrap();

        let summary = acc.summarize();
        let stats = summary.stats.unwrap();
        assert_eq!(summary.frame_count, 3);
        assert_eq!(summary.shape, (3, 5, 3));
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.min, -1.0);
        assert_eq!(stats.max, 1.0);
        // 20 samples of magnitude 1 among 45
        assert!((stats.std - (20.0f64 / 45.0).sqrt()).abs() < 1e-12);
        assert_eq!(summary.last, Some(uniform(-1.0, -1.0, 0.0)));
    }

    #[test]
    fn test_append_after_close_fails() {
        let mut acc = SessionAccumulator::new();
        acc.append(uniform(0.1, 0.2, 0.3)).unwrap();
        acc.close();
        assert_eq!(acc.state(), SessionState::Closed);
        assert!(matches!(
            acc.append(uniform(0.0, 0.0, 0.0)),
            Err(Error::AccumulatorClosed)
        ));
        assert_eq!(acc.len(), 1);

        // summarizing stays available once closed
        assert_eq!(acc.summarize().frame_count, 1);
    }

    #[test]
    fn test_frame_limit_rejects_without_modifying_log() {
        let mut acc = SessionAccumulator::with_frame_limit(2);
        acc.append(uniform(0.1, 0.1, 0.1)).unwrap();
        acc.append(uniform(0.2, 0.2, 0.2)).unwrap();
        assert!(matches!(
            acc.append(uniform(0.3, 0.3, 0.3)),
            Err(Error::ResourceExhausted { frames: 2 })
        ));
        assert!(acc.is_open());
        assert_eq!(acc.summarize().last, Some(uniform(0.2, 0.2, 0.2)));
    }

    #[test]
    fn test_summary_is_recomputable_from_log() {
        let mut acc = SessionAccumulator::new();
        for i in 0..4 {
            acc.append(uniform(i as f32 * 0.1, -0.2, 0.05)).unwrap();
        }
        assert_eq!(acc.summarize(), SessionSummary::from_log(acc.log()));
    }

    #[test]
    fn test_to_array_layout() {
        let mut acc = SessionAccumulator::new();
        let mut vectors = [Vector3::zeros(); Finger::COUNT];
        vectors[Finger::Ring.position()] = Vector3::new(0.5, -0.25, 0.125);
        acc.append(FingerVectorSet::new(vectors)).unwrap();

        let arr = acc.to_array();
        assert_eq!(arr.dim(), (1, 5, 3));
        assert_eq!(arr[[0, 3, 0]], 0.5);
        assert_eq!(arr[[0, 3, 1]], -0.25);
        assert_eq!(arr[[0, 3, 2]], 0.125);
        assert_eq!(arr[[0, 0, 0]], 0.0);
    }

    #[test]
    fn test_report_text() {
        let mut acc = SessionAccumulator::new();
        acc.append(uniform(0.1234, -0.5, 0.0)).unwrap();
        let report = acc.summarize().to_string();
        assert!(report.contains("Array shape: (1, 5, 3)"));
        assert!(report.contains("Total frames: 1"));
        assert!(report.contains("Global mean:"));
        assert!(report.contains("THUMB  [x=0.123, y=-0.500, z=0.000]"));
        assert!(report.contains("PINKY  [x=0.123, y=-0.500, z=0.000]"));
    }

    #[test]
    fn test_empty_report_omits_statistics() {
        let report = SessionAccumulator::new().summarize().to_string();
        assert!(report.contains("Array shape: (0, 5, 3)"));
        assert!(report.contains("Total frames: 0"));
        assert!(!report.contains("mean"));
        assert!(!report.contains("last frame"));
    }
}
