//! Per-frame processing loop
//!
//! Each frame is handled to completion before the next one is requested:
//! detect, validate, classify, extract, append, present. A malformed hand
//! is dropped and logged without affecting the rest of the frame.

use std::borrow::Cow;

use tracing::{debug, error, info, warn};

use crate::camera::FrameSource;
use crate::classifier::{ExtensionCount, FingerClassifier};
use crate::config::Config;
use crate::inference::HandDetector;
use crate::landmarks::{BoundingBox, HandObservation, RawHand};
use crate::overlay::{Flow, FrameSink};
use crate::session::{SessionAccumulator, SessionSummary};
use crate::vectors::{extract, FingerVectorSet};
use crate::{Error, Result};

/// Everything the renderer needs for one hand in one frame
#[derive(Debug, Clone, PartialEq)]
pub struct HandAnnotation {
    pub observation: HandObservation,
    pub count: ExtensionCount,
    pub vectors: FingerVectorSet,
}

impl HandAnnotation {
    pub fn label(&self) -> Cow<'static, str> {
        self.count.label()
    }

    pub fn average_planar_magnitude(&self) -> f32 {
        self.vectors.average_planar_magnitude()
    }

    pub fn bounding_box(&self, width: u32, height: u32, margin: i32) -> BoundingBox {
        self.observation.bounding_box(width, height, margin)
    }

    /// Vectors in units of the index finger's planar reach, `None` when
    /// the index tip sits on the wrist
    pub fn scaled_vectors(&self) -> Option<FingerVectorSet> {
        self.vectors.scaled_by_index_reach()
    }
}

/// Why the capture loop stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    StopRequested,
    StreamEnded,
    SourceFailed(String),
    SinkFailed(String),
    ResourceExhausted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub summary: SessionSummary,
    pub end: SessionEnd,
}

#[derive(Debug)]
pub struct HandTracker {
    classifier: FingerClassifier,
    accumulator: SessionAccumulator,
    max_hands: usize,
    frames_processed: u64,
    frames_skipped: u64,
    hands_dropped: u64,
}

impl HandTracker {
    pub fn new(classifier: FingerClassifier, max_hands: usize) -> Self {
        Self {
            classifier,
            accumulator: SessionAccumulator::new(),
            max_hands: max_hands.max(1),
            frames_processed: 0,
            frames_skipped: 0,
            hands_dropped: 0,
        }
    }

    /// Tracker that writes into a caller-supplied accumulator
    pub fn with_accumulator(
        classifier: FingerClassifier,
        max_hands: usize,
        accumulator: SessionAccumulator,
    ) -> Self {
        Self {
            accumulator,
            ..Self::new(classifier, max_hands)
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            FingerClassifier::with_margin(config.classifier.vertical_margin),
            config.detector.max_hands,
        )
    }

    pub fn accumulator(&self) -> &SessionAccumulator {
        &self.accumulator
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Frames whose detection failed
    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped
    }

    /// Hands rejected as malformed
    pub fn hands_dropped(&self) -> u64 {
        self.hands_dropped
    }

    /// Process one frame's detector output.
    ///
    /// Only the first valid hand of a frame is written to the session log,
    /// so the log holds one entry per frame with a usable hand.
    pub fn process_hands(&mut self, hands: Vec<RawHand>) -> Result<Vec<HandAnnotation>> {
        self.frames_processed += 1;

        let mut annotations = Vec::with_capacity(hands.len().min(self.max_hands));
        for raw in hands {
            if annotations.len() == self.max_hands {
                break;
            }
            let observation = match HandObservation::from_raw(raw) {
                Ok(obs) => obs,
                Err(e) => {
                    self.hands_dropped += 1;
                    warn!(frame = self.frames_processed, "dropping hand: {e}");
                    continue;
                }
            };

            let count = self.classifier.classify(&observation);
            let vectors = extract(&observation);
            debug!(
                frame = self.frames_processed,
                hand = %observation.handedness(),
                score = observation.score(),
                fingers = count.get(),
                "hand processed"
            );
            annotations.push(HandAnnotation {
                observation,
                count,
                vectors,
            });
        }

        if let Some(first) = annotations.first() {
            self.accumulator.append(first.vectors)?;
        }
        Ok(annotations)
    }

    /// Run until the sink asks to stop, the source runs dry, or something
    /// fatal happens. The session is closed and summarized on every path
    /// except a contract violation.
    pub fn run<S, D, K>(&mut self, source: &mut S, detector: &mut D, sink: &mut K) -> Result<SessionReport>
    where
        S: FrameSource,
        D: HandDetector<S::Frame>,
        K: FrameSink<S::Frame>,
    {
        info!("capture session started");
        let end = loop {
            let mut frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break SessionEnd::StreamEnded,
                Err(e) => {
                    error!("frame source failed: {e:#}");
                    break SessionEnd::SourceFailed(e.to_string());
                }
            };

            let hands = match detector.detect(&frame) {
                Ok(hands) => hands,
                Err(e) => {
                    self.frames_skipped += 1;
                    warn!("detection failed, skipping frame: {e:#}");
                    Vec::new()
                }
            };

            let annotations = match self.process_hands(hands) {
                Ok(annotations) => annotations,
                Err(Error::ResourceExhausted { frames }) => {
                    error!(frames, "session log cannot grow any further");
                    break SessionEnd::ResourceExhausted;
                }
                Err(e) => return Err(e),
            };

            match sink.present(&mut frame, &annotations) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop) => break SessionEnd::StopRequested,
                Err(e) => {
                    error!("frame sink failed: {e:#}");
                    break SessionEnd::SinkFailed(e.to_string());
                }
            }
        };

        info!(
            ?end,
            frames = self.frames_processed,
            skipped = self.frames_skipped,
            dropped_hands = self.hands_dropped,
            "capture session ended"
        );
        Ok(SessionReport {
            summary: self.finish(),
            end,
        })
    }

    /// Close the session and summarize it
    pub fn finish(&mut self) -> SessionSummary {
        self.accumulator.close();
        self.accumulator.summarize()
    }
}

impl Default for HandTracker {
    fn default() -> Self {
        Self::new(FingerClassifier::default(), 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{Finger, Landmark, LANDMARK_COUNT};

    fn raw(label: &str, count: usize) -> RawHand {
        RawHand {
            label: label.to_string(),
            score: 0.9,
            landmarks: vec![Landmark::new(0.5, 0.5, 0.0); count],
        }
    }

    #[test]
    fn test_empty_frame_appends_nothing() {
        let mut tracker = HandTracker::default();
        let annotations = tracker.process_hands(Vec::new()).unwrap();
        assert!(annotations.is_empty());
        assert_eq!(tracker.accumulator().len(), 0);
        assert_eq!(tracker.frames_processed(), 1);
    }

    #[test]
    fn test_malformed_hand_is_dropped() {
        let mut tracker = HandTracker::new(FingerClassifier::default(), 2);
        let annotations = tracker
            .process_hands(vec![raw("Right", 20), raw("Left", LANDMARK_COUNT)])
            .unwrap();
        assert_eq!(annotations.len(), 1);
        assert_eq!(tracker.hands_dropped(), 1);
        assert_eq!(tracker.accumulator().len(), 1);
    }

    #[test]
    fn test_one_log_entry_per_frame() {
        let mut tracker = HandTracker::new(FingerClassifier::default(), 2);
        let annotations = tracker
            .process_hands(vec![raw("Right", LANDMARK_COUNT), raw("Left", LANDMARK_COUNT)])
            .unwrap();
        assert_eq!(annotations.len(), 2);
        assert_eq!(tracker.accumulator().len(), 1);
    }

    #[test]
    fn test_max_hands_limits_annotations() {
        let mut tracker = HandTracker::default();
        let annotations = tracker
            .process_hands(vec![raw("Left", LANDMARK_COUNT), raw("Right", LANDMARK_COUNT)])
            .unwrap();
        assert_eq!(annotations.len(), 1);
    }

    #[test]
    fn test_process_after_finish_is_contract_violation() {
        let mut tracker = HandTracker::default();
        tracker.process_hands(vec![raw("Right", LANDMARK_COUNT)]).unwrap();
        let summary = tracker.finish();
        assert_eq!(summary.frame_count, 1);
        assert!(matches!(
            tracker.process_hands(vec![raw("Right", LANDMARK_COUNT)]),
            Err(Error::AccumulatorClosed)
        ));
    }

    #[test]
    fn test_annotation_scaled_vectors() {
        let mut hand = raw("Right", LANDMARK_COUNT);
        hand.landmarks[8] = Landmark::new(0.5, 0.25, 0.0);
        hand.landmarks[4] = Landmark::new(0.625, 0.5, -0.125);
        let mut tracker = HandTracker::default();
        let annotations = tracker.process_hands(vec![hand]).unwrap();

        let scaled = annotations[0].scaled_vectors().unwrap();
        assert_eq!(scaled[Finger::Index].y, -1.0);
        assert_eq!(scaled[Finger::Thumb].x, 0.5);
        assert_eq!(scaled[Finger::Thumb].z, -0.5);

        let flat = tracker.process_hands(vec![raw("Right", LANDMARK_COUNT)]).unwrap();
        assert!(flat[0].scaled_vectors().is_none());
    }

    #[test]
    fn test_full_accumulator_surfaces_resource_exhaustion() {
        let mut tracker = HandTracker::with_accumulator(
            FingerClassifier::default(),
            1,
            SessionAccumulator::with_frame_limit(1),
        );
        tracker.process_hands(vec![raw("Right", LANDMARK_COUNT)]).unwrap();
        assert!(matches!(
            tracker.process_hands(vec![raw("Right", LANDMARK_COUNT)]),
            Err(Error::ResourceExhausted { frames: 1 })
        ));
        assert_eq!(tracker.accumulator().len(), 1);
    }

    #[test]
    fn test_annotation_display_values() {
        let mut tracker = HandTracker::default();
        let annotations = tracker.process_hands(vec![raw("Left", LANDMARK_COUNT)]).unwrap();
        let hand = &annotations[0];
        assert_eq!(hand.label(), "ZERO");
        assert_eq!(hand.average_planar_magnitude(), 0.0);
        let bbox = hand.bounding_box(100, 100, 30);
        assert_eq!((bbox.x_min, bbox.x_max), (20, 80));
    }
}
