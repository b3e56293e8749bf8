//! Hand Vectors - geometric features from hand landmarks
//!
//! Turns per-frame hand landmark observations into wrist-relative finger
//! vectors, a finger extension count, and end-of-session statistics.

pub mod camera;
pub mod classifier;
pub mod config;
pub mod inference;
pub mod landmarks;
pub mod overlay;
pub mod session;
pub mod tracker;
pub mod vectors;

pub use classifier::{classify, ExtensionCount, FingerClassifier};
pub use landmarks::{Finger, HandLandmark, HandObservation, Handedness, Landmark, RawHand};
pub use session::{SessionAccumulator, SessionState, SessionSummary, Statistics};
pub use tracker::{HandAnnotation, HandTracker, SessionEnd, SessionReport};
pub use vectors::{extract, FingerVectorSet};

/// Library error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Malformed observation: {0}")]
    MalformedObservation(String),

    #[error("Session accumulator is closed")]
    AccumulatorClosed,

    #[error("Session log exhausted memory after {frames} frames")]
    ResourceExhausted { frames: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
