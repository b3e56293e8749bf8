//! Finger extension classifier
//!
//! The thumb is tested laterally against its IP joint, with the direction
//! depending on handedness. The other four fingers are tested vertically
//! against their PIP joint: a tip above its joint (smaller `y`) is extended.
//! Both tests are strict, so coordinates on the boundary count as folded.
//! Frames are classified independently; there is no temporal smoothing.

use std::borrow::Cow;
use std::fmt;

use strum::IntoEnumIterator;

use crate::landmarks::{Finger, HandObservation, Handedness};

/// Number of extended fingers on one hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ExtensionCount(u8);

impl ExtensionCount {
    pub const fn new(count: u8) -> Self {
        Self(count)
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// Overlay label, or the bare number if the count is out of range
    pub fn label(self) -> Cow<'static, str> {
        match self.0 {
            0 => Cow::Borrowed("ZERO"),
            1 => Cow::Borrowed("ONE"),
            2 => Cow::Borrowed("TWO"),
            3 => Cow::Borrowed("THREE"),
            4 => Cow::Borrowed("FOUR"),
            5 => Cow::Borrowed("FIVE"),
            n => Cow::Owned(n.to_string()),
        }
    }
}

impl fmt::Display for ExtensionCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FingerClassifier {
    /// How far (normalized `y`) a non-thumb tip must rise above its joint
    vertical_margin: f32,
}

impl FingerClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_margin(vertical_margin: f32) -> Self {
        Self { vertical_margin }
    }

    pub fn vertical_margin(&self) -> f32 {
        self.vertical_margin
    }

    pub fn is_extended(&self, obs: &HandObservation, finger: Finger) -> bool {
        let tip = obs.get(finger.tip());
        let joint = obs.get(finger.joint());

        match finger {
            Finger::Thumb => match obs.handedness() {
                Handedness::Right => tip.x < joint.x,
                Handedness::Left => tip.x > joint.x,
            },
            _ => joint.y - tip.y > self.vertical_margin,
        }
    }

    pub fn extended_fingers(&self, obs: &HandObservation) -> [bool; Finger::COUNT] {
        Finger::ALL.map(|finger| self.is_extended(obs, finger))
    }

    pub fn classify(&self, obs: &HandObservation) -> ExtensionCount {
        let count = Finger::iter()
            .filter(|&finger| self.is_extended(obs, finger))
            .count();
        ExtensionCount(count as u8)
    }
}

/// Classify with the strict, margin-free rule
pub fn classify(obs: &HandObservation) -> ExtensionCount {
    FingerClassifier::default().classify(obs)
}
