//! Hand landmark model
//!
//! A detected hand is 21 keypoints in a fixed anatomical order. `x` and `y`
//! are normalized to the frame width/height, `z` is depth relative to the
//! wrist (more negative = closer to the camera).

use std::fmt;
use std::str::FromStr;

use strum_macros::EnumIter;

use crate::{Error, Result};

/// Number of landmarks per hand
pub const LANDMARK_COUNT: usize = 21;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<[f32; 3]> for Landmark {
    fn from(p: [f32; 3]) -> Self {
        Self::new(p[0], p[1], p[2])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handedness {
    Left,
    Right,
}

impl FromStr for Handedness {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            l if l.eq_ignore_ascii_case("left") => Ok(Handedness::Left),
            r if r.eq_ignore_ascii_case("right") => Ok(Handedness::Right),
            other => Err(Error::MalformedObservation(format!(
                "unknown handedness label {other:?}"
            ))),
        }
    }
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handedness::Left => f.write_str("Left"),
            Handedness::Right => f.write_str("Right"),
        }
    }
}

/// Anatomical landmark positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum HandLandmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

impl HandLandmark {
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Skeleton edges for drawing
pub const HAND_CONNECTIONS: [(HandLandmark, HandLandmark); 21] = {
    use HandLandmark::*;
    [
        (Wrist, ThumbCmc), (ThumbCmc, ThumbMcp), (ThumbMcp, ThumbIp), (ThumbIp, ThumbTip),
        (Wrist, IndexMcp), (IndexMcp, IndexPip), (IndexPip, IndexDip), (IndexDip, IndexTip),
        (IndexMcp, MiddleMcp), (MiddleMcp, MiddlePip), (MiddlePip, MiddleDip), (MiddleDip, MiddleTip),
        (MiddleMcp, RingMcp), (RingMcp, RingPip), (RingPip, RingDip), (RingDip, RingTip),
        (RingMcp, PinkyMcp), (Wrist, PinkyMcp), (PinkyMcp, PinkyPip), (PinkyPip, PinkyDip),
        (PinkyDip, PinkyTip),
    ]
};

/// The five fingers, in vector-set order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const COUNT: usize = 5;

    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    pub const fn tip(self) -> HandLandmark {
        match self {
            Finger::Thumb => HandLandmark::ThumbTip,
            Finger::Index => HandLandmark::IndexTip,
            Finger::Middle => HandLandmark::MiddleTip,
            Finger::Ring => HandLandmark::RingTip,
            Finger::Pinky => HandLandmark::PinkyTip,
        }
    }

    /// Joint the extension test compares the tip against. For the thumb
    /// this is the one directly below the tip (IP); for the other fingers
    /// it is the middle (PIP) joint.
    pub const fn joint(self) -> HandLandmark {
        match self {
            Finger::Thumb => HandLandmark::ThumbIp,
            Finger::Index => HandLandmark::IndexPip,
            Finger::Middle => HandLandmark::MiddlePip,
            Finger::Ring => HandLandmark::RingPip,
            Finger::Pinky => HandLandmark::PinkyPip,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Finger::Thumb => "THUMB",
            Finger::Index => "INDEX",
            Finger::Middle => "MIDDLE",
            Finger::Ring => "RING",
            Finger::Pinky => "PINKY",
        }
    }

    pub const fn position(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Finger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One hand as reported by a detector, not yet validated
#[derive(Debug, Clone, PartialEq)]
pub struct RawHand {
    pub label: String,
    pub score: f32,
    pub landmarks: Vec<Landmark>,
}

/// Validated hand: handedness plus exactly 21 finite landmarks
#[derive(Debug, Clone, PartialEq)]
pub struct HandObservation {
    handedness: Handedness,
    score: f32,
    landmarks: [Landmark; LANDMARK_COUNT],
}

impl HandObservation {
    pub fn new(handedness: Handedness, landmarks: &[Landmark]) -> Result<Self> {
        if landmarks.len() != LANDMARK_COUNT {
            return Err(Error::MalformedObservation(format!(
                "expected {LANDMARK_COUNT} landmarks, got {}",
                landmarks.len()
            )));
        }
        if let Some(i) = landmarks.iter().position(|lm| !lm.is_finite()) {
            return Err(Error::MalformedObservation(format!(
                "landmark {i} has a non-finite coordinate"
            )));
        }

        let mut buf = [Landmark::default(); LANDMARK_COUNT];
        buf.copy_from_slice(landmarks);
        Ok(Self {
            handedness,
            score: 1.0,
            landmarks: buf,
        })
    }

    pub fn from_raw(raw: RawHand) -> Result<Self> {
        let handedness = raw.label.parse()?;
        let mut obs = Self::new(handedness, &raw.landmarks)?;
        obs.score = raw.score;
        Ok(obs)
    }

    pub fn handedness(&self) -> Handedness {
        self.handedness
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn landmarks(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.landmarks
    }

    pub fn get(&self, point: HandLandmark) -> Landmark {
        self.landmarks[point.index()]
    }

    pub fn wrist(&self) -> Landmark {
        self.get(HandLandmark::Wrist)
    }

    /// Same geometry with the handedness label swapped
    pub fn with_handedness(&self, handedness: Handedness) -> Self {
        Self {
            handedness,
            ..self.clone()
        }
    }

    /// Pixel-space box around all landmarks, grown by `margin` pixels
    pub fn bounding_box(&self, width: u32, height: u32, margin: i32) -> BoundingBox {
        let (w, h) = (width as f32, height as f32);
        let mut x_min = i32::MAX;
        let mut y_min = i32::MAX;
        let mut x_max = i32::MIN;
        let mut y_max = i32::MIN;

        for lm in &self.landmarks {
            let px = (lm.x * w) as i32;
            let py = (lm.y * h) as i32;
            x_min = x_min.min(px);
            y_min = y_min.min(py);
            x_max = x_max.max(px);
            y_max = y_max.max(py);
        }

        BoundingBox {
            x_min: x_min.saturating_sub(margin),
            y_min: y_min.saturating_sub(margin),
            x_max: x_max.saturating_add(margin),
            y_max: y_max.saturating_add(margin),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl BoundingBox {
    pub fn width(&self) -> i32 {
        self.x_max.saturating_sub(self.x_min)
    }

    pub fn height(&self) -> i32 {
        self.y_max.saturating_sub(self.y_min)
    }
}
