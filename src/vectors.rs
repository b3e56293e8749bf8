//! Wrist-relative finger vectors

use std::ops::Index;

use nalgebra::Vector3;

use crate::landmarks::{Finger, HandObservation};

/// Tip minus wrist for each finger, in normalized landmark space.
/// Order is fixed: thumb, index, middle, ring, pinky.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FingerVectorSet {
    vectors: [Vector3<f32>; Finger::COUNT],
}

impl FingerVectorSet {
    pub fn new(vectors: [Vector3<f32>; Finger::COUNT]) -> Self {
        Self { vectors }
    }

    /// Same vector for every finger
    pub fn uniform(v: Vector3<f32>) -> Self {
        Self { vectors: [v; Finger::COUNT] }
    }

    pub fn vectors(&self) -> &[Vector3<f32>; Finger::COUNT] {
        &self.vectors
    }

    pub fn iter(&self) -> impl Iterator<Item = (Finger, &Vector3<f32>)> {
        Finger::ALL.into_iter().zip(self.vectors.iter())
    }

    /// Mean length of the `(x, y)` projections; `z` is ignored
    pub fn average_planar_magnitude(&self) -> f32 {
        let total: f32 = self.vectors.iter().map(|v| v.xy().norm()).sum();
        total / Finger::COUNT as f32
    }

    /// Vectors divided by the planar length of the index vector, which
    /// removes the dependence on hand distance from the camera
    pub fn scaled_by_index_reach(&self) -> Option<FingerVectorSet> {
        let reach = self[Finger::Index].xy().norm();
        if reach <= f32::EPSILON {
            return None;
        }
        Some(Self {
            vectors: self.vectors.map(|v| v / reach),
        })
    }
}

impl Index<Finger> for FingerVectorSet {
    type Output = Vector3<f32>;

    fn index(&self, finger: Finger) -> &Self::Output {
        &self.vectors[finger.position()]
    }
}

pub fn extract(obs: &HandObservation) -> FingerVectorSet {
    let wrist = obs.wrist();
    let vectors = Finger::ALL.map(|finger| {
        let tip = obs.get(finger.tip());
        Vector3::new(tip.x - wrist.x, tip.y - wrist.y, tip.z - wrist.z)
    });
    FingerVectorSet { vectors }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::test_support::observation;
    use crate::landmarks::{HandLandmark, Handedness, Landmark};

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_thumb_vector_from_wrist() {
        let obs = observation(Handedness::Right, |lms| {
            lms[HandLandmark::Wrist.index()] = Landmark::new(0.5, 0.5, 0.0);
            lms[HandLandmark::ThumbTip.index()] = Landmark::new(0.6, 0.5, 0.0);
        });
        let thumb = extract(&obs)[Finger::Thumb];
        assert!(close(thumb.x, 0.1));
        assert!(close(thumb.y, 0.0));
        assert!(close(thumb.z, 0.0));
    }

    #[test]
    fn test_depth_is_preserved() {
        let obs = observation(Handedness::Left, |lms| {
            lms[HandLandmark::Wrist.index()] = Landmark::new(0.5, 0.8, 0.0);
            lms[HandLandmark::PinkyTip.index()] = Landmark::new(0.3, 0.4, -0.05);
        });
        let set = extract(&obs);
        let pinky = set[Finger::Pinky];
        assert!(close(pinky.x, -0.2));
        assert!(close(pinky.y, -0.4));
        assert!(close(pinky.z, -0.05));
        // fingers left at the default position sit 0.3 above the wrist
        assert!(close(set[Finger::Middle].y, -0.3));
    }

    #[test]
    fn test_extract_is_deterministic() {
        let obs = observation(Handedness::Right, |lms| {
            for (i, lm) in lms.iter_mut().enumerate() {
                *lm = Landmark::new(0.01 * i as f32, 0.9 - 0.02 * i as f32, -0.001 * i as f32);
            }
        });
        assert_eq!(extract(&obs), extract(&obs));
    }

    #[test]
    fn test_average_planar_magnitude_excludes_depth() {
        let set = FingerVectorSet::new([
            Vector3::new(3.0, 4.0, 100.0),
            Vector3::new(0.0, 1.0, -7.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 9.0),
            Vector3::new(0.0, -5.0, 0.0),
        ]);
        assert!(close(set.average_planar_magnitude(), (5.0 + 1.0 + 1.0 + 0.0 + 5.0) / 5.0));
    }

    #[test]
    fn test_scaled_by_index_reach() {
        let mut vectors = [Vector3::new(0.1, -0.2, 0.0); Finger::COUNT];
        vectors[Finger::Index.position()] = Vector3::new(0.0, -0.25, 0.1);
        let scaled = FingerVectorSet::new(vectors).scaled_by_index_reach().unwrap();
        assert!(close(scaled[Finger::Index].y, -1.0));
        assert!(close(scaled[Finger::Index].z, 0.4));
        assert!(close(scaled[Finger::Thumb].x, 0.4));

        let degenerate = FingerVectorSet::uniform(Vector3::new(0.0, 0.0, 0.3));
        assert!(degenerate.scaled_by_index_reach().is_none());
    }

    #[test]
    fn test_iter_is_in_finger_order() {
        let set = FingerVectorSet::uniform(Vector3::zeros());
        let fingers: Vec<Finger> = set.iter().map(|(f, _)| f).collect();
        assert_eq!(fingers, Finger::ALL.to_vec());
    }
}
