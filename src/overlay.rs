//! Rendering boundary
//!
//! A `FrameSink` receives each frame together with the per-hand annotations
//! and decides whether the session continues.

use anyhow::Result;

use crate::tracker::HandAnnotation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub trait FrameSink<F> {
    fn present(&mut self, frame: &mut F, hands: &[HandAnnotation]) -> Result<Flow>;
}

/// Per-finger overlay colors (BGR), thumb to pinky
pub const FINGER_COLORS: [[f64; 3]; 5] = [
    [255.0, 0.0, 255.0],
    [0.0, 255.0, 255.0],
    [255.0, 255.0, 0.0],
    [255.0, 128.0, 0.0],
    [128.0, 0.0, 255.0],
];

#[cfg(feature = "capture")]
pub use window::CvOverlay;

#[cfg(feature = "capture")]
mod window {
    use anyhow::Result;
    use opencv::{
        core::{Mat, Point, Rect, Scalar},
        highgui, imgproc,
        prelude::*,
    };
    use tracing::warn;

    use super::{Flow, FrameSink, FINGER_COLORS};
    use crate::config::OverlayConfig;
    use crate::landmarks::{HandLandmark, Landmark, HAND_CONNECTIONS};
    use crate::tracker::HandAnnotation;

    const FONT: i32 = imgproc::FONT_HERSHEY_SIMPLEX;

    fn bgr(c: [f64; 3]) -> Scalar {
        Scalar::new(c[0], c[1], c[2], 0.0)
    }

    fn to_px(lm: Landmark, w: i32, h: i32) -> Point {
        Point::new((lm.x * w as f32) as i32, (lm.y * h as f32) as i32)
    }

    /// OpenCV window showing landmarks, wrist vectors and finger count
    pub struct CvOverlay {
        title: String,
        bbox_margin: i32,
        exit_key: i32,
    }

    impl CvOverlay {
        pub fn new(config: &OverlayConfig) -> Result<Self> {
            highgui::named_window(&config.window_title, highgui::WINDOW_AUTOSIZE)?;
            Ok(Self {
                title: config.window_title.clone(),
                bbox_margin: config.bbox_margin_px,
                exit_key: config.exit_key,
            })
        }

        fn text(frame: &mut Mat, text: &str, org: Point, scale: f64, color: Scalar, thickness: i32) -> Result<()> {
            imgproc::put_text(frame, text, org, FONT, scale, color, thickness, imgproc::LINE_8, false)?;
            Ok(())
        }

        fn draw_hand(&self, frame: &mut Mat, hand: &HandAnnotation) -> Result<()> {
            let (w, h) = (frame.cols(), frame.rows());
            let obs = &hand.observation;
            let green = Scalar::new(0.0, 255.0, 0.0, 0.0);
            let blue = Scalar::new(255.0, 0.0, 0.0, 0.0);
            let red = Scalar::new(0.0, 0.0, 255.0, 0.0);
            let white = Scalar::new(255.0, 255.0, 255.0, 0.0);

            for (a, b) in HAND_CONNECTIONS {
                let (pa, pb) = (to_px(obs.get(a), w, h), to_px(obs.get(b), w, h));
                imgproc::line(frame, pa, pb, blue, 2, imgproc::LINE_8, 0)?;
            }
            for lm in obs.landmarks() {
                imgproc::circle(frame, to_px(*lm, w, h), 2, green, -1, imgproc::LINE_8, 0)?;
            }

            let wrist = to_px(obs.get(HandLandmark::Wrist), w, h);
            for (i, (finger, v)) in hand.vectors.iter().enumerate() {
                let color = bgr(FINGER_COLORS[i]);
                let tip = to_px(obs.get(finger.tip()), w, h);
                imgproc::arrowed_line(frame, wrist, tip, color, 3, imgproc::LINE_8, 0, 0.2)?;
                imgproc::circle(frame, tip, 8, color, -1, imgproc::LINE_8, 0)?;
                imgproc::circle(frame, tip, 10, white, 2, imgproc::LINE_8, 0)?;
                let label = format!("{}: X={:.2} Y={:.2} Z={:.2}", finger.name(), v.x, v.y, v.z);
                Self::text(frame, &label, Point::new(tip.x + 10, tip.y - 10), 0.4, color, 1)?;
            }

            let bbox = hand.bounding_box(w as u32, h as u32, self.bbox_margin);
            let rect = Rect::new(bbox.x_min, bbox.y_min, bbox.width(), bbox.height());
            imgproc::rectangle(frame, rect, red, 3, imgproc::LINE_8, 0)?;
            Self::text(frame, &hand.label(), Point::new(bbox.x_min, bbox.y_min - 10), 1.5, red, 3)?;

            let magnitude = format!("Avg magnitude: {:.3}", hand.average_planar_magnitude());
            Self::text(frame, &magnitude, Point::new(10, h - 50), 0.7, white, 2)?;
            Ok(())
        }
    }

    impl FrameSink<Mat> for CvOverlay {
        fn present(&mut self, frame: &mut Mat, hands: &[HandAnnotation]) -> Result<Flow> {
            let red = Scalar::new(0.0, 0.0, 255.0, 0.0);
            let white = Scalar::new(255.0, 255.0, 255.0, 0.0);

            if hands.is_empty() {
                Self::text(frame, "No hand detected", Point::new(10, 40), 1.0, red, 2)?;
            }
            for hand in hands {
                self.draw_hand(frame, hand)?;
            }
            Self::text(frame, "ESC to quit", Point::new(10, 30), 0.6, white, 1)?;

            highgui::imshow(&self.title, &*frame)?;
            let key = highgui::wait_key(1)?;
            if key >= 0 && (key & 0xFF) == self.exit_key {
                return Ok(Flow::Stop);
            }
            Ok(Flow::Continue)
        }
    }

    impl Drop for CvOverlay {
        fn drop(&mut self) {
            if let Err(e) = highgui::destroy_all_windows() {
                warn!("failed to close overlay window: {e}");
            }
        }
    }
}
