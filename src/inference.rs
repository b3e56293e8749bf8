//! Hand landmark detection boundary
//!
//! The tracker only sees the `HandDetector` trait. The ONNX backend is
//! available with the `capture` feature.

use anyhow::Result;

use crate::landmarks::RawHand;

/// Black-box detector: one image in, zero or more hands out.
/// Confidence thresholding happens inside the detector.
pub trait HandDetector<F> {
    fn detect(&mut self, frame: &F) -> Result<Vec<RawHand>>;
}

#[cfg(feature = "capture")]
pub use onnx::OnnxHandDetector;

#[cfg(feature = "capture")]
mod onnx {
    use anyhow::{anyhow, bail, Result};
    use opencv::core::{self, Mat, Size, Vec3f};
    use opencv::imgproc;
    use opencv::prelude::*;
    use ort::session::builder::GraphOptimizationLevel;
    use ort::session::Session;
    use ort::value::{Tensor, ValueType};
    use tracing::{debug, info};

    use super::HandDetector;
    use crate::config::DetectorConfig;
    use crate::landmarks::{Landmark, RawHand, LANDMARK_COUNT};

    const DEFAULT_INPUT_SIZE: usize = 224;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Layout {
        Nchw,
        Nhwc,
    }

    /// Single-hand landmark model.
    ///
    /// Expects three outputs: 63 landmark values in input-pixel units, a
    /// hand presence score and a handedness score (probability of a right
    /// hand).
    pub struct OnnxHandDetector {
        session: Session,
        input_width: usize,
        input_height: usize,
        layout: Layout,
        output_names: Vec<String>,
        min_detection_confidence: f32,
        min_tracking_confidence: f32,
        tracking: bool,
    }

    impl OnnxHandDetector {
        pub fn new(config: &DetectorConfig) -> Result<Self> {
            let session = Session::builder()?
                .with_optimization_level(GraphOptimizationLevel::Level3)?
                .commit_from_file(&config.model_path)?;

            let (input_width, input_height, layout) = Self::input_dimensions(&session)?;
            let output_names: Vec<String> =
                session.outputs.iter().map(|o| o.name.clone()).collect();
            if output_names.len() < 3 {
                bail!(
                    "hand landmark model must have 3 outputs, found {}",
                    output_names.len()
                );
            }

            info!(
                model = %config.model_path,
                width = input_width,
                height = input_height,
                "hand landmark model loaded"
            );

            Ok(Self {
                session,
                input_width,
                input_height,
                layout,
                output_names,
                min_detection_confidence: config.min_detection_confidence,
                min_tracking_confidence: config.min_tracking_confidence,
                tracking: false,
            })
        }

        fn input_dimensions(session: &Session) -> Result<(usize, usize, Layout)> {
            let input = session
                .inputs
                .first()
                .ok_or_else(|| anyhow!("No inputs found"))?;

            let dims = match &input.input_type {
                ValueType::Tensor { dimensions, .. } => dimensions.clone(),
                other => bail!("unsupported model input type {other:?}"),
            };

            let size = |d: i64| {
                if d > 0 {
                    d as usize
                } else {
                    DEFAULT_INPUT_SIZE
                }
            };

            if dims.len() == 4 && dims[3] == 3 {
                Ok((size(dims[2]), size(dims[1]), Layout::Nhwc))
            } else if dims.len() == 4 {
                Ok((size(dims[3]), size(dims[2]), Layout::Nchw))
            } else {
                Ok((DEFAULT_INPUT_SIZE, DEFAULT_INPUT_SIZE, Layout::Nhwc))
            }
        }

        fn preprocess(&self, frame: &Mat) -> Result<Tensor<f32>> {
            let mut rgb = Mat::default();
            imgproc::cvt_color(frame, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;

            let mut resized = Mat::default();
            imgproc::resize(
                &rgb,
                &mut resized,
                Size::new(self.input_width as i32, self.input_height as i32),
                0.0,
                0.0,
                imgproc::INTER_LINEAR,
            )?;

            let mut float_img = Mat::default();
            resized.convert_to(&mut float_img, core::CV_32FC3, 1.0 / 255.0, 0.0)?;

            let (h, w) = (self.input_height, self.input_width);
            let pixels = float_img.data_typed::<Vec3f>()?;
            let mut data = vec![0.0f32; 3 * h * w];

            for (idx, pixel) in pixels.iter().enumerate() {
                match self.layout {
                    Layout::Nhwc => data[idx * 3..idx * 3 + 3].copy_from_slice(&pixel.0),
                    Layout::Nchw => {
                        data[idx] = pixel[0];
                        data[h * w + idx] = pixel[1];
                        data[2 * h * w + idx] = pixel[2];
                    }
                }
            }

            let shape = match self.layout {
                Layout::Nhwc => vec![1i64, h as i64, w as i64, 3],
                Layout::Nchw => vec![1i64, 3, h as i64, w as i64],
            };
            Ok(Tensor::from_array((shape, data))?)
        }

        fn threshold(&self) -> f32 {
            if self.tracking {
                self.min_tracking_confidence
            } else {
                self.min_detection_confidence
            }
        }
    }

    impl HandDetector<Mat> for OnnxHandDetector {
        fn detect(&mut self, frame: &Mat) -> Result<Vec<RawHand>> {
            let input = self.preprocess(frame)?;
            let outputs = self.session.run(ort::inputs![input]?)?;

            let (_, coords) = outputs[self.output_names[0].as_str()].try_extract_raw_tensor::<f32>()?;
            let (_, presence) = outputs[self.output_names[1].as_str()].try_extract_raw_tensor::<f32>()?;
            let (_, handedness) = outputs[self.output_names[2].as_str()].try_extract_raw_tensor::<f32>()?;

            let score = presence.first().copied().unwrap_or(0.0);
            let threshold = self.threshold();
            if score < threshold {
                debug!(score, threshold, "no hand above confidence threshold");
                self.tracking = false;
                return Ok(Vec::new());
            }
            self.tracking = true;

            let (w, h) = (self.input_width as f32, self.input_height as f32);
            let landmarks = coords
                .chunks_exact(3)
                .take(LANDMARK_COUNT)
                .map(|p| Landmark::new(p[0] / w, p[1] / h, p[2] / w))
                .collect();

            let right = handedness.first().copied().unwrap_or(0.5) > 0.5;
            Ok(vec![RawHand {
                label: if right { "Right" } else { "Left" }.to_string(),
                score,
                landmarks,
            }])
        }
    }
}
