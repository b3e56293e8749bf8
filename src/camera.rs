//! Frame sources

use anyhow::Result;

/// Supplies frames until the stream ends (`Ok(None)`)
pub trait FrameSource {
    type Frame;

    fn next_frame(&mut self) -> Result<Option<Self::Frame>>;
}

#[cfg(feature = "capture")]
pub use device::Camera;

#[cfg(feature = "capture")]
mod device {
    use anyhow::Result;
    use opencv::{
        core::{self, Mat},
        prelude::*,
        videoio::{self, VideoCapture},
    };
    use tracing::{info, warn};

    use super::FrameSource;
    use crate::config::CameraConfig;

    /// OpenCV capture device, released on drop
    pub struct Camera {
        capture: VideoCapture,
        mirror: bool,
    }

    impl Camera {
        pub fn new(config: &CameraConfig) -> Result<Self> {
            let capture = VideoCapture::new(config.device_id, videoio::CAP_ANY)?;

            if !capture.is_opened()? {
                anyhow::bail!("Failed to open camera {}", config.device_id);
            }
            info!(device = config.device_id, mirror = config.mirror, "camera opened");

            Ok(Self {
                capture,
                mirror: config.mirror,
            })
        }
    }

    impl FrameSource for Camera {
        type Frame = Mat;

        fn next_frame(&mut self) -> Result<Option<Mat>> {
            let mut frame = Mat::default();
            if !self.capture.read(&mut frame)? || frame.empty() {
                return Ok(None);
            }

            if self.mirror {
                let mut flipped = Mat::default();
                core::flip(&frame, &mut flipped, 1)?;
                frame = flipped;
            }

            Ok(Some(frame))
        }
    }

    impl Drop for Camera {
        fn drop(&mut self) {
            if let Err(e) = self.capture.release() {
                warn!("failed to release camera: {e}");
            }
        }
    }
}
