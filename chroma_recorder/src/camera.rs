use anyhow::{Context, Result, bail};
use chroma_watch::{FrameSource, WatchError};
use image::RgbImage;
use opencv::{
    core::{self, Mat},
    highgui, imgproc,
    prelude::*,
    videoio::{self, VideoCapture},
};
use tracing::info;

pub const WINDOW_NAME: &str = "Camera";

/// A GStreamer-backed camera. Frames arrive as BGR mats and leave as RGB images.
pub struct Camera {
    capture: VideoCapture,
    preview: bool,
    frame: Mat,
    rgb_frame: Mat,
}

impl Camera {
    pub fn open(pipeline: &str, preview: bool) -> Result<Self> {
        let capture = VideoCapture::from_file(pipeline, videoio::CAP_GSTREAMER)
            .with_context(|| format!("Failed to open capture pipeline: {pipeline}"))?;
        if !capture.is_opened()? {
            bail!("Could not open camera.");
        }

        if preview {
            highgui::named_window(WINDOW_NAME, highgui::WINDOW_AUTOSIZE)
                .context("Failed to create preview window")?;
        }

        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)?;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)?;
        info!(width, height, "camera opened");

        Ok(Self {
            capture,
            preview,
            frame: Mat::default(),
            rgb_frame: Mat::default(),
        })
    }

    fn grab(&mut self) -> opencv::Result<Option<RgbImage>> {
        if !self.capture.read(&mut self.frame)? || self.frame.empty() {
            return Ok(None);
        }

        if self.preview {
            highgui::imshow(WINDOW_NAME, &self.frame)?;
        }

        imgproc::cvt_color(&self.frame, &mut self.rgb_frame, imgproc::COLOR_BGR2RGB, 0)?;
        let width = self.rgb_frame.cols() as u32;
        let height = self.rgb_frame.rows() as u32;
        let frame_buffer: Vec<u8> = self.rgb_frame.data_bytes()?.to_vec();

        RgbImage::from_raw(width, height, frame_buffer)
            .map(Some)
            .ok_or_else(|| {
                opencv::Error::new(
                    core::StsUnmatchedSizes,
                    format!("frame buffer does not match {width}x{height} RGB"),
                )
            })
    }
}

impl FrameSource for Camera {
    fn read_frame(&mut self) -> chroma_watch::Result<Option<RgbImage>> {
        self.grab().map_err(|err| WatchError::Source(err.to_string()))
    }
}
