use chroma_watch::WatchError;
use chroma_watch::core_modules::recording_session::VideoSink;
use image::RgbImage;
use opencv::{
    core::{self, Mat, Scalar},
    imgproc,
    prelude::*,
    videoio::VideoWriter,
};

fn sink_error(err: opencv::Error) -> WatchError {
    WatchError::Sink(err.to_string())
}

/// Writes one clip to a fixed path, overwriting the previous one.
pub struct ClipWriter {
    path: String,
    fourcc: [char; 4],
    writer: Option<VideoWriter>,
    size: Option<(u32, u32)>,
    bgr_frame: Mat,
}

impl ClipWriter {
    pub fn new(path: &str, fourcc: [char; 4]) -> Self {
        Self {
            path: path.to_string(),
            fourcc,
            writer: None,
            size: None,
            bgr_frame: Mat::default(),
        }
    }

    fn open_writer(&self, fps: f64, width: u32, height: u32) -> opencv::Result<VideoWriter> {
        let [c1, c2, c3, c4] = self.fourcc;
        let fourcc = VideoWriter::fourcc(c1, c2, c3, c4)?;
        VideoWriter::new(
            &self.path,
            fourcc,
            fps,
            core::Size::new(width as i32, height as i32),
            true,
        )
    }

    fn convert_to_bgr(&mut self, frame: &RgbImage) -> opencv::Result<()> {
        let (width, height) = frame.dimensions();
        let mut rgb_frame = Mat::new_rows_cols_with_default(
            height as i32,
            width as i32,
            core::CV_8UC3,
            Scalar::all(0.0),
        )?;
        rgb_frame.data_bytes_mut()?.copy_from_slice(frame.as_raw());
        imgproc::cvt_color(&rgb_frame, &mut self.bgr_frame, imgproc::COLOR_RGB2BGR, 0)
    }
}

impl VideoSink for ClipWriter {
    fn open(&mut self, fps: f64, width: u32, height: u32) -> chroma_watch::Result<()> {
        let writer = self.open_writer(fps, width, height).map_err(sink_error)?;
        if !writer.is_opened().map_err(sink_error)? {
            return Err(WatchError::Sink(format!("could not open {} for writing", self.path)));
        }
        self.writer = Some(writer);
        self.size = Some((width, height));
        Ok(())
    }

    fn append(&mut self, frame: &RgbImage) -> chroma_watch::Result<()> {
        if let Some(expected) = self.size {
            if frame.dimensions() != expected {
                return Err(WatchError::FrameSize {
                    expected,
                    actual: frame.dimensions(),
                });
            }
        }
        self.convert_to_bgr(frame).map_err(sink_error)?;
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| WatchError::Sink("append on a closed writer".into()))?;
        writer.write(&self.bgr_frame).map_err(sink_error)
    }

    fn close(&mut self) -> chroma_watch::Result<()> {
        self.size = None;
        if let Some(mut writer) = self.writer.take() {
            writer.release().map_err(sink_error)?;
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.writer.is_some()
    }
}
