// THEORY:
// The `recording_session` module gates which frames reach the video sink. It is a
// two-state machine:
//
//     Idle --start--> Recording(frames_written) --cap reached--> Idle
//
// While recording, every frame is appended and counted; when the count reaches the
// configured cap the sink is closed and the controller is idle again. The
// controller owns the sink exclusively and always closes it on the way out: on the
// frame cap, on an explicit `release`, on a sink failure, and on drop.
//
// A failing sink never takes the process down. The session is abandoned, logged,
// and the controller returns to idle, ready for the next trigger.

use crate::error::{Result, WatchError};
use image::RgbImage;
use tracing::{error, info, warn};

/// Destination for recorded frames: open, append in order, close to finalize.
pub trait VideoSink {
    fn open(&mut self, fps: f64, width: u32, height: u32) -> Result<()>;
    fn append(&mut self, frame: &RgbImage) -> Result<()>;
    fn close(&mut self) -> Result<()>;
    fn is_open(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recording { frames_written: u32 },
}

/// What the controller did with the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStep {
    /// Not recording; the frame was not forwarded.
    Idle,
    /// Frame appended, session still running.
    Recorded { frames_written: u32 },
    /// Frame appended and the cap was reached; the sink is closed.
    Finished { frames_written: u32 },
    /// The sink failed; the session was dropped.
    Abandoned,
}

pub struct RecordingSessionController<S: VideoSink> {
    sink: S,
    state: SessionState,
    max_frames: u32,
    fps: f64,
}

impl<S: VideoSink> RecordingSessionController<S> {
    pub fn new(sink: S, fps: f64, max_frames: u32) -> Self {
        Self {
            sink,
            state: SessionState::Idle,
            max_frames: max_frames.max(1),
            fps,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, SessionState::Recording { .. })
    }

    pub fn max_frames(&self) -> u32 {
        self.max_frames
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Idle -> Recording. Opens the sink for frames of the given size.
    pub fn start(&mut self, width: u32, height: u32) -> Result<()> {
        if self.is_recording() {
            return Ok(());
        }
        if let Err(err) = self.sink.open(self.fps, width, height) {
            error!(%err, "could not open video sink, staying idle");
            self.close_sink();
            return Err(err);
        }
        self.state = SessionState::Recording { frames_written: 0 };
        info!(width, height, fps = self.fps, max_frames = self.max_frames, "started recording");
        Ok(())
    }

    /// Feeds one frame. Does nothing while idle.
    pub fn record(&mut self, frame: &RgbImage) -> SessionStep {
        let SessionState::Recording { frames_written } = self.state else {
            return SessionStep::Idle;
        };

        if let Err(err) = self.sink.append(frame) {
            error!(%err, frames_written, "video sink failed, abandoning session");
            self.close_sink();
            self.state = SessionState::Idle;
            return SessionStep::Abandoned;
        }

        let frames_written = frames_written + 1;
        if frames_written >= self.max_frames {
            self.state = SessionState::Idle;
            if let Err(err) = self.sink.close() {
                error!(%err, "could not finalize clip");
                return SessionStep::Abandoned;
            }
            info!(frames_written, "stopped recording after one clip");
            return SessionStep::Finished { frames_written };
        }

        self.state = SessionState::Recording { frames_written };
        SessionStep::Recorded { frames_written }
    }

    /// Closes the sink if it is open and returns to idle. Used on quit and on
    /// fatal source errors.
    pub fn release(&mut self) {
        if let SessionState::Recording { frames_written } = self.state {
            warn!(frames_written, "releasing video sink mid-session");
        }
        self.state = SessionState::Idle;
        self.close_sink();
    }

    fn close_sink(&mut self) {
        if self.sink.is_open() {
            if let Err(err) = self.sink.close() {
                error!(%err, "could not close video sink");
            }
        }
    }
}

impl<S: VideoSink> Drop for RecordingSessionController<S> {
    fn drop(&mut self) {
        self.close_sink();
    }
}

/// Keeps every appended frame in memory. Useful for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    open: bool,
    size: Option<(u32, u32)>,
    pub fps: Option<f64>,
    pub frames: Vec<RgbImage>,
    pub opened: u32,
    pub closed: u32,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VideoSink for MemorySink {
    fn open(&mut self, fps: f64, width: u32, height: u32) -> Result<()> {
        self.open = true;
        self.size = Some((width, height));
        self.fps = Some(fps);
        self.opened += 1;
        Ok(())
    }

    fn append(&mut self, frame: &RgbImage) -> Result<()> {
        if !self.open {
            return Err(WatchError::Sink("append on a closed sink".into()));
        }
        if let Some(expected) = self.size {
            if frame.dimensions() != expected {
                return Err(WatchError::FrameSize {
                    expected,
                    actual: frame.dimensions(),
                });
            }
        }
        self.frames.push(frame.clone());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.open = false;
        self.closed += 1;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSink {
        open: bool,
        fail_open: bool,
        fail_after: usize,
        appended: usize,
        closed: u32,
    }

    impl VideoSink for FailingSink {
        fn open(&mut self, _fps: f64, _width: u32, _height: u32) -> Result<()> {
            if self.fail_open {
                return Err(WatchError::Sink("no codec".into()));
            }
            self.open = true;
            Ok(())
        }

        fn append(&mut self, _frame: &RgbImage) -> Result<()> {
            if self.appended >= self.fail_after {
                return Err(WatchError::Sink("disk full".into()));
            }
            self.appended += 1;
            Ok(())
        }

        fn close(&mut self) -> Result<()> {
            self.open = false;
            self.closed += 1;
            Ok(())
        }

        fn is_open(&self) -> bool {
            self.open
        }
    }

    #[test]
    fn idle_controller_forwards_nothing() {
        let mut controller = RecordingSessionController::new(MemorySink::new(), 15.0, 3);
        assert_eq!(controller.record(&RgbImage::new(2, 2)), SessionStep::Idle);
        assert!(controller.sink().frames.is_empty());
        assert_eq!(controller.sink().opened, 0);
    }

    #[test]
    fn session_stops_exactly_at_the_cap() {
        let mut controller = RecordingSessionController::new(MemorySink::new(), 15.0, 3);
        controller.start(2, 2).unwrap();
        let frame = RgbImage::new(2, 2);

        assert_eq!(controller.record(&frame), SessionStep::Recorded { frames_written: 1 });
        assert_eq!(controller.record(&frame), SessionStep::Recorded { frames_written: 2 });
        assert_eq!(controller.record(&frame), SessionStep::Finished { frames_written: 3 });
        assert_eq!(controller.state(), SessionState::Idle);
        assert_eq!(controller.record(&frame), SessionStep::Idle);

        let sink = controller.sink();
        assert_eq!(sink.frames.len(), 3);
        assert_eq!(sink.closed, 1);
        assert_eq!(sink.fps, Some(15.0));
        assert!(!sink.is_open());
    }

    #[test]
    fn a_new_session_starts_counting_from_zero() {
        let mut controller = RecordingSessionController::new(MemorySink::new(), 15.0, 2);
        let frame = RgbImage::new(1, 1);
        controller.start(1, 1).unwrap();
        controller.record(&frame);
        controller.record(&frame);

        controller.start(1, 1).unwrap();
        assert_eq!(controller.state(), SessionState::Recording { frames_written: 0 });
        assert_eq!(controller.record(&frame), SessionStep::Recorded { frames_written: 1 });
        assert_eq!(controller.sink().opened, 2);
    }

    #[test]
    fn append_failure_abandons_the_session() {
        let sink = FailingSink {
            open: false,
            fail_open: false,
            fail_after: 1,
            appended: 0,
            closed: 0,
        };
        let mut controller = RecordingSessionController::new(sink, 15.0, 10);
        controller.start(1, 1).unwrap();
        let frame = RgbImage::new(1, 1);
        assert_eq!(controller.record(&frame), SessionStep::Recorded { frames_written: 1 });
        assert_eq!(controller.record(&frame), SessionStep::Abandoned);
        assert!(!controller.is_recording());
        assert!(!controller.sink().is_open());
        assert_eq!(controller.sink().closed, 1);
    }

    #[test]
    fn open_failure_leaves_the_controller_idle() {
        let sink = FailingSink {
            open: false,
            fail_open: true,
            fail_after: 0,
            appended: 0,
            closed: 0,
        };
        let mut controller = RecordingSessionController::new(sink, 15.0, 10);
        assert!(matches!(controller.start(1, 1), Err(WatchError::Sink(_))));
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[test]
    fn release_closes_an_open_sink() {
        let mut controller = RecordingSessionController::new(MemorySink::new(), 15.0, 10);
        controller.start(1, 1).unwrap();
        controller.record(&RgbImage::new(1, 1));
        controller.release();
        assert!(!controller.is_recording());
        assert_eq!(controller.sink().closed, 1);

        // Releasing again is harmless.
        controller.release();
        assert_eq!(controller.sink().closed, 1);
    }

    #[test]
    fn mismatched_frame_size_is_a_sink_failure() {
        let mut controller = RecordingSessionController::new(MemorySink::new(), 15.0, 10);
        controller.start(4, 4).unwrap();
        assert_eq!(controller.record(&RgbImage::new(2, 2)), SessionStep::Abandoned);
        assert!(controller.sink().frames.is_empty());
    }
}
