// THEORY:
// The `pipeline` module is the top-level API of the engine. It wires the layers into
// the per-frame flow
//
//     frame -> mask per color -> opening -> centroid -> decision -> session -> sink
//
// and owns the per-cycle state. A `WatchPipeline` is built once from the config and
// holds what never changes (the decision engine, the clip length). Each operator
// "begin" produces a `DetectionCycle`, a fresh context with empty centroid memory,
// an elapsed quiet timer and an idle recorder. Nothing survives from one cycle to
// the next except the sink value itself, which the caller hands in.
//
// Execution is single-threaded and blocking: one frame is pulled, fully processed
// and dispatched before the next is requested.

use crate::config::WatchConfig;
use crate::core_modules::motion_decision::{
    Decision, MotionDecisionEngine, MotionEvent, TrackedCentroids,
};
use crate::core_modules::quiet_period::QuietPeriodTimer;
use crate::core_modules::recording_session::{
    RecordingSessionController, SessionState, SessionStep, VideoSink,
};
use crate::error::{Result, WatchError};
use crate::throughput::ThroughputMeter;
use image::RgbImage;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

// Re-export key data structures for the public API.
pub use crate::core_modules::centroid::Point;
pub use crate::core_modules::recording_session::MemorySink;

/// Pulls frames on demand. `Ok(None)` means the source has gone away.
pub trait FrameSource {
    fn read_frame(&mut self) -> Result<Option<RgbImage>>;
}

/// Polled once per processed frame; `true` ends the cycle and the process.
pub trait QuitSignal {
    fn should_quit(&mut self) -> bool;
}

impl<F: FnMut() -> bool> QuitSignal for F {
    fn should_quit(&mut self) -> bool {
        self()
    }
}

/// What happened to one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// A detection attempt ran on this frame.
    pub attempted: bool,
    pub motion: Option<MotionEvent>,
    pub session: SessionStep,
}

/// Why a cycle returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleEnd {
    /// One clip was recorded in full.
    ClipComplete { frames_written: u32 },
    /// The quit signal fired.
    Quit,
}

/// Configuration-derived, immutable parts of the engine.
#[derive(Debug, Clone)]
pub struct WatchPipeline {
    engine: MotionDecisionEngine,
    quiet_period: Duration,
    write_fps: f64,
    max_recording_frames: u32,
}

impl WatchPipeline {
    pub fn new(config: &WatchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            engine: MotionDecisionEngine::from_config(config),
            quiet_period: config.quiet_period(),
            write_fps: config.write_fps,
            max_recording_frames: config.max_recording_frames(),
        })
    }

    pub fn max_recording_frames(&self) -> u32 {
        self.max_recording_frames
    }

    /// Starts a cycle with all per-cycle state reset.
    pub fn begin_cycle<S: VideoSink>(&self, sink: S) -> DetectionCycle<'_, S> {
        DetectionCycle {
            engine: &self.engine,
            tracked: self.engine.new_tracking_state(),
            quiet_timer: QuietPeriodTimer::new(self.quiet_period),
            recorder: RecordingSessionController::new(
                sink,
                self.write_fps,
                self.max_recording_frames,
            ),
            throughput: ThroughputMeter::default(),
        }
    }
}

/// One detection/recording cycle.
pub struct DetectionCycle<'p, S: VideoSink> {
    engine: &'p MotionDecisionEngine,
    tracked: TrackedCentroids,
    quiet_timer: QuietPeriodTimer,
    recorder: RecordingSessionController<S>,
    throughput: ThroughputMeter,
}

impl<'p, S: VideoSink> DetectionCycle<'p, S> {
    pub fn tracked(&self) -> &TrackedCentroids {
        &self.tracked
    }

    pub fn session_state(&self) -> SessionState {
        self.recorder.state()
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    pub fn sink(&self) -> &S {
        self.recorder.sink()
    }

    /// Processes one frame observed at `now`: a detection attempt when idle and the
    /// quiet period is over, then the recording step.
    pub fn process_frame(&mut self, frame: &RgbImage, now: Instant) -> FrameReport {
        let mut report = FrameReport {
            attempted: false,
            motion: None,
            session: SessionStep::Idle,
        };

        if !self.recorder.is_recording() && self.quiet_timer.is_elapsed(now) {
            report.attempted = true;
            match self.engine.evaluate(frame, &mut self.tracked) {
                Decision::Motion(event) => {
                    info!(
                        color = %event.color_name,
                        displacement = event.displacement,
                        from = ?event.previous,
                        to = ?event.current,
                        "motion detected"
                    );
                    let (width, height) = frame.dimensions();
                    if self.recorder.start(width, height).is_err() {
                        report.session = SessionStep::Abandoned;
                    }
                    report.motion = Some(event);
                }
                Decision::NoMotion => {
                    debug!(
                        positions = ?self.tracked.positions().collect::<Vec<_>>(),
                        "no motion, waiting out the quiet period"
                    );
                    self.quiet_timer.mark_quiet(now);
                }
            }
        }

        if self.recorder.is_recording() {
            report.session = self.recorder.record(frame);
        }

        // A dropped session counts as one attempt, so a broken sink is not
        // reopened on every frame.
        if report.session == SessionStep::Abandoned {
            self.quiet_timer.mark_quiet(now);
        }

        report
    }

    /// Runs until a clip completes, the quit signal fires or the source fails.
    pub fn run<F, Q>(&mut self, source: &mut F, quit: &mut Q) -> Result<CycleEnd>
    where
        F: FrameSource,
        Q: QuitSignal,
    {
        self.run_with_clock(source, quit, Instant::now)
    }

    /// `run` with an injectable clock.
    pub fn run_with_clock<F, Q, C>(
        &mut self,
        source: &mut F,
        quit: &mut Q,
        mut clock: C,
    ) -> Result<CycleEnd>
    where
        F: FrameSource,
        Q: QuitSignal,
        C: FnMut() -> Instant,
    {
        loop {
            let frame = match source.read_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    error!("camera disconnected");
                    self.recorder.release();
                    return Err(WatchError::SourceDisconnected);
                }
                Err(err) => {
                    error!(%err, "could not read a frame");
                    self.recorder.release();
                    return Err(err);
                }
            };

            let now = clock();
            if let Some(sample) = self.throughput.tick(now) {
                debug!(
                    "{} frames in {:.3} seconds = {:.2} FPS",
                    sample.frames, sample.seconds, sample.fps
                );
            }

            let report = self.process_frame(&frame, now);
            if let SessionStep::Finished { frames_written } = report.session {
                return Ok(CycleEnd::ClipComplete { frames_written });
            }

            if quit.should_quit() {
                info!("quit requested");
                self.recorder.release();
                return Ok(CycleEnd::Quit);
            }
        }
    }
}
