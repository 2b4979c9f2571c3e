// THEORY:
// This file is the entry point for the `chroma_watch` library crate. It exposes the
// motion-decision engine that watches a live feed for colored objects and decides
// when a clip is worth recording.
//
// The public surface is deliberately small: `WatchConfig` to describe the setup,
// `WatchPipeline` / `DetectionCycle` to drive it frame by frame, and the
// `FrameSource` / `VideoSink` traits the caller implements for real hardware. The
// layered internals (`core_modules`) are public for testing and reuse but are not
// needed to run the engine.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod pipeline;
pub mod throughput;

pub use config::WatchConfig;
pub use error::{Result, WatchError};
pub use pipeline::{CycleEnd, DetectionCycle, FrameReport, FrameSource, QuitSignal, WatchPipeline};
