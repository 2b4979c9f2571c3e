use thiserror::Error;

/// Everything that can go wrong between the frame source and the video sink.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The frame source returned an empty frame. Fatal for the whole process.
    #[error("frame source disconnected")]
    SourceDisconnected,

    #[error("frame source error: {0}")]
    Source(String),

    #[error("video sink error: {0}")]
    Sink(String),

    #[error("frame is {actual:?}, sink was opened for {expected:?}")]
    FrameSize {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, WatchError>;
