//! Error types for configuration, tracking and the frame pipeline.

use thiserror::Error;

use crate::tracker::TrackState;

/// Boxed error returned by external collaborators (frame sources, motion
/// field providers, trajectory sinks).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Invalid configuration. Raised at construction time only.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("scale count must be at least 1, got {0}")]
    InvalidScaleCount(usize),
    #[error("scale ratio must be finite and positive, got {0}")]
    InvalidScaleRatio(f32),
    #[error("trajectory length must be at least 1")]
    InvalidTrajectoryLength,
    #[error("resample gap must be at least 1")]
    InvalidGap,
    #[error("descriptor needs at least {min} bins, got {got}")]
    InvalidBinCount { min: usize, got: usize },
    #[error("descriptor cell grid must be non-zero, got {nx}x{ny}x{nt}")]
    InvalidCellGrid { nx: usize, ny: usize, nt: usize },
    #[error("patch size {patch_size} cannot be split into {nx}x{ny} cells")]
    InvalidPatchSize { patch_size: usize, nx: usize, ny: usize },
    #[error("sampler minimum distance must be at least 1")]
    InvalidMinDistance,
    #[error("sampler quality must lie in [0, 1), got {0}")]
    InvalidQuality(f32),
    #[error("frame range is empty: start {start} > end {end}")]
    InvalidFrameRange { start: usize, end: usize },
    #[error("base frame must be non-empty, got {width}x{height}")]
    EmptyFrame { width: usize, height: usize },
}

/// Errors raised by the tracker engine.
///
/// Tracks drifting out of the frame are not errors; they are dropped as part
/// of normal control flow.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("tracker has not been initialized with a first frame")]
    NotInitialized,
    #[error("frame {frame}: expected {expected} pyramid levels, got {got}")]
    PyramidDepthMismatch {
        frame: usize,
        expected: usize,
        got: usize,
    },
    #[error("frame {frame}, scale {scale}: expected {expected:?} (w, h), got {got:?}")]
    FrameSizeMismatch {
        frame: usize,
        scale: usize,
        expected: (usize, usize),
        got: (usize, usize),
    },
    #[error("frame {frame}: expected {expected} motion fields, got {got}")]
    FlowPyramidMismatch {
        frame: usize,
        expected: usize,
        got: usize,
    },
    #[error("frame {frame}, scale {scale}: motion field is {got:?} (w, h), expected {expected:?}")]
    FlowSizeMismatch {
        frame: usize,
        scale: usize,
        expected: (usize, usize),
        got: (usize, usize),
    },
    #[error("frame {frame}, scale {scale}: motion field is empty")]
    EmptyMotionField { frame: usize, scale: usize },
    #[error("scale {scale} does not exist (tracker has {count} scales)")]
    UnknownScale { scale: usize, count: usize },
    #[error("seed point ({x}, {y}) lies outside scale {scale}")]
    SeedOutOfBounds { scale: usize, x: f32, y: f32 },
    #[error("track is {state:?} and cannot advance")]
    InactiveTrack { state: TrackState },
    #[error("track already holds {length} steps and cannot advance")]
    AdvancePastLength { length: usize },
    #[error("descriptor sample has {got} values, track expects {expected}")]
    DescriptorLength { expected: usize, got: usize },
}

/// Errors raised while driving a full frame pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Track(#[from] TrackError),
    #[error("frame {frame}: frame source failed")]
    FrameSource {
        frame: usize,
        #[source]
        source: BoxError,
    },
    #[error("frame {frame}: unsupported frame layout {width}x{height}x{channels}")]
    InvalidFrame {
        frame: usize,
        width: usize,
        height: usize,
        channels: usize,
    },
    #[error("frame {frame}: motion field provider failed")]
    MotionField {
        frame: usize,
        #[source]
        source: BoxError,
    },
    #[error("frame {frame}: trajectory sink failed")]
    Sink {
        frame: usize,
        #[source]
        source: BoxError,
    },
}

/// Errors raised by the bundled JSON-lines trajectory sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write trajectory")]
    Io(#[from] std::io::Error),
    #[error("failed to encode trajectory")]
    Json(#[from] serde_json::Error),
}
