//! Dense multi-scale point trajectories with motion-histogram descriptors.
//!
//! Points are sampled on a grid at every level of a spatial pyramid, pushed
//! along a dense motion field frame after frame, and described by the
//! histogram of flow orientations around them. Once a point has been
//! followed for the configured number of frames its trajectory is emitted.
//!
//! The [`tracker`] module holds the engine. The [`integration`] module wires
//! it to frame sources, motion field providers and trajectory sinks.

pub mod error;
pub mod integration;
pub mod tracker;

pub use error::{ConfigError, PipelineError, SinkError, TrackError};
pub use integration::{
    FrameSource, IterFrames, JsonLinesSink, MotionFieldProvider, PipelineBuilder, RunSummary,
    TrackObserver, TrajectoryPipeline, TrajectorySink, UniformMotion,
};
pub use tracker::{
    DenseTracker, DescriptorConfig, MotionField, SamplerConfig, ShapeFilter, TrackerConfig,
    Trajectory,
};
