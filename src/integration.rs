//! Integration module for driving the tracker from external collaborators.
//!
//! Frames come from a [`FrameSource`], motion fields from a
//! [`MotionFieldProvider`], and finished trajectories go to a
//! [`TrajectorySink`]. [`TrajectoryPipeline`] ties them to a
//! [`DenseTracker`](crate::tracker::DenseTracker).

mod builder;
mod flow;
mod observer;
mod pipeline;
mod sink;
mod source;

pub use builder::PipelineBuilder;
pub use flow::{MotionFieldProvider, UniformMotion};
pub use observer::TrackObserver;
pub use pipeline::{RunSummary, TrajectoryPipeline};
pub use sink::{JsonLinesSink, TrajectorySink};
pub use source::{FrameSource, IterFrames, gray_frame};
