//! Builder for assembling a TrajectoryPipeline.

use crate::error::ConfigError;
use crate::tracker::{DenseTracker, TrackerConfig};

use super::{FrameSource, MotionFieldProvider, TrackObserver, TrajectoryPipeline, TrajectorySink};

/// Builder for `TrajectoryPipeline`.
pub struct PipelineBuilder<S, P, K> {
    source: S,
    provider: P,
    sink: K,
    config: TrackerConfig,
    start_frame: usize,
    end_frame: Option<usize>,
    observer: Option<Box<dyn TrackObserver>>,
}

impl<S, P, K> PipelineBuilder<S, P, K>
where
    S: FrameSource,
    P: MotionFieldProvider,
    K: TrajectorySink,
{
    /// Create a new builder with the default tracker configuration.
    pub fn new(source: S, provider: P, sink: K) -> Self {
        Self {
            source,
            provider,
            sink,
            config: TrackerConfig::default(),
            start_frame: 0,
            end_frame: None,
            observer: None,
        }
    }

    /// Set the tracker configuration.
    pub fn config(mut self, config: TrackerConfig) -> Self {
        self.config = config;
        self
    }

    /// First frame to process. Earlier frames are read and dropped.
    pub fn start_frame(mut self, start: usize) -> Self {
        self.start_frame = start;
        self
    }

    /// Last frame to process, inclusive.
    pub fn end_frame(mut self, end: usize) -> Self {
        self.end_frame = Some(end);
        self
    }

    /// Process frames `start..=end` only.
    pub fn frame_range(self, start: usize, end: usize) -> Self {
        self.start_frame(start).end_frame(end)
    }

    /// Receive the live base-scale paths after every frame.
    pub fn observer<O>(mut self, observer: O) -> Self
    where
        O: TrackObserver + 'static,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Build the final `TrajectoryPipeline`.
    pub fn build(self) -> Result<TrajectoryPipeline<S, P, K>, ConfigError> {
        if let Some(end) = self.end_frame {
            if self.start_frame > end {
                return Err(ConfigError::InvalidFrameRange {
                    start: self.start_frame,
                    end,
                });
            }
        }
        let tracker = DenseTracker::new(self.config)?;
        Ok(TrajectoryPipeline::from_parts(
            self.source,
            self.provider,
            self.sink,
            tracker,
            self.start_frame,
            self.end_frame,
            self.observer,
        ))
    }
}
