//! TrajectoryPipeline for driving the tracker over a frame sequence.

use std::time::Instant;

use ndarray::ArrayView2;
use tracing::{info, trace};

use crate::error::{ConfigError, PipelineError, TrackError};
use crate::tracker::image::to_grayscale;
use crate::tracker::{DenseTracker, PyramidPair, TrackerConfig};

use super::{FrameSource, MotionFieldProvider, PipelineBuilder, TrackObserver, TrajectorySink};

/// Totals of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Frames handed to the tracker, including the first one
    pub frames: usize,
    pub trajectories: usize,
}

/// A frame source, a motion field provider and a trajectory sink bundled
/// with a [`DenseTracker`].
///
/// The first frame in range initializes the tracker; every later frame is
/// converted to grayscale, turned into a pyramid, paired with the previous
/// pyramid for motion estimation and tracked.
pub struct TrajectoryPipeline<S, P, K> {
    source: S,
    provider: P,
    sink: K,
    tracker: DenseTracker,
    pyramids: PyramidPair,
    observer: Option<Box<dyn TrackObserver>>,
    start_frame: usize,
    end_frame: Option<usize>,
    next_index: usize,
    initialized: bool,
    finished: bool,
    frames: usize,
    emitted: usize,
}

impl<S, P, K> TrajectoryPipeline<S, P, K>
where
    S: FrameSource,
    P: MotionFieldProvider,
    K: TrajectorySink,
{
    /// Create a pipeline over every frame of `source`.
    pub fn new(source: S, provider: P, sink: K, config: TrackerConfig) -> Result<Self, ConfigError> {
        PipelineBuilder::new(source, provider, sink).config(config).build()
    }

    /// Start configuring a pipeline.
    pub fn builder(source: S, provider: P, sink: K) -> PipelineBuilder<S, P, K> {
        PipelineBuilder::new(source, provider, sink)
    }

    pub(super) fn from_parts(
        source: S,
        provider: P,
        sink: K,
        tracker: DenseTracker,
        start_frame: usize,
        end_frame: Option<usize>,
        observer: Option<Box<dyn TrackObserver>>,
    ) -> Self {
        Self {
            source,
            provider,
            sink,
            tracker,
            pyramids: PyramidPair::new(),
            observer,
            start_frame,
            end_frame,
            next_index: 0,
            initialized: false,
            finished: false,
            frames: 0,
            emitted: 0,
        }
    }

    /// Read and process the next frame in range.
    ///
    /// Returns `Ok(false)` once the stream or the frame range is exhausted.
    pub fn process_next(&mut self) -> Result<bool, PipelineError> {
        if self.finished {
            return Ok(false);
        }

        loop {
            let index = self.next_index;
            if self.end_frame.is_some_and(|end| index > end) {
                self.finished = true;
                return Ok(false);
            }

            let frame = self
                .source
                .next_frame()
                .map_err(|e| PipelineError::FrameSource {
                    frame: index,
                    source: Box::new(e),
                })?;
            let Some(frame) = frame else {
                self.finished = true;
                return Ok(false);
            };
            self.next_index += 1;

            if index < self.start_frame {
                trace!(frame = index, "skipping frame before range");
                continue;
            }

            let (height, width, channels) = frame.dim();
            let gray = to_grayscale(frame.view()).ok_or(PipelineError::InvalidFrame {
                frame: index,
                width,
                height,
                channels,
            })?;

            if !self.initialized {
                let pyramid = self.tracker.initialize_at(gray.view(), index)?;
                self.pyramids.reset(pyramid);
                self.initialized = true;
            } else {
                self.track_frame(index, gray.view())?;
            }

            self.frames += 1;
            if let Some(observer) = self.observer.as_mut() {
                let paths = self.tracker.active_paths(0);
                observer.observe(index, &paths);
            }
            return Ok(true);
        }
    }

    fn track_frame(&mut self, index: usize, gray: ArrayView2<'_, u8>) -> Result<(), PipelineError> {
        let base = self
            .tracker
            .scales()
            .first()
            .copied()
            .ok_or(TrackError::NotInitialized)?;
        let (height, width) = gray.dim();
        if (width, height) != (base.width, base.height) {
            return Err(TrackError::FrameSizeMismatch {
                frame: index,
                scale: 0,
                expected: (base.width, base.height),
                got: (width, height),
            }
            .into());
        }

        self.pyramids.load_current(gray, self.tracker.scales());
        let fields = self
            .provider
            .motion_fields(self.pyramids.previous(), self.pyramids.current())
            .map_err(|e| PipelineError::MotionField {
                frame: index,
                source: Box::new(e),
            })?;

        let report = self.tracker.step(self.pyramids.current(), &fields)?;
        for trajectory in report.trajectories {
            self.sink.emit(trajectory).map_err(|e| PipelineError::Sink {
                frame: index,
                source: Box::new(e),
            })?;
            self.emitted += 1;
        }
        self.pyramids.swap();
        Ok(())
    }

    /// Process every remaining frame, then flush the sink.
    pub fn run(&mut self) -> Result<RunSummary, PipelineError> {
        let started = Instant::now();
        while self.process_next()? {}

        self.sink.flush().map_err(|e| PipelineError::Sink {
            frame: self.next_index,
            source: Box::new(e),
        })?;

        let summary = self.summary();
        info!(
            frames = summary.frames,
            trajectories = summary.trajectories,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "run finished"
        );
        Ok(summary)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            frames: self.frames,
            trajectories: self.emitted,
        }
    }

    /// Get a reference to the underlying tracker.
    pub fn tracker(&self) -> &DenseTracker {
        &self.tracker
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    pub fn into_sink(self) -> K {
        self.sink
    }
}
