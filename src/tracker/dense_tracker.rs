//! Multi-scale dense trajectory tracker.
//!
//! Each scale keeps its own track set. Per frame, every track is pushed along
//! the scale's motion field, described by the motion histogram around its
//! previous position, and emitted once it reaches the trajectory length.
//! New points are sampled every `gap` frames.

use nalgebra::Point2;
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};

use crate::error::{ConfigError, TrackError};
use crate::tracker::integral_histogram::{DescriptorConfig, IntegralHistogram};
use crate::tracker::motion::MotionField;
use crate::tracker::pyramid::{FramePyramid, Scale, build_scales, usable_scale_count};
use crate::tracker::rect::Rect;
use crate::tracker::sampler::{DenseSampler, SamplerConfig};
use crate::tracker::track::{Track, TrackSet};
use crate::tracker::trajectory::{ShapeFilter, Trajectory};

/// Configuration for the DenseTracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Steps a track takes before it is emitted
    pub trajectory_length: usize,
    /// Frames between two resampling passes
    pub gap: usize,
    pub scale_count: usize,
    /// Size ratio between consecutive scales
    pub scale_ratio: f32,
    /// Drop scales whose short side falls below the descriptor patch
    pub clamp_scales_to_patch: bool,
    pub sampler: SamplerConfig,
    pub descriptor: DescriptorConfig,
    /// Attach shape statistics to emitted trajectories
    pub include_shape_stats: bool,
    /// Reject trajectories with implausible shapes before emission
    pub shape_filter: Option<ShapeFilter>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            trajectory_length: 15,
            gap: 15,
            scale_count: 8,
            scale_ratio: std::f32::consts::FRAC_1_SQRT_2,
            clamp_scales_to_patch: false,
            sampler: SamplerConfig::default(),
            descriptor: DescriptorConfig::default(),
            include_shape_stats: false,
            shape_filter: None,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trajectory_length == 0 {
            return Err(ConfigError::InvalidTrajectoryLength);
        }
        if self.gap == 0 {
            return Err(ConfigError::InvalidGap);
        }
        if self.scale_count == 0 {
            return Err(ConfigError::InvalidScaleCount(self.scale_count));
        }
        if !self.scale_ratio.is_finite() || self.scale_ratio <= 0.0 {
            return Err(ConfigError::InvalidScaleRatio(self.scale_ratio));
        }
        self.sampler.validate()?;
        self.descriptor.validate()
    }
}

/// What happened on one scale during a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScaleReport {
    pub scale: usize,
    /// Tracks extended by one step
    pub advanced: usize,
    /// Tracks dropped after leaving the frame
    pub discarded: usize,
    /// Trajectories emitted
    pub completed: usize,
    /// Complete tracks rejected by the shape filter
    pub filtered: usize,
    /// Tracks created by resampling
    pub spawned: usize,
}

/// Result of processing one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame: usize,
    pub resampled: bool,
    pub scales: Vec<ScaleReport>,
    /// Emitted trajectories, scale by scale in track order
    pub trajectories: Vec<Trajectory>,
}

pub struct DenseTracker {
    config: TrackerConfig,
    sampler: DenseSampler,
    scales: Vec<Scale>,
    tracks: Vec<TrackSet>,
    frame_index: usize,
    frames_since_resample: usize,
}

impl DenseTracker {
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            sampler: DenseSampler::new(config.sampler),
            config,
            scales: Vec::new(),
            tracks: Vec::new(),
            frame_index: 0,
            frames_since_resample: 0,
        })
    }

    /// Scales used for a `width x height` base frame.
    pub fn plan_scales(&self, width: usize, height: usize) -> Result<Vec<Scale>, ConfigError> {
        let mut count = self.config.scale_count;
        if self.config.clamp_scales_to_patch {
            let usable = usable_scale_count(
                width,
                height,
                self.config.scale_ratio,
                self.config.descriptor.patch_size,
            );
            count = count.min(usable);
        }
        build_scales(width, height, self.config.scale_ratio, count)
    }

    /// Start tracking on `frame`, numbered 0.
    pub fn initialize(&mut self, frame: ArrayView2<'_, u8>) -> Result<FramePyramid, TrackError> {
        self.initialize_at(frame, 0)
    }

    /// Start tracking on `frame`, which carries index `frame_index` in the
    /// input sequence. Any previous state is dropped.
    ///
    /// Returns the frame's pyramid, to be used as the previous frame of the
    /// first `step`.
    pub fn initialize_at(
        &mut self,
        frame: ArrayView2<'_, u8>,
        frame_index: usize,
    ) -> Result<FramePyramid, TrackError> {
        let (height, width) = frame.dim();
        self.scales = self.plan_scales(width, height)?;
        self.frame_index = frame_index;
        self.frames_since_resample = 0;

        let pyramid = FramePyramid::build(frame, &self.scales);
        let descriptor_len = self.config.descriptor.sample_len();
        let mut seeded = 0;

        self.tracks = Vec::with_capacity(self.scales.len());
        for (scale, image) in self.scales.iter().zip(pyramid.levels()) {
            let mut set = TrackSet::new();
            for point in self.sampler.sample(image.view(), &[]) {
                set.push(Track::new(
                    point,
                    self.config.trajectory_length,
                    descriptor_len,
                    frame_index,
                ));
            }
            debug!(scale = scale.index, width = scale.width, height = scale.height, tracks = set.len(), "scale initialized");
            seeded += set.len();
            self.tracks.push(set);
        }

        info!(
            frame = frame_index,
            width,
            height,
            scales = self.scales.len(),
            tracks = seeded,
            "tracker initialized"
        );
        Ok(pyramid)
    }

    /// Advance every scale by one frame.
    ///
    /// `current` is the pyramid of the new frame and `fields` holds one motion
    /// field per scale, describing motion from the previous frame to
    /// `current`. All inputs are checked before any track is touched.
    #[instrument(level = "trace", skip_all, fields(frame = self.frame_index + 1))]
    pub fn step(
        &mut self,
        current: &FramePyramid,
        fields: &[MotionField],
    ) -> Result<FrameReport, TrackError> {
        if self.scales.is_empty() {
            return Err(TrackError::NotInitialized);
        }
        let frame = self.frame_index + 1;
        self.check_inputs(frame, current, fields)?;

        self.frame_index = frame;
        self.frames_since_resample += 1;
        let resampled = self.frames_since_resample >= self.config.gap;

        let Self {
            config,
            sampler,
            scales,
            tracks,
            ..
        } = self;

        let mut reports = Vec::with_capacity(scales.len());
        let mut trajectories = Vec::new();

        for ((scale, set), (field, image)) in scales
            .iter()
            .zip(tracks.iter_mut())
            .zip(fields.iter().zip(current.levels()))
        {
            let mut report = ScaleReport {
                scale: scale.index,
                ..ScaleReport::default()
            };

            let histogram = IntegralHistogram::from_motion(field, &config.descriptor);
            for track in set.iter_mut() {
                let previous = track.current_point();
                let next = previous + field.sample_clamped(&previous);
                if !scale.contains_open(&next) {
                    track.mark_discarded();
                    report.discarded += 1;
                    continue;
                }

                let window = Rect::around(
                    &previous,
                    config.descriptor.patch_size,
                    scale.width,
                    scale.height,
                );
                let sample = histogram.descriptor(&window, &config.descriptor);
                track.advance(next, sample.view())?;
                report.advanced += 1;
            }
            drop(histogram);

            for track in set.compact() {
                let mut trajectory = track.finalize(scale);
                let stats = trajectory.shape_stats();
                if let Some(filter) = &config.shape_filter {
                    if !filter.accepts(&stats) {
                        trace!(scale = scale.index, ?stats, "trajectory rejected by shape filter");
                        report.filtered += 1;
                        continue;
                    }
                }
                if config.include_shape_stats {
                    trajectory.stats = Some(stats);
                }
                trajectories.push(trajectory);
                report.completed += 1;
            }

            if resampled {
                let occupied = set.current_points();
                let descriptor_len = config.descriptor.sample_len();
                for point in sampler.sample(image.view(), &occupied) {
                    set.push(Track::new(
                        point,
                        config.trajectory_length,
                        descriptor_len,
                        frame,
                    ));
                    report.spawned += 1;
                }
            }

            debug!(
                scale = report.scale,
                advanced = report.advanced,
                discarded = report.discarded,
                completed = report.completed,
                filtered = report.filtered,
                spawned = report.spawned,
                live = set.len(),
                "scale updated"
            );
            reports.push(report);
        }

        if resampled {
            self.frames_since_resample = 0;
        }

        Ok(FrameReport {
            frame,
            resampled,
            scales: reports,
            trajectories,
        })
    }

    fn check_inputs(
        &self,
        frame: usize,
        current: &FramePyramid,
        fields: &[MotionField],
    ) -> Result<(), TrackError> {
        if current.len() != self.scales.len() {
            return Err(TrackError::PyramidDepthMismatch {
                frame,
                expected: self.scales.len(),
                got: current.len(),
            });
        }
        if fields.len() != self.scales.len() {
            return Err(TrackError::FlowPyramidMismatch {
                frame,
                expected: self.scales.len(),
                got: fields.len(),
            });
        }

        for ((scale, image), field) in self.scales.iter().zip(current.levels()).zip(fields) {
            let expected = (scale.width, scale.height);
            let (h, w) = image.dim();
            if (w, h) != expected {
                return Err(TrackError::FrameSizeMismatch {
                    frame,
                    scale: scale.index,
                    expected,
                    got: (w, h),
                });
            }
            if field.is_empty() {
                return Err(TrackError::EmptyMotionField {
                    frame,
                    scale: scale.index,
                });
            }
            if field.dim() != expected {
                return Err(TrackError::FlowSizeMismatch {
                    frame,
                    scale: scale.index,
                    expected,
                    got: field.dim(),
                });
            }
        }
        Ok(())
    }

    /// Start tracks at caller-chosen points of one scale, in scale-local
    /// coordinates. Returns the number of tracks added.
    pub fn seed_points(&mut self, scale: usize, points: &[Point2<f32>]) -> Result<usize, TrackError> {
        if self.scales.is_empty() {
            return Err(TrackError::NotInitialized);
        }
        let Some(level) = self.scales.get(scale) else {
            return Err(TrackError::UnknownScale {
                scale,
                count: self.scales.len(),
            });
        };
        if let Some(p) = points.iter().find(|p| !level.contains(p)) {
            return Err(TrackError::SeedOutOfBounds {
                scale,
                x: p.x,
                y: p.y,
            });
        }

        let descriptor_len = self.config.descriptor.sample_len();
        let set = &mut self.tracks[scale];
        for point in points {
            set.push(Track::new(
                *point,
                self.config.trajectory_length,
                descriptor_len,
                self.frame_index,
            ));
        }
        Ok(points.len())
    }

    pub fn tracks(&self, scale: usize) -> Option<&TrackSet> {
        self.tracks.get(scale)
    }

    /// Paths of the live tracks of `scale`, in base-frame coordinates.
    pub fn active_paths(&self, scale: usize) -> Vec<Vec<Point2<f32>>> {
        let (Some(level), Some(set)) = (self.scales.get(scale), self.tracks.get(scale)) else {
            return Vec::new();
        };
        set.iter()
            .map(|t| t.path().iter().map(|p| level.to_base(p)).collect())
            .collect()
    }

    pub fn live_track_count(&self) -> usize {
        self.tracks.iter().map(TrackSet::len).sum()
    }

    pub fn scales(&self) -> &[Scale] {
        &self.scales
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Index of the last processed frame.
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn textured(w: usize, h: usize) -> Array2<u8> {
        Array2::from_shape_fn((h, w), |(y, x)| ((x * 37 + y * 91 + (x * y) % 13 * 17) % 256) as u8)
    }

    fn small_config() -> TrackerConfig {
        TrackerConfig {
            trajectory_length: 3,
            gap: 100,
            scale_count: 1,
            scale_ratio: 0.5,
            ..TrackerConfig::default()
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = TrackerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.gap, config.trajectory_length);
        assert_eq!(config.descriptor.sample_len(), 36);
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let cases = [
            (
                TrackerConfig {
                    trajectory_length: 0,
                    ..TrackerConfig::default()
                },
                ConfigError::InvalidTrajectoryLength,
            ),
            (
                TrackerConfig {
                    gap: 0,
                    ..TrackerConfig::default()
                },
                ConfigError::InvalidGap,
            ),
            (
                TrackerConfig {
                    scale_count: 0,
                    ..TrackerConfig::default()
                },
                ConfigError::InvalidScaleCount(0),
            ),
            (
                TrackerConfig {
                    scale_ratio: -0.5,
                    ..TrackerConfig::default()
                },
                ConfigError::InvalidScaleRatio(-0.5),
            ),
        ];
        for (config, expected) in cases {
            assert_eq!(DenseTracker::new(config).err(), Some(expected));
        }
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: TrackerConfig =
            serde_json::from_str(r#"{"trajectory_length": 10, "sampler": {"min_distance": 8}}"#).unwrap();
        assert_eq!(config.trajectory_length, 10);
        assert_eq!(config.sampler.min_distance, 8);
        assert_eq!(config.sampler.quality, 0.001);
        assert_eq!(config.scale_count, 8);
    }

    #[test]
    fn test_scale_clamping_by_patch() {
        let mut config = TrackerConfig {
            scale_ratio: 0.5,
            ..TrackerConfig::default()
        };
        let tracker = DenseTracker::new(config.clone()).unwrap();
        assert_eq!(tracker.plan_scales(100, 80).unwrap().len(), 8);

        config.clamp_scales_to_patch = true;
        let tracker = DenseTracker::new(config).unwrap();
        // 80 -> 40 -> 20: two levels keep a 32px short side.
        assert_eq!(tracker.plan_scales(100, 80).unwrap().len(), 2);
    }

    #[test]
    fn test_step_before_initialize() {
        let mut tracker = DenseTracker::new(small_config()).unwrap();
        let err = tracker.step(&FramePyramid::empty(), &[]);
        assert_eq!(err, Err(TrackError::NotInitialized));
    }

    #[test]
    fn test_mismatched_inputs_are_fatal() {
        let mut tracker = DenseTracker::new(small_config()).unwrap();
        let frame = textured(40, 30);
        let pyramid = tracker.initialize(frame.view()).unwrap();
        let live = tracker.live_track_count();
        assert!(live > 0);

        let err = tracker.step(&pyramid, &[]);
        assert!(matches!(err, Err(TrackError::FlowPyramidMismatch { frame: 1, .. })));

        let err = tracker.step(&pyramid, &[MotionField::zeros(20, 30)]);
        assert!(matches!(
            err,
            Err(TrackError::FlowSizeMismatch {
                frame: 1,
                scale: 0,
                expected: (40, 30),
                got: (20, 30),
            })
        ));

        let err = tracker.step(&pyramid, &[MotionField::zeros(0, 0)]);
        assert!(matches!(err, Err(TrackError::EmptyMotionField { .. })));

        // Nothing changed.
        assert_eq!(tracker.frame_index(), 0);
        assert_eq!(tracker.live_track_count(), live);
    }

    #[test]
    fn test_tracks_complete_after_length_steps() {
        let mut tracker = DenseTracker::new(small_config()).unwrap();
        let frame = textured(40, 30);
        let pyramid = tracker.initialize(frame.view()).unwrap();
        let seeded = tracker.live_track_count();
        let field = [MotionField::zeros(40, 30)];

        for _ in 0..2 {
            let report = tracker.step(&pyramid, &field).unwrap();
            assert!(report.trajectories.is_empty());
            assert_eq!(report.scales[0].advanced, seeded);
        }
        let report = tracker.step(&pyramid, &field).unwrap();
        assert_eq!(report.frame, 3);
        assert_eq!(report.trajectories.len(), seeded);
        assert_eq!(tracker.live_track_count(), 0);
        for traj in &report.trajectories {
            assert_eq!(traj.path.len(), 4);
            assert_eq!(traj.descriptor.dim(), (3, 36));
            assert_eq!((traj.start_frame, traj.end_frame), (0, 3));
            assert!(traj.stats.is_none());
        }
    }

    #[test]
    fn test_shape_filter_and_stats() {
        let config = TrackerConfig {
            include_shape_stats: true,
            ..small_config()
        };
        let mut tracker = DenseTracker::new(config).unwrap();
        let frame = textured(40, 30);
        let pyramid = tracker.initialize(frame.view()).unwrap();
        let field = [MotionField::zeros(40, 30)];
        let mut emitted = Vec::new();
        for _ in 0..3 {
            emitted.extend(tracker.step(&pyramid, &field).unwrap().trajectories);
        }
        assert!(!emitted.is_empty());
        assert!(emitted.iter().all(|t| t.stats.is_some()));

        // Static trajectories are all rejected once the filter is on.
        let config = TrackerConfig {
            shape_filter: Some(ShapeFilter::default()),
            ..small_config()
        };
        let mut tracker = DenseTracker::new(config).unwrap();
        let pyramid = tracker.initialize(frame.view()).unwrap();
        let seeded = tracker.live_track_count();
        let mut filtered = 0;
        for _ in 0..3 {
            let report = tracker.step(&pyramid, &field).unwrap();
            assert!(report.trajectories.is_empty());
            filtered += report.scales[0].filtered;
        }
        assert_eq!(filtered, seeded);
    }

    #[test]
    fn test_seed_points_validation() {
        let mut tracker = DenseTracker::new(small_config()).unwrap();
        assert_eq!(
            tracker.seed_points(0, &[Point2::new(1.0, 1.0)]),
            Err(TrackError::NotInitialized)
        );

        let frame = Array2::from_elem((30, 40), 50u8);
        tracker.initialize(frame.view()).unwrap();
        assert_eq!(tracker.live_track_count(), 0);

        assert_eq!(
            tracker.seed_points(3, &[Point2::new(1.0, 1.0)]),
            Err(TrackError::UnknownScale { scale: 3, count: 1 })
        );
        assert!(matches!(
            tracker.seed_points(0, &[Point2::new(40.0, 1.0)]),
            Err(TrackError::SeedOutOfBounds { scale: 0, .. })
        ));
        assert_eq!(tracker.seed_points(0, &[Point2::new(39.5, 29.0)]), Ok(1));
        assert_eq!(tracker.active_paths(0), vec![vec![Point2::new(39.5, 29.0)]]);
    }
}
