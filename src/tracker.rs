mod dense_tracker;
pub mod image;
mod integral_histogram;
mod motion;
mod pyramid;
mod rect;
mod sampler;
mod track;
mod track_state;
mod trajectory;

pub use dense_tracker::{DenseTracker, FrameReport, ScaleReport, TrackerConfig};
pub use integral_histogram::{DescriptorConfig, IntegralHistogram, Normalization};
pub use motion::MotionField;
pub use pyramid::{FramePyramid, PyramidPair, Scale, build_scales, usable_scale_count};
pub use rect::Rect;
pub use sampler::{DenseSampler, SamplerConfig, min_eigen_map};
pub use track::{Track, TrackSet};
pub use track_state::TrackState;
pub use trajectory::{ShapeFilter, ShapeStats, Trajectory};
