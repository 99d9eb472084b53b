//! Pyramid geometry and double-buffered frame pyramids.
//!
//! Scale 0 is the base resolution. Every further scale shrinks the previous
//! one by the configured ratio, rounding to whole pixels with a 1x1 floor.

use nalgebra::Point2;
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::tracker::image::{GrayImage, resize_bilinear_into};

/// One level of the spatial pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    /// Level index, 0 being the base resolution
    pub index: usize,
    /// Factor mapping scale-local coordinates back to the base frame
    pub downsample_factor: f32,
    /// Level width in pixels
    pub width: usize,
    /// Level height in pixels
    pub height: usize,
}

impl Scale {
    /// Whether `point` lies in `[0, width) x [0, height)`.
    #[inline]
    pub fn contains(&self, point: &Point2<f32>) -> bool {
        point.x >= 0.0
            && point.y >= 0.0
            && point.x < self.width as f32
            && point.y < self.height as f32
    }

    /// Whether `point` lies strictly inside `(0, width) x (0, height)`.
    ///
    /// Advected points failing this test terminate their track.
    #[inline]
    pub fn contains_open(&self, point: &Point2<f32>) -> bool {
        point.x > 0.0
            && point.y > 0.0
            && point.x < self.width as f32
            && point.y < self.height as f32
    }

    /// Map a scale-local point back to base-frame coordinates.
    #[inline]
    pub fn to_base(&self, point: &Point2<f32>) -> Point2<f32> {
        Point2::new(
            point.x * self.downsample_factor,
            point.y * self.downsample_factor,
        )
    }
}

/// Compute `count` scales for a `width x height` base frame.
pub fn build_scales(
    width: usize,
    height: usize,
    ratio: f32,
    count: usize,
) -> Result<Vec<Scale>, ConfigError> {
    if count < 1 {
        return Err(ConfigError::InvalidScaleCount(count));
    }
    if !ratio.is_finite() || ratio <= 0.0 {
        return Err(ConfigError::InvalidScaleRatio(ratio));
    }
    if width == 0 || height == 0 {
        return Err(ConfigError::EmptyFrame { width, height });
    }

    let mut scales = Vec::with_capacity(count);
    let (mut w, mut h) = (width, height);
    for index in 0..count {
        if index > 0 {
            w = ((w as f64 * ratio as f64).round() as usize).max(1);
            h = ((h as f64 * ratio as f64).round() as usize).max(1);
        }
        scales.push(Scale {
            index,
            downsample_factor: 1.0 / ratio.powi(index as i32),
            width: w,
            height: h,
        });
    }
    Ok(scales)
}

/// Number of levels whose short side stays at least `patch_size` pixels.
///
/// Always at least 1, so tiny frames still get the base scale.
pub fn usable_scale_count(width: usize, height: usize, ratio: f32, patch_size: usize) -> usize {
    if !ratio.is_finite() || ratio <= 0.0 || ratio >= 1.0 {
        return 1;
    }
    let mut min_side = width.min(height) as f64;
    let mut levels = 0;
    while min_side >= patch_size as f64 {
        min_side *= ratio as f64;
        levels += 1;
    }
    levels.max(1)
}

/// Grayscale images for every scale of one frame.
#[derive(Debug, Clone, Default)]
pub struct FramePyramid {
    levels: Vec<GrayImage>,
}

impl FramePyramid {
    pub fn empty() -> Self {
        Self { levels: Vec::new() }
    }

    /// Build a pyramid for `frame` following `scales`.
    pub fn build(frame: ArrayView2<'_, u8>, scales: &[Scale]) -> Self {
        let mut pyramid = Self::empty();
        pyramid.rebuild(frame, scales);
        pyramid
    }

    /// Rebuild in place, reusing level buffers that already have the right
    /// shape. Each level is resampled from the one above it.
    pub fn rebuild(&mut self, frame: ArrayView2<'_, u8>, scales: &[Scale]) {
        self.levels.truncate(scales.len());
        while self.levels.len() < scales.len() {
            self.levels.push(GrayImage::zeros((0, 0)));
        }

        for (i, scale) in scales.iter().enumerate() {
            if i == 0 {
                resize_bilinear_into(frame, scale.width, scale.height, &mut self.levels[0]);
            } else {
                let (parents, rest) = self.levels.split_at_mut(i);
                resize_bilinear_into(
                    parents[i - 1].view(),
                    scale.width,
                    scale.height,
                    &mut rest[0],
                );
            }
        }
    }

    pub fn levels(&self) -> &[GrayImage] {
        &self.levels
    }

    pub fn level(&self, index: usize) -> Option<&GrayImage> {
        self.levels.get(index)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Previous/current frame pyramids. The two buffers are swapped between
/// frames so level storage is recycled.
#[derive(Debug, Clone, Default)]
pub struct PyramidPair {
    previous: FramePyramid,
    current: FramePyramid,
}

impl PyramidPair {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new sequence with `first` as the previous frame.
    pub fn reset(&mut self, first: FramePyramid) {
        self.previous = first;
        self.current = FramePyramid::empty();
    }

    /// Load the next frame into the current buffer.
    pub fn load_current(&mut self, frame: ArrayView2<'_, u8>, scales: &[Scale]) {
        self.current.rebuild(frame, scales);
    }

    /// Promote the current pyramid to previous once a frame is done.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.previous, &mut self.current);
    }

    pub fn previous(&self) -> &FramePyramid {
        &self.previous
    }

    pub fn current(&self) -> &FramePyramid {
        &self.current
    }
}
