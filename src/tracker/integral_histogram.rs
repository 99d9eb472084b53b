//! Integral histogram of optical-flow orientations.
//!
//! Every pixel votes its motion magnitude into orientation bins, with an
//! optional rest bin for near-zero motion. Per-bin prefix sums are stored in
//! a `(height + 1, width + 1, bins)` buffer whose row 0 and column 0 stay
//! zero, so the histogram of any rectangle costs four lookups:
//!
//! ```text
//! H(rect) = I(x1, y1) + I(x0, y0) - I(x0, y1) - I(x1, y0)
//! ```

use ndarray::{Array1, Array3, ArrayView1, s};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::tracker::motion::MotionField;
use crate::tracker::rect::Rect;

/// Post-processing applied to each descriptor sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Normalization {
    /// Raw, clamped-nonnegative cell histograms
    None,
    /// Divide by the Euclidean norm
    L2,
    /// Add epsilon, divide by the L1 norm and take square roots
    #[default]
    RootL1,
}

/// Layout and binning parameters of the motion-histogram descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptorConfig {
    /// Total bin count, including the rest bin when enabled
    pub bins: usize,
    /// Reserve the last bin for motion at or below `min_flow`
    pub zero_bin: bool,
    /// Magnitude threshold for the rest bin
    pub min_flow: f32,
    /// Side of the square descriptor window, in scale-local pixels
    pub patch_size: usize,
    pub nx_cells: usize,
    pub ny_cells: usize,
    /// Temporal blocks used when pooling a finished trajectory
    pub nt_cells: usize,
    pub normalization: Normalization,
    /// Added to every entry before `RootL1` normalisation
    pub epsilon: f32,
}

impl Default for DescriptorConfig {
    fn default() -> Self {
        Self {
            bins: 9,
            zero_bin: true,
            min_flow: 0.4,
            patch_size: 32,
            nx_cells: 2,
            ny_cells: 2,
            nt_cells: 1,
            normalization: Normalization::RootL1,
            epsilon: 0.05,
        }
    }
}

impl DescriptorConfig {
    /// Number of orientation bins, excluding the rest bin.
    pub fn orientation_bins(&self) -> usize {
        if self.zero_bin {
            self.bins.saturating_sub(1)
        } else {
            self.bins
        }
    }

    /// Length of one per-step descriptor sample.
    pub fn sample_len(&self) -> usize {
        self.nx_cells * self.ny_cells * self.bins
    }

    /// Length of a temporally pooled trajectory descriptor.
    pub fn pooled_len(&self) -> usize {
        self.sample_len() * self.nt_cells
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let min = if self.zero_bin { 2 } else { 1 };
        if self.bins < min {
            return Err(ConfigError::InvalidBinCount {
                min,
                got: self.bins,
            });
        }
        if self.nx_cells == 0 || self.ny_cells == 0 || self.nt_cells == 0 {
            return Err(ConfigError::InvalidCellGrid {
                nx: self.nx_cells,
                ny: self.ny_cells,
                nt: self.nt_cells,
            });
        }
        if self.patch_size < self.nx_cells || self.patch_size < self.ny_cells {
            return Err(ConfigError::InvalidPatchSize {
                patch_size: self.patch_size,
                nx: self.nx_cells,
                ny: self.ny_cells,
            });
        }
        Ok(())
    }
}

/// Split one motion vector into at most two weighted bin votes.
#[inline]
fn bin_votes(dx: f32, dy: f32, config: &DescriptorConfig) -> [(usize, f32); 2] {
    let orientation_bins = config.orientation_bins();
    let magnitude = (dx * dx + dy * dy).sqrt();

    if config.zero_bin && magnitude <= config.min_flow {
        return [(orientation_bins, 1.0), (0, 0.0)];
    }

    let mut angle = dy.atan2(dx).to_degrees();
    if angle < 0.0 {
        angle += 360.0;
    }
    if angle >= 360.0 {
        angle -= 360.0;
    }

    let fbin = angle * orientation_bins as f32 / 360.0;
    let lower = fbin.floor();
    let bin0 = (lower as usize) % orientation_bins;
    let bin1 = (bin0 + 1) % orientation_bins;
    let upper_weight = (fbin - lower) * magnitude;

    [(bin0, magnitude - upper_weight), (bin1, upper_weight)]
}

/// Cumulative per-bin histogram over a motion field.
#[derive(Debug, Clone)]
pub struct IntegralHistogram {
    data: Array3<f32>,
}

impl IntegralHistogram {
    /// Build the integral histogram of `field`.
    pub fn from_motion(field: &MotionField, config: &DescriptorConfig) -> Self {
        let (width, height) = field.dim();
        let bins = config.bins;
        let mut data = Array3::<f32>::zeros((height + 1, width + 1, bins));
        let mut row_sum = vec![0.0f32; bins];

        for y in 0..height {
            row_sum.fill(0.0);
            for x in 0..width {
                let v = field.at(x, y);
                for (bin, weight) in bin_votes(v.x, v.y, config) {
                    row_sum[bin] += weight;
                }
                for (m, &sum) in row_sum.iter().enumerate() {
                    let above = data[[y, x + 1, m]];
                    data[[y + 1, x + 1, m]] = above + sum;
                }
            }
        }

        Self { data }
    }

    pub fn width(&self) -> usize {
        self.data.dim().1 - 1
    }

    pub fn height(&self) -> usize {
        self.data.dim().0 - 1
    }

    pub fn bins(&self) -> usize {
        self.data.dim().2
    }

    /// Histogram of `[0, y) x [0, x)`.
    pub fn cumulative(&self, x: usize, y: usize) -> ArrayView1<'_, f32> {
        self.data.slice(s![y, x, ..])
    }

    /// Histogram of the pixels inside `rect`, clipped to the field.
    pub fn rect_histogram(&self, rect: &Rect) -> Array1<f32> {
        let x0 = rect.x.min(self.width());
        let y0 = rect.y.min(self.height());
        let x1 = (rect.x + rect.width).min(self.width());
        let y1 = (rect.y + rect.height).min(self.height());
        if x1 <= x0 || y1 <= y0 {
            return Array1::zeros(self.bins());
        }

        let d = &self.data;
        Array1::from_shape_fn(self.bins(), |m| {
            d[[y1, x1, m]] + d[[y0, x0, m]] - d[[y1, x0, m]] - d[[y0, x1, m]]
        })
    }

    /// Descriptor sample for `rect`: the window is split into
    /// `nx_cells x ny_cells` cells (x-major), each contributing its
    /// histogram, then normalised. Windows too small to hold one pixel per
    /// cell give an all-zero sample.
    pub fn descriptor(&self, rect: &Rect, config: &DescriptorConfig) -> Array1<f32> {
        let bins = self.bins();
        let mut sample = Array1::<f32>::zeros(config.nx_cells * config.ny_cells * bins);

        let x_stride = rect.width / config.nx_cells;
        let y_stride = rect.height / config.ny_cells;
        if x_stride == 0 || y_stride == 0 {
            return sample;
        }

        let mut offset = 0;
        for ix in 0..config.nx_cells {
            for iy in 0..config.ny_cells {
                let cell = Rect::new(
                    rect.x + ix * x_stride,
                    rect.y + iy * y_stride,
                    x_stride,
                    y_stride,
                );
                let hist = self.rect_histogram(&cell);
                sample
                    .slice_mut(s![offset..offset + bins])
                    .assign(&hist.mapv(|v| v.max(0.0)));
                offset += bins;
            }
        }

        normalize(&mut sample, config);
        sample
    }
}

fn normalize(sample: &mut Array1<f32>, config: &DescriptorConfig) {
    match config.normalization {
        Normalization::None => {}
        Normalization::L2 => {
            let norm = sample.iter().map(|v| v * v).sum::<f32>().sqrt();
            if norm > 0.0 {
                sample.mapv_inplace(|v| v / norm);
            }
        }
        Normalization::RootL1 => {
            sample.mapv_inplace(|v| v + config.epsilon);
            let norm = sample.sum();
            if norm > 0.0 {
                sample.mapv_inplace(|v| (v / norm).sqrt());
            }
        }
    }
}
