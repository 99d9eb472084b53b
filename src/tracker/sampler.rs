//! Dense grid sampling of trackable points.
//!
//! The frame is covered by a grid of `min_distance`-sized cells. Each free
//! cell proposes its center, which is kept when its corner quality (minimum
//! eigenvalue of the local structure tensor) beats a fraction of the frame
//! maximum. Cells already holding a tracked point, and centers closer than
//! `min_distance` to any tracked point, are skipped.

use nalgebra::Point2;
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Sampling density and quality threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Grid cell size and minimum spacing, in scale-local pixels
    pub min_distance: usize,
    /// Fraction of the strongest corner response a candidate must exceed
    pub quality: f32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            min_distance: 5,
            quality: 0.001,
        }
    }
}

impl SamplerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_distance == 0 {
            return Err(ConfigError::InvalidMinDistance);
        }
        if !(self.quality >= 0.0 && self.quality < 1.0) {
            return Err(ConfigError::InvalidQuality(self.quality));
        }
        Ok(())
    }
}

#[inline]
fn pixel(image: &ArrayView2<'_, u8>, x: isize, y: isize) -> f32 {
    let (h, w) = image.dim();
    let xc = x.clamp(0, w as isize - 1) as usize;
    let yc = y.clamp(0, h as isize - 1) as usize;
    image[[yc, xc]] as f32
}

/// Minimum eigenvalue of the structure tensor at every pixel.
///
/// Gradients come from 3x3 Sobel kernels and are summed over a 3x3 window;
/// borders replicate the edge pixels.
pub fn min_eigen_map(image: ArrayView2<'_, u8>) -> Array2<f32> {
    let (h, w) = image.dim();
    if h == 0 || w == 0 {
        return Array2::zeros((h, w));
    }

    let mut ixx = Array2::<f32>::zeros((h, w));
    let mut iyy = Array2::<f32>::zeros((h, w));
    let mut ixy = Array2::<f32>::zeros((h, w));

    for y in 0..h as isize {
        for x in 0..w as isize {
            let gx = (pixel(&image, x + 1, y - 1) - pixel(&image, x - 1, y - 1))
                + 2.0 * (pixel(&image, x + 1, y) - pixel(&image, x - 1, y))
                + (pixel(&image, x + 1, y + 1) - pixel(&image, x - 1, y + 1));
            let gy = (pixel(&image, x - 1, y + 1) - pixel(&image, x - 1, y - 1))
                + 2.0 * (pixel(&image, x, y + 1) - pixel(&image, x, y - 1))
                + (pixel(&image, x + 1, y + 1) - pixel(&image, x + 1, y - 1));
            let idx = [y as usize, x as usize];
            ixx[idx] = gx * gx;
            iyy[idx] = gy * gy;
            ixy[idx] = gx * gy;
        }
    }

    let box_sum = |src: &Array2<f32>, x: usize, y: usize| -> f32 {
        let mut acc = 0.0;
        for dy in -1isize..=1 {
            for dx in -1isize..=1 {
                let sx = (x as isize + dx).clamp(0, w as isize - 1) as usize;
                let sy = (y as isize + dy).clamp(0, h as isize - 1) as usize;
                acc += src[[sy, sx]];
            }
        }
        acc
    };

    Array2::from_shape_fn((h, w), |(y, x)| {
        let a = box_sum(&ixx, x, y);
        let c = box_sum(&iyy, x, y);
        let b = box_sum(&ixy, x, y);
        let half_trace = 0.5 * (a + c);
        let half_diff = 0.5 * (a - c);
        (half_trace - (half_diff * half_diff + b * b).sqrt()).max(0.0)
    })
}

/// Grid of `cell_size` cells recording where tracked points already are.
struct OccupancyGrid {
    /// Points bucketed by (clamped) cell, for distance checks.
    buckets: Vec<Vec<Point2<f32>>>,
    /// `true` when a point falls inside the cell proper.
    occupied: Vec<bool>,
    cols: usize,
    rows: usize,
    cell_size: usize,
}

impl OccupancyGrid {
    fn new(cols: usize, rows: usize, cell_size: usize) -> Self {
        Self {
            buckets: vec![Vec::new(); cols * rows],
            occupied: vec![false; cols * rows],
            cols,
            rows,
            cell_size,
        }
    }

    fn mark(&mut self, point: &Point2<f32>) {
        if !(point.x >= 0.0 && point.y >= 0.0) || self.cols == 0 || self.rows == 0 {
            return;
        }
        let col = point.x.floor() as usize / self.cell_size;
        let row = point.y.floor() as usize / self.cell_size;
        if col < self.cols && row < self.rows {
            self.occupied[row * self.cols + col] = true;
        }
        let idx = row.min(self.rows - 1) * self.cols + col.min(self.cols - 1);
        self.buckets[idx].push(*point);
    }

    fn is_occupied(&self, col: usize, row: usize) -> bool {
        self.occupied[row * self.cols + col]
    }

    /// Whether any marked point lies closer than `cell_size` to `point`,
    /// which sits in cell `(col, row)`.
    fn has_neighbor_within(&self, point: &Point2<f32>, col: usize, row: usize) -> bool {
        let limit = self.cell_size as f32;
        let limit_sq = limit * limit;
        let rows = row.saturating_sub(1)..=(row + 1).min(self.rows - 1);
        for r in rows {
            for c in col.saturating_sub(1)..=(col + 1).min(self.cols - 1) {
                let near = self.buckets[r * self.cols + c]
                    .iter()
                    .any(|p| (p - point).norm_squared() < limit_sq);
                if near {
                    return true;
                }
            }
        }
        false
    }
}

/// Grid sampler producing well-separated, textured points.
#[derive(Debug, Clone)]
pub struct DenseSampler {
    config: SamplerConfig,
}

impl DenseSampler {
    pub fn new(config: SamplerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Sample new points in `image`, keeping clear of `occupied`.
    ///
    /// Output is in row-major grid order and fully determined by the inputs.
    pub fn sample(&self, image: ArrayView2<'_, u8>, occupied: &[Point2<f32>]) -> Vec<Point2<f32>> {
        let d = self.config.min_distance.max(1);
        let (h, w) = image.dim();
        let cols = w / d;
        let rows = h / d;
        if cols == 0 || rows == 0 {
            return Vec::new();
        }

        let quality = min_eigen_map(image);
        let max_quality = quality.iter().fold(0.0f32, |acc, &v| acc.max(v));
        let threshold = max_quality * self.config.quality;

        let mut grid = OccupancyGrid::new(cols, rows, d);
        for point in occupied {
            grid.mark(point);
        }

        let offset = d / 2;
        let mut points = Vec::new();
        for row in 0..rows {
            for col in 0..cols {
                if grid.is_occupied(col, row) {
                    continue;
                }
                let x = col * d + offset;
                let y = row * d + offset;
                let candidate = Point2::new(x as f32, y as f32);
                if grid.has_neighbor_within(&candidate, col, row) {
                    continue;
                }
                if quality[[y, x]] > threshold {
                    points.push(candidate);
                }
            }
        }
        points
    }
}
