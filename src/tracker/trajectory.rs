//! Completed trajectories and their shape statistics.

use nalgebra::{Point2, Vector2};
use ndarray::{Array1, Array2, s};
use serde::{Deserialize, Serialize};

/// A finished track, expressed in base-frame coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    /// Pyramid level the track was followed on
    pub scale: usize,
    /// Frame holding the first path point
    pub start_frame: usize,
    /// Frame holding the last path point
    pub end_frame: usize,
    /// `length + 1` points, scaled back to the base frame
    pub path: Vec<Point2<f32>>,
    /// One row per tracking step
    pub descriptor: Array2<f32>,
    /// Shape statistics, when the tracker is configured to attach them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<ShapeStats>,
}

impl Trajectory {
    /// Number of tracking steps.
    pub fn length(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    pub fn shape_stats(&self) -> ShapeStats {
        ShapeStats::from_path(&self.path)
    }

    /// Step displacements divided by the total path length.
    ///
    /// A trajectory that never moved returns its raw (zero) displacements.
    pub fn displacements(&self) -> Vec<Vector2<f32>> {
        let steps: Vec<Vector2<f32>> = self.path.windows(2).map(|w| w[1] - w[0]).collect();
        let total: f32 = steps.iter().map(|v| v.norm()).sum();
        if total > 0.0 {
            steps.into_iter().map(|v| v / total).collect()
        } else {
            steps
        }
    }

    /// Sum the per-step samples over `nt` consecutive temporal blocks of
    /// `length / nt` steps each, scaled by the block size.
    ///
    /// Steps left over by the integer division are ignored.
    pub fn pooled_descriptor(&self, nt: usize) -> Array1<f32> {
        let dim = self.descriptor.ncols();
        let mut pooled = Array1::<f32>::zeros(nt * dim);
        if nt == 0 {
            return pooled;
        }
        let stride = self.descriptor.nrows() / nt;
        if stride == 0 {
            return pooled;
        }

        let norm = 1.0 / stride as f32;
        for block in 0..nt {
            let steps = self.descriptor.slice(s![block * stride..(block + 1) * stride, ..]);
            let mut out = pooled.slice_mut(s![block * dim..(block + 1) * dim]);
            for row in steps.rows() {
                out += &row;
            }
            out.mapv_inplace(|v| v * norm);
        }
        pooled
    }

    /// All per-step samples concatenated in step order.
    pub fn flattened_descriptor(&self) -> Array1<f32> {
        self.descriptor.iter().copied().collect()
    }
}

/// Positional statistics of a trajectory path.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ShapeStats {
    pub mean_x: f32,
    pub mean_y: f32,
    /// Standard deviation of the x coordinates
    pub std_x: f32,
    /// Standard deviation of the y coordinates
    pub std_y: f32,
    /// Sum of step lengths
    pub length: f32,
    /// Longest single step
    pub max_step: f32,
}

impl ShapeStats {
    pub fn from_path(path: &[Point2<f32>]) -> Self {
        if path.is_empty() {
            return Self::default();
        }
        let n = path.len() as f32;
        let mean_x = path.iter().map(|p| p.x).sum::<f32>() / n;
        let mean_y = path.iter().map(|p| p.y).sum::<f32>() / n;
        let var_x = path.iter().map(|p| (p.x - mean_x).powi(2)).sum::<f32>() / n;
        let var_y = path.iter().map(|p| (p.y - mean_y).powi(2)).sum::<f32>() / n;

        let mut length = 0.0f32;
        let mut max_step = 0.0f32;
        for w in path.windows(2) {
            let step = (w[1] - w[0]).norm();
            length += step;
            max_step = max_step.max(step);
        }

        Self {
            mean_x,
            mean_y,
            std_x: var_x.sqrt(),
            std_y: var_y.sqrt(),
            length,
            max_step,
        }
    }
}

/// Rejects static, erratic and jumpy trajectories before emission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeFilter {
    /// Below this deviation on both axes a trajectory counts as static
    pub min_var: f32,
    /// Above this deviation on either axis a trajectory counts as erratic
    pub max_var: f32,
    /// Largest single step allowed when it dominates the path
    pub max_dis: f32,
}

impl Default for ShapeFilter {
    fn default() -> Self {
        Self {
            min_var: 3.0f32.sqrt(),
            max_var: 50.0,
            max_dis: 20.0,
        }
    }
}

impl ShapeFilter {
    pub fn accepts(&self, stats: &ShapeStats) -> bool {
        if stats.std_x < self.min_var && stats.std_y < self.min_var {
            return false;
        }
        if stats.std_x > self.max_var || stats.std_y > self.max_var {
            return false;
        }
        // A single step carrying most of the motion is a tracking failure.
        !(stats.max_step > self.max_dis && stats.max_step > 0.7 * stats.length)
    }
}
