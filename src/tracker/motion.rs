//! Dense per-pixel motion field.

use nalgebra::{Point2, Vector2};
use ndarray::Array2;

/// Dense 2D displacement field, one `(dx, dy)` per pixel.
///
/// Both components are stored as `(height, width)` arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionField {
    dx: Array2<f32>,
    dy: Array2<f32>,
}

impl MotionField {
    /// Assemble a field from its components. Returns `None` when the shapes
    /// differ.
    pub fn from_components(dx: Array2<f32>, dy: Array2<f32>) -> Option<Self> {
        if dx.dim() != dy.dim() {
            return None;
        }
        Some(Self { dx, dy })
    }

    /// A field with no motion anywhere.
    pub fn zeros(width: usize, height: usize) -> Self {
        Self::uniform(width, height, 0.0, 0.0)
    }

    /// A field with the same vector at every pixel.
    pub fn uniform(width: usize, height: usize, dx: f32, dy: f32) -> Self {
        Self {
            dx: Array2::from_elem((height, width), dx),
            dy: Array2::from_elem((height, width), dy),
        }
    }

    /// Build a field from a per-pixel function of `(x, y)`.
    pub fn from_fn<F>(width: usize, height: usize, f: F) -> Self
    where
        F: Fn(usize, usize) -> (f32, f32),
    {
        let mut dx = Array2::zeros((height, width));
        let mut dy = Array2::zeros((height, width));
        for y in 0..height {
            for x in 0..width {
                let (u, v) = f(x, y);
                dx[[y, x]] = u;
                dy[[y, x]] = v;
            }
        }
        Self { dx, dy }
    }

    pub fn width(&self) -> usize {
        self.dx.ncols()
    }

    pub fn height(&self) -> usize {
        self.dx.nrows()
    }

    /// `(width, height)`.
    pub fn dim(&self) -> (usize, usize) {
        (self.width(), self.height())
    }

    pub fn is_empty(&self) -> bool {
        self.dx.is_empty()
    }

    pub fn dx(&self) -> &Array2<f32> {
        &self.dx
    }

    pub fn dy(&self) -> &Array2<f32> {
        &self.dy
    }

    /// Vector at pixel `(x, y)`. Panics when out of range.
    #[inline]
    pub fn at(&self, x: usize, y: usize) -> Vector2<f32> {
        Vector2::new(self.dx[[y, x]], self.dy[[y, x]])
    }

    /// Vector at the pixel nearest to `point`, with the pixel index clamped
    /// into the field. The point itself is not modified.
    ///
    /// Must not be called on an empty field.
    #[inline]
    pub fn sample_clamped(&self, point: &Point2<f32>) -> Vector2<f32> {
        let max_x = self.width().saturating_sub(1) as f32;
        let max_y = self.height().saturating_sub(1) as f32;
        let x = point.x.round_ties_even().clamp(0.0, max_x) as usize;
        let y = point.y.round_ties_even().clamp(0.0, max_y) as usize;
        self.at(x, y)
    }
}
