//! Motion field providers.

use crate::tracker::{FramePyramid, MotionField};

/// Dense motion estimation between two frame pyramids.
///
/// Implementations return one field per pyramid level, each with the
/// dimensions of that level, holding the motion from `previous` to `current`.
pub trait MotionFieldProvider {
    /// Error type for estimation failures.
    type Error: std::error::Error + Send + Sync + 'static;

    fn motion_fields(
        &mut self,
        previous: &FramePyramid,
        current: &FramePyramid,
    ) -> Result<Vec<MotionField>, Self::Error>;
}

/// The same motion vector at every pixel of every level.
///
/// The vector is in level-local pixels, so the base-frame motion of a level
/// grows with its downsample factor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UniformMotion {
    pub dx: f32,
    pub dy: f32,
}

impl UniformMotion {
    pub fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }

    /// No motion anywhere.
    pub fn identity() -> Self {
        Self::default()
    }
}

impl MotionFieldProvider for UniformMotion {
    type Error = std::convert::Infallible;

    fn motion_fields(
        &mut self,
        _previous: &FramePyramid,
        current: &FramePyramid,
    ) -> Result<Vec<MotionField>, Self::Error> {
        Ok(current
            .levels()
            .iter()
            .map(|level| {
                let (h, w) = level.dim();
                MotionField::uniform(w, h, self.dx, self.dy)
            })
            .collect())
    }
}
