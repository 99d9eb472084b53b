use nalgebra::Point2;

/// Axis-aligned pixel rectangle used for descriptor windows.
///
/// Covers columns `[x, x + width)` and rows `[y, y + height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Left column
    pub x: usize,
    /// Top row
    pub y: usize,
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
}

impl Rect {
    /// Create a new Rect from top-left coordinates and dimensions.
    #[inline]
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Intersect a signed rectangle with `[0, frame_width) x [0, frame_height)`.
    pub fn clipped(
        x: isize,
        y: isize,
        width: usize,
        height: usize,
        frame_width: usize,
        frame_height: usize,
    ) -> Self {
        let x0 = x.clamp(0, frame_width as isize);
        let y0 = y.clamp(0, frame_height as isize);
        let x1 = (x + width as isize).clamp(0, frame_width as isize);
        let y1 = (y + height as isize).clamp(0, frame_height as isize);
        Self {
            x: x0 as usize,
            y: y0 as usize,
            width: (x1 - x0).max(0) as usize,
            height: (y1 - y0).max(0) as usize,
        }
    }

    /// Square window of side `side` around `center`.
    ///
    /// The window is shifted to stay inside the frame when possible and
    /// clipped when the frame is smaller than the window.
    pub fn around(center: &Point2<f32>, side: usize, frame_width: usize, frame_height: usize) -> Self {
        let half = (side / 2) as isize;
        let max_x = frame_width as isize - side as isize;
        let max_y = frame_height as isize - side as isize;
        let x = (center.x.round_ties_even() as isize - half).max(0).min(max_x);
        let y = (center.y.round_ties_even() as isize - half).max(0).min(max_y);
        Self::clipped(x, y, side, side, frame_width, frame_height)
    }

    /// Convert to TLBR format: (x1, y1, x2, y2), exclusive bottom-right.
    #[inline]
    pub fn to_tlbr(&self) -> [usize; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }

    /// Get the area of the rectangle.
    #[inline]
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }

    /// Whether pixel `(px, py)` lies inside.
    #[inline]
    pub fn contains(&self, px: usize, py: usize) -> bool {
        px >= self.x && py >= self.y && px < self.x + self.width && py < self.y + self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_tlbr() {
        let rect = Rect::new(10, 20, 30, 40);
        assert_eq!(rect.to_tlbr(), [10, 20, 40, 60]);
        assert_eq!(rect.area(), 1200);
    }

    #[test]
    fn test_around_interior() {
        let rect = Rect::around(&Point2::new(50.0, 40.0), 32, 100, 100);
        assert_eq!(rect, Rect::new(34, 24, 32, 32));
    }

    #[test]
    fn test_around_shifts_inside_frame() {
        let rect = Rect::around(&Point2::new(2.0, 98.0), 32, 100, 100);
        assert_eq!(rect, Rect::new(0, 68, 32, 32));
    }

    #[test]
    fn test_around_clips_small_frame() {
        let rect = Rect::around(&Point2::new(5.0, 5.0), 32, 20, 10);
        assert_eq!(rect, Rect::new(0, 0, 20, 10));
    }

    #[test]
    fn test_clipped_outside_is_empty() {
        let rect = Rect::clipped(-40, 5, 32, 32, 100, 100);
        assert!(rect.is_empty());
    }

    #[test]
    fn test_contains() {
        let rect = Rect::new(2, 3, 4, 5);
        assert!(rect.contains(2, 3));
        assert!(rect.contains(5, 7));
        assert!(!rect.contains(6, 7));
        assert!(!rect.contains(5, 8));
    }
}
