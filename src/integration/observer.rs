use nalgebra::Point2;

/// Per-frame view of the live tracks, for rendering or inspection.
///
/// `paths` holds the path of every live base-scale track in base-frame
/// coordinates. Observers cannot influence tracking.
pub trait TrackObserver {
    fn observe(&mut self, frame: usize, paths: &[Vec<Point2<f32>>]);
}

impl<F> TrackObserver for F
where
    F: FnMut(usize, &[Vec<Point2<f32>>]),
{
    fn observe(&mut self, frame: usize, paths: &[Vec<Point2<f32>>]) {
        self(frame, paths)
    }
}
