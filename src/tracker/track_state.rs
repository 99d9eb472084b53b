/// Lifecycle of a tracked point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    /// Still being extended frame by frame
    #[default]
    Active,
    /// Reached the trajectory length, waiting to be emitted
    Complete,
    /// Drifted out of the frame, dropped without emission
    Discarded,
}
