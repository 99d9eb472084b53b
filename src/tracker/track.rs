//! Per-point track state and the per-scale track collection.

use nalgebra::Point2;
use ndarray::{Array2, ArrayView1, ArrayView2, s};

use crate::error::TrackError;
use crate::tracker::pyramid::Scale;
use crate::tracker::track_state::TrackState;
use crate::tracker::trajectory::Trajectory;

/// A point being followed through the frames of one scale.
///
/// The path always holds `cursor + 1` points and the descriptor buffer holds
/// one filled row per completed step.
#[derive(Debug, Clone)]
pub struct Track {
    path: Vec<Point2<f32>>,
    descriptors: Array2<f32>,
    length: usize,
    state: TrackState,
    start_frame: usize,
}

impl Track {
    /// Start a track at `point`, preallocating room for `length` steps of
    /// `descriptor_len` values.
    pub fn new(point: Point2<f32>, length: usize, descriptor_len: usize, start_frame: usize) -> Self {
        let mut path = Vec::with_capacity(length + 1);
        path.push(point);
        Self {
            path,
            descriptors: Array2::zeros((length, descriptor_len)),
            length,
            state: TrackState::Active,
            start_frame,
        }
    }

    /// Number of steps taken so far.
    #[inline]
    pub fn cursor(&self) -> usize {
        self.path.len() - 1
    }

    #[inline]
    pub fn current_point(&self) -> Point2<f32> {
        self.path[self.cursor()]
    }

    pub fn path(&self) -> &[Point2<f32>] {
        &self.path
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn start_frame(&self) -> usize {
        self.start_frame
    }

    /// Descriptor samples recorded so far, one row per step.
    pub fn descriptors(&self) -> ArrayView2<'_, f32> {
        self.descriptors.slice(s![..self.cursor(), ..])
    }

    pub fn descriptor_count(&self) -> usize {
        self.cursor()
    }

    pub fn state(&self) -> TrackState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == TrackState::Active
    }

    pub fn is_complete(&self) -> bool {
        self.cursor() == self.length
    }

    pub fn mark_discarded(&mut self) {
        self.state = TrackState::Discarded;
    }

    /// Append `point` and the descriptor sample of the step that led to it.
    pub fn advance(&mut self, point: Point2<f32>, sample: ArrayView1<'_, f32>) -> Result<(), TrackError> {
        if self.state != TrackState::Active {
            return Err(TrackError::InactiveTrack { state: self.state });
        }
        let cursor = self.cursor();
        if cursor >= self.length {
            return Err(TrackError::AdvancePastLength {
                length: self.length,
            });
        }
        if sample.len() != self.descriptors.ncols() {
            return Err(TrackError::DescriptorLength {
                expected: self.descriptors.ncols(),
                got: sample.len(),
            });
        }

        self.descriptors.row_mut(cursor).assign(&sample);
        self.path.push(point);
        if self.is_complete() {
            self.state = TrackState::Complete;
        }
        Ok(())
    }

    /// Turn the track into a trajectory in base-frame coordinates.
    pub fn finalize(self, scale: &Scale) -> Trajectory {
        let steps = self.cursor();
        let descriptor = if steps == self.length {
            self.descriptors
        } else {
            self.descriptors.slice(s![..steps, ..]).to_owned()
        };
        Trajectory {
            scale: scale.index,
            start_frame: self.start_frame,
            end_frame: self.start_frame + steps,
            path: self.path.iter().map(|p| scale.to_base(p)).collect(),
            descriptor,
            stats: None,
        }
    }
}

/// Tracks of a single scale, in insertion order.
///
/// Tracks are updated in place and only flagged as complete or discarded;
/// `compact` then removes them in one pass.
#[derive(Debug, Clone, Default)]
pub struct TrackSet {
    tracks: Vec<Track>,
}

impl TrackSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, track: Track) {
        self.tracks.push(track);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Track> {
        self.tracks.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Track> {
        self.tracks.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Current point of every track.
    pub fn current_points(&self) -> Vec<Point2<f32>> {
        self.tracks.iter().map(Track::current_point).collect()
    }

    /// Keep active tracks, drop discarded ones and hand back the complete
    /// ones in insertion order.
    pub fn compact(&mut self) -> Vec<Track> {
        let mut complete = Vec::new();
        let tracks = std::mem::take(&mut self.tracks);
        self.tracks.reserve(tracks.len());
        for track in tracks {
            match track.state() {
                TrackState::Active => self.tracks.push(track),
                TrackState::Complete => complete.push(track),
                TrackState::Discarded => {}
            }
        }
        complete
    }
}

impl<'a> IntoIterator for &'a TrackSet {
    type Item = &'a Track;
    type IntoIter = std::slice::Iter<'a, Track>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracks.iter()
    }
}
