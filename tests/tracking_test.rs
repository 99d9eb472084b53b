use densetrack_rs::tracker::{DenseTracker, FramePyramid, MotionField, TrackerConfig};
use densetrack_rs::{MotionFieldProvider, Trajectory, UniformMotion};
use nalgebra::Point2;
use ndarray::Array2;

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn textured(w: usize, h: usize) -> Array2<u8> {
    Array2::from_shape_fn((h, w), |(y, x)| ((x * 37 + y * 91 + (x * y) % 13 * 17) % 256) as u8)
}

/// Smoothly varying motion so that descriptors differ between tracks.
struct SwirlMotion;

impl MotionFieldProvider for SwirlMotion {
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
                MotionField::from_fn(w, h, |x, y| {
                    (0.5 + (y % 7) as f32 * 0.3, ((x % 5) as f32 - 2.0) * 0.4)
                })
            })
            .collect())
    }
}

#[test]
fn test_uniform_motion_scenario() {
    init_logging();
    let config = TrackerConfig {
        trajectory_length: 5,
        gap: 1000,
        scale_count: 3,
        scale_ratio: 0.8,
        ..TrackerConfig::default()
    };
    let mut tracker = DenseTracker::new(config).unwrap();
    let frame = textured(100, 100);
    let pyramid = tracker.initialize(frame.view()).unwrap();

    let dims: Vec<_> = tracker.scales().iter().map(|s| (s.width, s.height)).collect();
    assert_eq!(dims, vec![(100, 100), (80, 80), (64, 64)]);

    let initial: Vec<Vec<Point2<f32>>> = (0..3)
        .map(|s| tracker.tracks(s).unwrap().current_points())
        .collect();
    assert!(initial.iter().all(|points| !points.is_empty()));

    let mut provider = UniformMotion::new(2.0, 0.0);
    let mut emitted = Vec::new();
    for _ in 0..5 {
        let fields = provider.motion_fields(&pyramid, &pyramid).unwrap();
        let report = tracker.step(&pyramid, &fields).unwrap();
        assert!(!report.resampled);
        emitted.extend(report.trajectories);

        // Live points never sit outside their scale.
        for (s, scale) in tracker.scales().iter().enumerate() {
            for track in tracker.tracks(s).unwrap() {
                assert!(track.path().iter().all(|p| scale.contains(p)));
            }
        }
    }
    assert_eq!(tracker.live_track_count(), 0);

    for (s, scale) in tracker.scales().iter().enumerate() {
        let factor = scale.downsample_factor;
        let width = scale.width as f32;
        let from_scale: Vec<&Trajectory> = emitted.iter().filter(|t| t.scale == s).collect();

        // Only points that would cross the right edge are lost.
        let survivors = initial[s].iter().filter(|p| p.x + 10.0 < width).count();
        assert_eq!(from_scale.len(), survivors);

        for traj in &from_scale {
            assert_eq!(traj.path.len(), 6);
            assert_eq!(traj.descriptor.nrows(), 5);
            assert_eq!((traj.start_frame, traj.end_frame), (0, 5));
            let origin = traj.path[0];
            for (i, p) in traj.path.iter().enumerate() {
                assert!((p.x - origin.x - 2.0 * i as f32 * factor).abs() < 1e-3);
                assert_eq!(p.y, origin.y);
            }
        }

        for p in initial[s].iter().filter(|p| p.x < width - 12.0) {
            let start = Point2::new(p.x * factor, p.y * factor);
            assert!(from_scale.iter().any(|t| (t.path[0] - start).norm() < 1e-3));
        }
    }
}

#[test]
fn test_point_near_edge_is_discarded() {
    init_logging();
    let config = TrackerConfig {
        trajectory_length: 5,
        scale_count: 1,
        ..TrackerConfig::default()
    };
    let mut tracker = DenseTracker::new(config).unwrap();
    // A flat frame yields no sampled points.
    let frame = Array2::from_elem((100, 100), 90u8);
    let pyramid = tracker.initialize(frame.view()).unwrap();
    assert_eq!(tracker.live_track_count(), 0);

    tracker.seed_points(0, &[Point2::new(98.0, 50.0), Point2::new(40.0, 50.0)]).unwrap();
    let fields = UniformMotion::new(5.0, 0.0)
        .motion_fields(&pyramid, &pyramid)
        .unwrap();
    let report = tracker.step(&pyramid, &fields).unwrap();

    assert_eq!(report.scales[0].discarded, 1);
    assert_eq!(report.scales[0].advanced, 1);
    assert!(report.trajectories.is_empty());
    assert_eq!(tracker.active_paths(0), vec![vec![Point2::new(40.0, 50.0), Point2::new(45.0, 50.0)]]);
}

fn run_swirl() -> Vec<Trajectory> {
    let config = TrackerConfig {
        trajectory_length: 4,
        gap: 4,
        scale_count: 2,
        scale_ratio: 0.75,
        ..TrackerConfig::default()
    };
    let mut tracker = DenseTracker::new(config).unwrap();
    let mut previous = tracker.initialize(textured(64, 48).view()).unwrap();
    let mut provider = SwirlMotion;
    let mut emitted = Vec::new();
    for i in 1..10 {
        let frame = Array2::from_shape_fn((48, 64), |(y, x)| {
            (((x + i) * 37 + y * 91 + ((x + i) * y) % 13 * 17) % 256) as u8
        });
        let current = FramePyramid::build(frame.view(), tracker.scales());
        let fields = provider.motion_fields(&previous, &current).unwrap();
        emitted.extend(tracker.step(&current, &fields).unwrap().trajectories);
        previous = current;
    }
    emitted
}

#[test]
fn test_runs_are_deterministic() {
    init_logging();
    let a = run_swirl();
    let b = run_swirl();
    assert!(!a.is_empty());
    assert_eq!(a, b);
    for traj in &a {
        assert_eq!(traj.path.len(), 5);
        assert_eq!(traj.descriptor.dim(), (4, 36));
        assert!(traj.descriptor.iter().all(|v| v.is_finite()));
    }
}

#[test]
fn test_resample_cadence_and_spacing() {
    init_logging();
    let config = TrackerConfig {
        trajectory_length: 20,
        gap: 3,
        scale_count: 1,
        ..TrackerConfig::default()
    };
    let min_distance = config.sampler.min_distance as f32;
    let mut tracker = DenseTracker::new(config).unwrap();

    // Texture on the left half only, so the right half starts empty.
    let mut first = textured(60, 40);
    first.slice_mut(ndarray::s![.., 30..]).fill(100);
    tracker.initialize(first.view()).unwrap();
    let seeded = tracker.live_track_count();
    assert!(seeded > 0);

    let frame = textured(60, 40);
    let pyramid = FramePyramid::build(frame.view(), tracker.scales());
    let fields = vec![MotionField::zeros(60, 40)];

    for frame_index in 1..=9 {
        let existing = tracker.tracks(0).unwrap().current_points();
        let report = tracker.step(&pyramid, &fields).unwrap();
        assert_eq!(report.frame, frame_index);
        assert_eq!(report.resampled, frame_index % 3 == 0);

        let spawned: Vec<Point2<f32>> = tracker
            .tracks(0)
            .unwrap()
            .iter()
            .filter(|t| t.cursor() == 0)
            .map(|t| t.current_point())
            .collect();
        assert_eq!(spawned.len(), report.scales[0].spawned);

        if report.resampled {
            for p in &spawned {
                for q in &existing {
                    assert!((p - q).norm() >= min_distance);
                }
            }
        } else {
            assert!(spawned.is_empty());
        }
        if frame_index == 3 {
            assert!(!spawned.is_empty());
        }
    }

    // Every pair of live points keeps the minimum spacing.
    let points = tracker.tracks(0).unwrap().current_points();
    for (i, p) in points.iter().enumerate() {
        for q in &points[i + 1..] {
            assert!((p - q).norm() >= min_distance);
        }
    }
}
