use criterion::{Criterion, black_box, criterion_group, criterion_main};
use densetrack_rs::tracker::{
    DenseSampler, DenseTracker, DescriptorConfig, FramePyramid, IntegralHistogram, MotionField,
    Rect, SamplerConfig, TrackerConfig,
};
use nalgebra::Point2;
use ndarray::Array2;

fn textured(w: usize, h: usize) -> Array2<u8> {
    Array2::from_shape_fn((h, w), |(y, x)| ((x * 37 + y * 91 + (x * y) % 13 * 17) % 256) as u8)
}

fn swirl(w: usize, h: usize) -> MotionField {
    MotionField::from_fn(w, h, |x, y| {
        let cx = x as f32 - w as f32 / 2.0;
        let cy = y as f32 - h as f32 / 2.0;
        (-cy * 0.02, cx * 0.02)
    })
}

fn bench_integral_histogram(c: &mut Criterion) {
    let config = DescriptorConfig::default();
    let field = swirl(320, 240);

    c.bench_function("integral_histogram_320x240", |b| {
        b.iter(|| IntegralHistogram::from_motion(black_box(&field), &config))
    });

    let histogram = IntegralHistogram::from_motion(&field, &config);
    let window = Rect::around(&Point2::new(160.0, 120.0), config.patch_size, 320, 240);
    c.bench_function("descriptor_query", |b| {
        b.iter(|| histogram.descriptor(black_box(&window), &config))
    });
}

fn bench_sampler(c: &mut Criterion) {
    let image = textured(320, 240);
    let sampler = DenseSampler::new(SamplerConfig::default());
    let occupied: Vec<Point2<f32>> = (0..200)
        .map(|i| Point2::new((i * 7 % 320) as f32, (i * 13 % 240) as f32))
        .collect();

    c.bench_function("dense_sample_320x240", |b| {
        b.iter(|| sampler.sample(black_box(image.view()), &occupied))
    });
}

fn bench_tracker_step(c: &mut Criterion) {
    let config = TrackerConfig {
        scale_count: 4,
        ..TrackerConfig::default()
    };
    let frame = textured(320, 240);

    c.bench_function("tracker_step_320x240_4_scales", |b| {
        b.iter_batched(
            || {
                let mut tracker = DenseTracker::new(config.clone()).unwrap();
                let pyramid = tracker.initialize(frame.view()).unwrap();
                let fields: Vec<MotionField> = tracker
                    .scales()
                    .iter()
                    .map(|s| swirl(s.width, s.height))
                    .collect();
                (tracker, pyramid, fields)
            },
            |(mut tracker, pyramid, fields): (DenseTracker, FramePyramid, Vec<MotionField>)| {
                tracker.step(&pyramid, &fields).unwrap()
            },
            criterion::BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, bench_integral_histogram, bench_sampler, bench_tracker_step);
criterion_main!(benches);
