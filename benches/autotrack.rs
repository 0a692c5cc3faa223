use autotrack::geometry::{Point, SearchWindow};
use autotrack::{
    AutoTracker, MaskGeometry, MaskShape, MaskedTemplatePlan, OwnedImage, TargetPoint, Template,
    TemplateMatcher, TrackId,
};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

fn make_image(width: usize, height: usize, dx: usize, dy: usize) -> OwnedImage {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let (sx, sy) = (x + 64 - dx, y + 64 - dy);
            let value = ((sx * 13) ^ (sy * 7) ^ (sx * sy / 3)) & 0xFF;
            data.push(value as u8);
        }
    }
    OwnedImage::new(data, width, height).unwrap()
}

fn bench_matcher(c: &mut Criterion) {
    let image = make_image(640, 480, 0, 0);
    let geometry = MaskGeometry::area(MaskShape::Ellipse, 32, 32).unwrap();
    let tpl = Template::capture(image.view(), Point::new(300.0, 220.0), &geometry).unwrap();
    let plan = MaskedTemplatePlan::from_template(&tpl).unwrap();
    let matcher = TemplateMatcher::new();

    let small = SearchWindow::new(268, 188, 64, 64);
    c.bench_function("match_area_64px_window", |b| {
        b.iter(|| {
            let outcome = matcher
                .match_area(black_box(image.view()), &plan, small)
                .unwrap();
            black_box(outcome);
        })
    });

    let large = SearchWindow::new(200, 120, 200, 200);
    c.bench_function("match_area_200px_window", |b| {
        b.iter(|| {
            let outcome = matcher
                .match_area(black_box(image.view()), &plan, large)
                .unwrap();
            black_box(outcome);
        })
    });
}

fn bench_tracker(c: &mut Criterion) {
    let frames: Vec<OwnedImage> = (0..16).map(|i| make_image(320, 240, 2 * i, i)).collect();
    c.bench_function("advance_16_frames", |b| {
        b.iter(|| {
            let mut tracker = AutoTracker::new(frames.as_slice());
            tracker.set_track(Some(TrackId(0)));
            tracker
                .add_key_frame(TargetPoint::new(0, 140.0, 110.0), 140.0, 110.0)
                .unwrap();
            black_box(tracker.advance_to(15, None).unwrap());
        })
    });
}

criterion_group!(benches, bench_matcher, bench_tracker);
criterion_main!(benches);
