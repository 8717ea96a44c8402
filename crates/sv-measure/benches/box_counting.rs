use criterion::{Criterion, black_box, criterion_group, criterion_main};
use sv_core::Image;
use sv_graph::{SegmentConfig, extract_segments};
use sv_measure::{MetricConfig, VesselType, compute_metrics, fractal_dimension};
use sv_zones::{ScanLocation, build_zones};

fn branching_mask(width: usize, height: usize) -> Image<u8> {
    Image::from_fn(width, height, |x, y| {
        let trunk = (x % 96) < 5;
        let branch = (y % 48) < 3 && (x % 96) < 64;
        let diagonal = (x + y) % 128 < 3;
        if trunk || branch || diagonal { 255 } else { 0 }
    })
}

fn bench_fractal_dimension(c: &mut Criterion) {
    let img = branching_mask(768, 768);
    let view = img.as_view();

    c.bench_function("fractal_dimension_768x768", |b| {
        b.iter(|| black_box(fractal_dimension(black_box(&view))));
    });
}

fn bench_compute_metrics(c: &mut Criterion) {
    let img = branching_mask(768, 768);
    let view = img.as_view();
    let layout = build_zones(768, 768, None, ScanLocation::Macula);
    let segments = extract_segments(&view, None, None, &SegmentConfig::default())
        .map(|g| g.segments)
        .unwrap_or_default();
    let cfg = MetricConfig::default();

    c.bench_function("compute_metrics_whole_768x768", |b| {
        b.iter(|| {
            let out = compute_metrics(
                black_box(&view),
                black_box(&segments),
                &layout,
                Some(10.0),
                VesselType::Artery,
                &cfg,
            );
            black_box(out.map(|m| m.len()).unwrap_or(0));
        });
    });
}

criterion_group!(benches, bench_fractal_dimension, bench_compute_metrics);
criterion_main!(benches);
