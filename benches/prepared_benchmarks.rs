use criterion::{Criterion, black_box, criterion_group, criterion_main};
use geoforge::{AutoPrepare, Factory, Geometry};

fn many_sided_polygon(factory: &Factory, sides: usize) -> Geometry {
    let points: Vec<Geometry> = (0..sides)
        .map(|i| {
            let angle = (i as f64) * std::f64::consts::TAU / (sides as f64);
            factory.point(angle.cos() * 100.0, angle.sin() * 100.0)
        })
        .collect();
    let mut refs: Vec<&Geometry> = points.iter().collect();
    refs.push(&points[0]);
    let ring = factory.linear_ring(&refs).unwrap();
    factory.polygon(&ring, &[]).unwrap()
}

fn bench_intersects(c: &mut Criterion) {
    let factory = Factory::builder()
        .auto_prepare(AutoPrepare::Disabled)
        .build();
    let polygon = many_sided_polygon(&factory, 1024);
    let near_probe = factory.point(99.0, 1.0);
    let far_probe = factory.point(350.0, 350.0);

    let mut group = c.benchmark_group("intersects");

    group.bench_function("unprepared_near", |b| {
        b.iter(|| black_box(polygon.intersects(&near_probe).unwrap()))
    });
    group.bench_function("unprepared_far", |b| {
        b.iter(|| black_box(polygon.intersects(&far_probe).unwrap()))
    });

    polygon.prepare();
    assert!(polygon.is_prepared());

    group.bench_function("prepared_near", |b| {
        b.iter(|| black_box(polygon.intersects(&near_probe).unwrap()))
    });
    group.bench_function("prepared_far", |b| {
        b.iter(|| black_box(polygon.intersects(&far_probe).unwrap()))
    });

    group.finish();
}

fn bench_prepare_cost(c: &mut Criterion) {
    let factory = Factory::builder()
        .auto_prepare(AutoPrepare::Disabled)
        .build();
    let polygon = many_sided_polygon(&factory, 1024);

    c.bench_function("prepare_1024_sides", |b| {
        b.iter(|| black_box(polygon.prepare()))
    });
}

criterion_group!(benches, bench_intersects, bench_prepare_cost);
criterion_main!(benches);
