use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use las_stream::{Builder, Point, Reader, Writer, point::Format};
use std::{hint::black_box, io::Cursor};

fn roundtrip(format: Format, npoints: u32) {
    let mut builder = Builder::from((1, 4));
    builder.point_format = format;
    let mut writer = Writer::new(Cursor::new(Vec::new()), builder.into_header().unwrap()).unwrap();
    for i in 0..npoints {
        let point = Point {
            x: f64::from(i),
            gps_time: format.has_gps_time().then_some(f64::from(i)),
            ..Default::default()
        };
        writer.write_point(point).unwrap();
    }
    let mut reader = Reader::new(writer.into_inner().unwrap()).unwrap();
    for point in reader.points() {
        let _ = black_box(point.unwrap());
    }
}

fn bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("roundtrip");
    for id in [0, 6] {
        let format = Format::new(id).unwrap();
        for npoints in [0, 1, 100, 10_000] {
            let _ = group.bench_with_input(
                BenchmarkId::new(format!("format {}", id), npoints),
                &npoints,
                |b, &npoints| b.iter(|| roundtrip(format, npoints)),
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench);
criterion_main!(benches);
