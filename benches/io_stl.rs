//! Measures STL IO read (parse) and write speeds.

use std::f32::consts::PI;

use criterion::{
    criterion_group, criterion_main, black_box, BenchmarkId, Criterion, Throughput,
};

use stlkit::{
    Coordinate, Mesh, Triangle, UnitVector,
    io::{self, Config, Encoding, ReadOptions},
};


// ===============================================================================================
// ===== Helper utilities
// ===============================================================================================

/// A UV sphere with `2 * rings * segments` triangles.
fn sphere(rings: u32, segments: u32) -> Mesh {
    let point = |ring: u32, segment: u32| {
        let theta = PI * ring as f32 / rings as f32;
        let phi = 2.0 * PI * segment as f32 / segments as f32;
        [theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos()]
    };
    let triangle = |a: [f32; 3], b: [f32; 3], c: [f32; 3]| {
        let center = [(a[0] + b[0] + c[0]) / 3.0, (a[1] + b[1] + c[1]) / 3.0, (a[2] + b[2] + c[2]) / 3.0];
        let len = (center[0].powi(2) + center[1].powi(2) + center[2].powi(2)).sqrt();
        let normal = UnitVector::new(center[0] / len, center[1] / len, center[2] / len);
        Triangle::new(normal, [Coordinate::from(a), Coordinate::from(b), Coordinate::from(c)])
    };

    let mut triangles = Vec::new();
    for ring in 0..rings {
        for segment in 0..segments {
            let a = point(ring, segment);
            let b = point(ring + 1, segment);
            let c = point(ring + 1, segment + 1);
            let d = point(ring, segment + 1);
            triangles.push(triangle(a, b, c));
            triangles.push(triangle(a, c, d));
        }
    }

    Mesh::new("sphere", triangles)
}

fn encoded(mesh: &Mesh, encoding: Encoding) -> Vec<u8> {
    Config::new(encoding).write_to_memory(mesh).expect("writing to memory failed")
}


// ===============================================================================================
// ===== Benchmarks
// ===============================================================================================

fn read_sphere(c: &mut Criterion) {
    let mesh = sphere(200, 250);

    for &encoding in &[Encoding::Binary, Encoding::Ascii] {
        let data = encoded(&mesh, encoding);

        let mut group = c.benchmark_group(format!("stl_read_sphere_{}", encoding));
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.sample_size(20);
        for &concurrency in &[1, 2, 4, 8] {
            let options = ReadOptions::default().with_concurrency(concurrency);
            group.bench_with_input(
                BenchmarkId::from_parameter(concurrency),
                &data,
                |b, data| b.iter(|| io::read(black_box(&data[..]), &options)),
            );
        }
        group.finish();
    }
}

fn read_sphere_ordered_ascii(c: &mut Criterion) {
    let data = encoded(&sphere(200, 250), Encoding::Ascii);
    let options = ReadOptions::default().with_preserved_text_order(true);

    let mut group = c.benchmark_group("stl_read_sphere_ascii_ordered");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.sample_size(20);
    group.bench_function("default_concurrency", |b| {
        b.iter(|| io::read(black_box(&data[..]), &options))
    });
    group.finish();
}

fn write_sphere(c: &mut Criterion) {
    let mesh = sphere(200, 250);

    let mut group = c.benchmark_group("stl_write_sphere");
    group.throughput(Throughput::Elements(mesh.triangle_count() as u64));
    for &encoding in &[Encoding::Binary, Encoding::Ascii] {
        let size = encoded(&mesh, encoding).len();
        group.bench_with_input(
            BenchmarkId::from_parameter(encoding),
            &mesh,
            |b, mesh| b.iter(|| {
                let mut out = Vec::with_capacity(size);
                Config::new(encoding).into_writer(&mut out).write(black_box(mesh))
                    .expect("writing to memory failed");
                out
            }),
        );
    }
    group.finish();
}


criterion_group!(benches, read_sphere, read_sphere_ordered_ascii, write_sphere);
criterion_main!(benches);
