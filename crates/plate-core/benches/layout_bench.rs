//! Criterion benchmarks for the position-diagram layout path.
//!
//! The diagram is recomputed on every window resize, so grid building plus
//! scale resolution should stay well under a frame budget even for the
//! largest cabinets.
//!
//! Run with:
//! ```bash
//! cargo bench --package plate-core --bench layout_bench
//! ```

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use plate_core::{build_grid, resolve_layout, Device, NewDevice, Viewport};

// ── Fixture builders ──────────────────────────────────────────────────────────

/// Creates a fully populated `n × n` screen.
fn build_square_screen(n: i64) -> Vec<Device> {
    let now = Utc::now();
    let mut devices = Vec::with_capacity((n * n) as usize);
    let mut id = 1;
    for x in 1..=n {
        for y in 1..=n {
            let device = NewDevice {
                sequence: id as u32,
                power_station: String::new(),
                protection_screen: "Screen A".to_string(),
                bay: String::new(),
                plate_name: format!("Plate {id}"),
                plate_type: Default::default(),
                plate_box: String::new(),
                plate_verbs: String::new(),
                general_name: String::new(),
                color: Default::default(),
                layer: Default::default(),
                position_x: x,
                position_y: y,
                status: None,
                last_changed_by: None,
                change_remarks: None,
            }
            .into_device(id, now);
            devices.push(device);
            id += 1;
        }
    }
    devices
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

/// Benchmarks [`build_grid`] as the screen grows.
fn bench_build_grid_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_grid_scaling");

    for &n in &[3i64, 6, 9, 16] {
        let devices = build_square_screen(n);
        group.bench_with_input(BenchmarkId::new("side", n), &devices, |b, devices| {
            b.iter(|| build_grid(black_box(devices)))
        });
    }

    group.finish();
}

/// Benchmarks [`resolve_layout`] for the standard and compact profiles.
fn bench_resolve_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_layout");
    let viewport = Viewport::new(900.0, 700.0);

    group.bench_function("standard_4x3", |b| {
        b.iter(|| resolve_layout(black_box(4), black_box(3), black_box(viewport)))
    });

    group.bench_function("compact_9x9", |b| {
        b.iter(|| resolve_layout(black_box(9), black_box(9), black_box(viewport)))
    });

    group.bench_function("unmeasured_viewport", |b| {
        b.iter(|| resolve_layout(black_box(9), black_box(9), black_box(Viewport::new(0.0, 0.0))))
    });

    group.finish();
}

/// Benchmarks a full resize recomputation: grid plus layout.
fn bench_resize_recompute(c: &mut Criterion) {
    let devices = build_square_screen(9);
    let mut group = c.benchmark_group("resize_recompute");

    group.bench_function("grid_and_layout_9x9", |b| {
        b.iter(|| {
            let grid = build_grid(black_box(&devices));
            resolve_layout(grid.rows(), grid.cols(), black_box(Viewport::new(1280.0, 720.0)))
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_build_grid_scaling,
    bench_resolve_layout,
    bench_resize_recompute,
);
criterion_main!(benches);
