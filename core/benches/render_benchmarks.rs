//! Render and hit-test benchmarks over a large venue.
//!
//! Run with: `cargo bench -p seatmap-core`

#![allow(missing_docs)] // Benchmarks don't need extensive docs
#![allow(clippy::expect_used)] // Benchmarks can use expect for setup

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use seatmap_core::occupancy::OccupancyStore;
use seatmap_core::reducer::Reducer;
use seatmap_core::render::{hit_test_id, RenderEngine, SvgSurface};
use seatmap_core::selection::Selection;
use seatmap_core::session::{SeatMapAction, SeatMapEnvironment, SeatMapReducer, SeatMapState};
use seatmap_core::types::{HolderRef, Point, SeatId, SeatStatus};
use seatmap_core::viewport::Viewport;
use seatmap_testing::{fixtures, test_clock, RecordingSurface};
use std::sync::Arc;

const ROWS: usize = 100;
const COLS: usize = 100;

fn busy_occupancy() -> OccupancyStore {
    let mut occupancy = OccupancyStore::new();
    for row in (0..ROWS).step_by(3) {
        for col in (0..COLS).step_by(2) {
            occupancy.apply_remote(SeatId::new(format!("R{row}-{col}")), SeatStatus::Sold, None);
        }
    }
    occupancy
}

/// Full-frame render of a 10k-seat venue
fn benchmark_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let geometry = fixtures::grid_venue(ROWS, COLS);
    let occupancy = busy_occupancy();
    let selection = Selection::new();
    let engine = RenderEngine::default();

    group.throughput(Throughput::Elements((ROWS * COLS) as u64));

    group.bench_function("zoomed_out_all_visible", |b| {
        let viewport = Viewport::new(0.2, Point::new(0.0, 0.0));
        let mut surface = RecordingSurface::new(1920.0, 1080.0);
        b.iter(|| {
            engine.render(&geometry, &occupancy, &selection, black_box(&viewport), &mut surface)
        });
    });

    group.bench_function("zoomed_in_culled", |b| {
        let viewport = Viewport::new(2.0, Point::new(-500.0, -500.0));
        let mut surface = RecordingSurface::new(1920.0, 1080.0);
        b.iter(|| {
            engine.render(&geometry, &occupancy, &selection, black_box(&viewport), &mut surface)
        });
    });

    group.bench_function("svg_document", |b| {
        let viewport = Viewport::default();
        b.iter(|| {
            let mut surface = SvgSurface::new(1920.0, 1080.0);
            engine.render(&geometry, &occupancy, &selection, &viewport, &mut surface);
            black_box(surface.to_document())
        });
    });

    group.finish();
}

/// Hit-testing the last seat in document order (worst case)
fn benchmark_hit_test(c: &mut Criterion) {
    let geometry = fixtures::grid_venue(ROWS, COLS);
    let viewport = Viewport::new(1.0, Point::new(0.0, 0.0));
    #[allow(clippy::cast_precision_loss)]
    let last = Point::new((COLS - 1) as f64 * 30.0 + 10.0, (ROWS - 1) as f64 * 30.0 + 10.0);

    c.bench_function("hit_test_last_seat", |b| {
        b.iter(|| hit_test_id(&geometry, &viewport, black_box(last)));
    });
}

/// One click through the reducer
fn benchmark_toggle(c: &mut Criterion) {
    let env = SeatMapEnvironment::new(Arc::new(test_clock()), HolderRef::from("bench"));
    let geometry = Arc::new(fixtures::grid_venue(ROWS, COLS));

    c.bench_function("reducer_toggle_seat", |b| {
        let mut state = SeatMapState::new(Arc::clone(&geometry));
        b.iter(|| {
            state.occupancy.advance_tick();
            SeatMapReducer.reduce(
                &mut state,
                black_box(SeatMapAction::ToggleSeat {
                    seat_id: SeatId::from("R50-50"),
                }),
                &env,
            )
        });
    });
}

criterion_group!(benches, benchmark_render, benchmark_hit_test, benchmark_toggle);
criterion_main!(benches);
