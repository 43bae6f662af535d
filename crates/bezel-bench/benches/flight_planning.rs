use bezel_bench::grid_scene;
use bezel_core::FlightPreset;
use bezel_graph::{FlightMapBuilder, FlightPlanner, FlightWeights, Vec2};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn bench_plan_across_grid(c: &mut Criterion) {
    let (graph, landmarks) = grid_scene(50);
    let map = FlightMapBuilder::build(&graph, &landmarks, &FlightWeights::from(FlightPreset::Express));
    let planner = FlightPlanner::default();
    let bounds = graph.bounds();

    c.bench_function("plan_flight_grid_50_corner_to_corner", |b| {
        b.iter(|| {
            let itinerary = planner.plan(
                black_box(&map),
                Vec2::ZERO,
                Vec2::new(490.0, 490.0),
                20.0,
                bounds,
            );
            black_box(itinerary);
        })
    });
}

criterion_group!(benches, bench_plan_across_grid);
criterion_main!(benches);
