use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gridsearch::{GridMap, PathFinder, Point, StepResult};

/// An open grid, optionally with a comb of walls that forces a winding path
fn build_map(size: usize, walls: bool) -> GridMap {
    let mut map = GridMap::new(size);

    if walls {
        for col in (2..size - 1).step_by(4) {
            for row in 0..size - 1 {
                map.set_wall(Point::new(row, col));
            }
        }
        for col in (4..size - 1).step_by(4) {
            for row in 1..size {
                map.set_wall(Point::new(row, col));
            }
        }
    }

    map.set_start(Point::new(0, 0));
    map.set_end(Point::new(size - 1, size - 1));
    map
}

fn bench_map(c: &mut Criterion, size: usize, walls: bool) {
    let map = build_map(size, walls);
    let name = if walls { "walled" } else { "open" };

    c.bench_function(&format!("map_{}_{}", name, size), |b| {
        b.iter(|| {
            let mut map = map.clone();
            let mut finder = PathFinder::new();
            finder.start(black_box(&mut map)).unwrap();
            let res = finder.finish(&mut map).unwrap();
            assert_eq!(res, StepResult::Found);
        })
    });
}

pub fn map_small(c: &mut Criterion) {
    bench_map(c, 20, false);
    bench_map(c, 20, true);
}

pub fn map_medium(c: &mut Criterion) {
    bench_map(c, 100, false);
    bench_map(c, 100, true);
}

pub fn map_large(c: &mut Criterion) {
    bench_map(c, 400, false);
    bench_map(c, 400, true);
}

criterion_group!(benches, map_small, map_medium, map_large);
criterion_main!(benches);
