//! Benchmarks for rendering and reproduction.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use shape_painter::{
    compute::{Chromosome, evolution::GenomeRng},
    schema::ImageConfig,
};

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");

    for shape_count in [50, 200, 800] {
        let config = ImageConfig {
            shape_count,
            ..Default::default()
        };
        let mut rng = GenomeRng::new(42);
        let image = Chromosome::random(&config, &mut rng);

        group.bench_with_input(
            BenchmarkId::from_parameter(shape_count),
            &shape_count,
            |b, _| {
                b.iter(|| black_box(image.render(&config)));
            },
        );
    }

    group.finish();
}

fn bench_crossover(c: &mut Criterion) {
    let mut group = c.benchmark_group("crossover");

    for shape_count in [50, 200, 800] {
        let config = ImageConfig {
            shape_count,
            ..Default::default()
        };
        let mut rng = GenomeRng::new(7);
        let parent1 = Chromosome::random(&config, &mut rng);
        let parent2 = Chromosome::random(&config, &mut rng);

        group.bench_with_input(
            BenchmarkId::from_parameter(shape_count),
            &shape_count,
            |b, _| {
                b.iter(|| {
                    black_box(Chromosome::crossover(
                        &parent1, &parent2, &config, &mut rng,
                    ))
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_render, bench_crossover);
criterion_main!(benches);
