//! Benchmark of single download cycles over localhost, one per client
//! configuration.

use criterion::*;
use httpbench::{
    config::default_configs,
    engine::Workload,
    files::file_names,
    fixture::Fixture,
    runner::Downloads,
};
use httpbench_benchmarks::{spawn_origin, FILE_SIZE};
use std::env;

fn benchmark(c: &mut Criterion) {
    let (_server, origin) = spawn_origin();
    let mut group = c.benchmark_group("download 10x64K");

    group.throughput(Throughput::Bytes((FILE_SIZE * file_names().len()) as u64));
    group.sample_size(20);

    for config in default_configs() {
        let fixture = Fixture::new(env::temp_dir().join(format!("httpbench-{}", config.slug())));
        let name = config.name().to_owned();
        let downloads = Downloads::new(config, origin.clone(), file_names());

        group.bench_function(name.as_str(), |b| {
            b.iter_batched(
                || fixture.setup().unwrap(),
                |()| downloads.run_cycle(fixture.path()).unwrap(),
                BatchSize::PerIteration,
            )
        });

        fixture.teardown().unwrap();
    }

    group.finish();
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
