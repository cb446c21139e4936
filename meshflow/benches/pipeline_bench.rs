//! Benchmarks for invocation planning.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use meshflow::prelude::*;

fn config() -> PipelineConfig {
    PipelineConfig::builder()
        .input_dir("/data/photos")
        .output_dir("/data/out")
        .temp_root("/scratch")
        .max_threads(8)
        .build()
        .unwrap_or_else(|e| panic!("bench config rejected: {e}"))
}

fn planning_benchmark(c: &mut Criterion) {
    let runner = PipelineRunner::new(config(), Capabilities::local());
    c.bench_function("plan_full_pipeline", |b| b.iter(|| black_box(runner.plan())));

    let config = config();
    let layout = RunLayout {
        input_dir: "/data/photos".into(),
        output_dir: "/data/out".into(),
        build_dir: "/data/out/build".into(),
        matches_dir: "/scratch/meshflow-matches-0".into(),
        reconstruction_dir: "/scratch/meshflow-reconstruction-0".into(),
        camera_database: "/data/sensors.txt".into(),
    };
    let sfm = StageSequencer::sfm();
    c.bench_function("plan_sfm_sequencer", |b| {
        b.iter(|| black_box(sfm.plan(&StageInputs::new(&config, &layout))))
    });
}

criterion_group!(benches, planning_benchmark);
criterion_main!(benches);
