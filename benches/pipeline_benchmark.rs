use criterion::{black_box, criterion_group, criterion_main, Criterion};
use persona_predict::{Artifacts, Predictor, RawInput};
use std::path::{Path, PathBuf};

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/artifacts")
}

fn bench_loading(c: &mut Criterion) {
    let mut group = c.benchmark_group("Loading");
    group.sample_size(50);

    group.bench_function("load_artifacts", |b| b.iter(|| {
        Artifacts::load(black_box(fixtures_dir())).unwrap()
    }));

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let predictor = Predictor::from_dir(fixtures_dir()).unwrap();
    let mut group = c.benchmark_group("Prediction");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    let defaults = RawInput::default();
    group.bench_function("predict_defaults", |b| b.iter(|| {
        predictor.predict(black_box(&defaults)).unwrap()
    }));

    let unknown = RawInput {
        stage_fear: "Sometimes".into(),
        ..RawInput::default()
    };
    group.bench_function("respond_unknown_category", |b| b.iter(|| {
        predictor.respond(black_box(&unknown))
    }));

    group.finish();
}

criterion_group!(
    benches,
    bench_loading,
    bench_prediction
);
criterion_main!(benches);
