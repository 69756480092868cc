use criterion::{Criterion, black_box, criterion_group, criterion_main};
use spotter::workout::{
    ExerciseKind, PositionLabel, RepCounter, SampleRecord, SessionInfo, SessionOutput,
};
use std::time::Duration;

fn label_stream(len: usize) -> Vec<PositionLabel> {
    // a plausible workout: settle, go down, come up, with some classifier noise
    let cycle = [
        PositionLabel::Neutral,
        PositionLabel::Down,
        PositionLabel::Down,
        PositionLabel::Up,
        PositionLabel::Up,
    ];
    (0..len).map(|i| cycle[i % cycle.len()]).collect()
}

fn bench_transition_rule(c: &mut Criterion) {
    let mut group = c.benchmark_group("rep_counter");

    let labels = label_stream(1000);

    group.bench_function("apply_1000_labels", |b| {
        b.iter(|| {
            let mut counter = RepCounter::new();
            counter.select_exercise(ExerciseKind::Pushup);
            counter.start();
            for label in &labels {
                black_box(counter.apply_label(*label));
                counter.clear_cooldown(counter.cooldown_epoch());
            }
            black_box(counter.rep_count())
        });
    });

    group.bench_function("snapshot", |b| {
        let mut counter = RepCounter::new();
        counter.select_exercise(ExerciseKind::Squat);
        b.iter(|| black_box(counter.snapshot()));
    });

    group.finish();
}

fn bench_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialization");

    let output = SessionOutput::Sample(Box::new(SampleRecord {
        sample_no: 42,
        timestamp_ms: 42_000,
        label: PositionLabel::Up,
        rep_counted: true,
        rep_count: 17,
        cooldown_active: true,
        feedback: "Rep 17! Keep it up.".to_string(),
    }));

    group.bench_function("serialize_sample", |b| {
        b.iter(|| black_box(serde_json::to_string(&output).unwrap()));
    });

    let json = serde_json::to_string(&output).unwrap();
    group.bench_function("deserialize_sample", |b| {
        b.iter(|| black_box(serde_json::from_str::<SessionOutput>(&json).unwrap()));
    });

    let change = SessionOutput::SessionChange(SessionInfo {
        exercise: Some(ExerciseKind::PullUp),
        sample_interval_ms: 1000,
        cooldown_ms: 500,
    });
    group.bench_function("serialize_session_change", |b| {
        b.iter(|| black_box(serde_json::to_string(&change).unwrap()));
    });

    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(10))
        .sample_size(100);
    targets = bench_transition_rule, bench_serialization
}
criterion_main!(benches);
