//! Tick benchmark: mapping cost alone, and one full tick against the
//! simulated bus (read present + write goal for three actuators).

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use servo_common::control::ControlConfig;
use servo_common::hal::config::{ActuatorConfig, StartupConfig};
use servo_common::input::InputSnapshot;
use servo_control::cycle::ControlLoop;
use servo_control::input::IdleInput;
use servo_control::mapping;
use servo_hal::ActuatorSet;
use servo_hal::drivers::simulation::SimulatedBus;
use std::hint::black_box;
use std::sync::Arc;

fn snapshots() -> Vec<(&'static str, InputSnapshot)> {
    vec![
        ("neutral", InputSnapshot::neutral()),
        ("axis", InputSnapshot::neutral().with_axis(0, -0.73)),
        (
            "axis_and_buttons",
            InputSnapshot::neutral()
                .with_axis(0, 0.42)
                .with_button(4, true)
                .with_button(5, true),
        ),
    ]
}

fn bench_mapping(c: &mut Criterion) {
    let config = ControlConfig::default();
    let mut group = c.benchmark_group("mapping");
    for (name, snapshot) in snapshots() {
        group.bench_with_input(BenchmarkId::from_parameter(name), &snapshot, |b, snap| {
            b.iter(|| mapping::plan(black_box(snap), black_box(&config)))
        });
    }
    group.finish();
}

fn bench_tick(c: &mut Criterion) {
    let bus = Arc::new(SimulatedBus::new());
    let set = ActuatorSet::acquire(
        bus.clone(),
        &ActuatorConfig::default_set(),
        &StartupConfig::default(),
    )
    .expect("acquire");
    let control = ControlLoop::new(set, Box::new(IdleInput), ControlConfig::default());

    let mut group = c.benchmark_group("tick");
    for (name, snapshot) in snapshots() {
        group.bench_with_input(BenchmarkId::from_parameter(name), &snapshot, |b, snap| {
            b.iter(|| {
                bus.clear_log();
                control.apply(black_box(snap))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_mapping, bench_tick);
criterion_main!(benches);
