use breach_core::mocks::{ConstAccelerometer, RecordingDrivetrain};
use breach_core::{AutonCfg, MachineCfg, MovingAverage, NullTelemetry, Phase, build_controller, step};
use breach_traits::clock::test_clock::TestClock;
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use std::sync::Arc;
use std::time::Duration;

// Accelerometer-like trace: 1 g with a tilted stretch and additive noise
fn synth_trace(n: usize, noise_amp: f64, seed: u32) -> Vec<f64> {
    let mut state = seed.max(1);
    let mut next = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        f64::from(x) / (f64::from(u32::MAX) + 1.0)
    };
    (0..n)
        .map(|i| {
            let tilt = if (n / 3..2 * n / 3).contains(&i) { 0.966 } else { 1.0 };
            tilt + (next() * 2.0 - 1.0) * noise_amp
        })
        .collect()
}

fn configure(g: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>) {
    // Allow quick tweaking without CLI flags (Criterion 0.5):
    //   BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p breach_core --bench cycle
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE")
        && let Ok(n) = ss.parse::<usize>()
    {
        g.sample_size(n.max(10));
    } else {
        g.sample_size(50);
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(Duration::from_millis(ms_u64));
    }
}

pub fn bench_filter(c: &mut Criterion) {
    let mut g = c.benchmark_group("moving_average");
    configure(&mut g);
    let trace = synth_trace(10_000, 0.01, 0xC0FFEE);
    for &window in &[4usize, 8, 32] {
        g.bench_function(format!("window_{window}"), |b| {
            b.iter_batched(
                || MovingAverage::new(window, 1.0),
                |mut f| {
                    for &s in &trace {
                        black_box(f.add_and_average(black_box(s)));
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }
    g.finish();
}

pub fn bench_cycle(c: &mut Criterion) {
    let mut g = c.benchmark_group("cycle");
    configure(&mut g);
    let cfg = MachineCfg::default();
    g.bench_function("machine_step", |b| {
        b.iter(|| {
            black_box(step(
                black_box(Phase::Approach),
                black_box(true),
                black_box(Duration::from_millis(700)),
                &cfg,
            ))
        })
    });

    let trace = synth_trace(10_000, 0.01, 0xBEEF);
    g.bench_function("controller_step_with_sample", |b| {
        b.iter_batched(
            || {
                let mut ctl = build_controller(
                    ConstAccelerometer(1.0),
                    RecordingDrivetrain::new(),
                    NullTelemetry,
                    AutonCfg::default(),
                    Some(Arc::new(TestClock::new())),
                )
                .expect("controller");
                ctl.reset().expect("reset");
                ctl
            },
            |mut ctl| {
                for &s in &trace {
                    black_box(ctl.step_with_sample(black_box(s)).ok());
                }
            },
            BatchSize::SmallInput,
        )
    });
    g.finish();
}

criterion_group!(cycle, bench_filter, bench_cycle);
criterion_main!(cycle);
