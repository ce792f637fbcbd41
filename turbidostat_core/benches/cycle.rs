use std::time::Duration;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use turbidostat_core::codec::decode_reading;
use turbidostat_core::codec::encode_reading;
use turbidostat_core::od::compute_od;
use turbidostat_core::{ControlCfg, Controller, GrowthTestCfg, RawReading};

// Synthetic receiver trace drifting around a fixed blank
fn synth_frames(n: usize, seed: u32) -> Vec<[u8; 8]> {
    let mut state = seed.max(1);
    let mut next = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        x
    };
    (0..n)
        .map(|_| encode_reading(RawReading::new(40_000, 9_000 + next() % 3_000)))
        .collect()
}

fn configure(g: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>) {
    // BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p turbidostat_core --bench cycle
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(n) = ss.parse::<usize>() {
            g.sample_size(n.max(10));
        }
    } else {
        g.sample_size(50);
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(Duration::from_millis(ms_u64));
    }
}

pub fn bench_decide(c: &mut Criterion) {
    let mut g = c.benchmark_group("cycle");
    configure(&mut g);

    let frames = synth_frames(10_000, 0xC0FFEE);
    let blank = RawReading::new(40_000, 30_000);

    for &growth in &[false, true] {
        g.bench_function(format!("decode_od_decide_growth_{growth}"), |b| {
            b.iter_batched(
                || {
                    let control = ControlCfg {
                        growth_test_enabled: growth,
                        ..ControlCfg::default()
                    };
                    Controller::new(&control, &GrowthTestCfg::default(), 0.0)
                },
                |mut ctrl| {
                    let mut t = Duration::from_secs(1_700_000_000);
                    for f in &frames {
                        let raw = decode_reading(black_box(f)).unwrap_or(blank);
                        let od = compute_od(raw, blank).unwrap_or(1.0);
                        black_box(ctrl.decide(od, t));
                        t += Duration::from_secs(60);
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }
    g.finish();
}

criterion_group!(cycle, bench_decide);
criterion_main!(cycle);
