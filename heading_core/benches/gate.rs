use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use heading_core::gate::select_nearest;
use heading_core::{DetectionGate, MarkerCandidate};
use std::time::Instant;

// Synthetic frame: `n` candidates with pseudo-random distances, a few malformed.
fn synth_frame(n: usize, seed: u32) -> Vec<MarkerCandidate> {
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
            if i % 17 == 0 {
                MarkerCandidate {
                    id: Some(i as i64),
                    distance_m: None,
                }
            } else {
                MarkerCandidate::new(i as i64, next() * 4.0)
            }
        })
        .collect()
}

pub fn bench_gate(c: &mut Criterion) {
    let mut g = c.benchmark_group("gate");
    //   BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p heading_core --bench gate
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(n) = ss.parse::<usize>() {
            g.sample_size(n.max(1));
        }
    } else {
        g.sample_size(50);
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(std::time::Duration::from_millis(ms_u64));
    }

    for &n in &[1usize, 8, 64] {
        let frame = synth_frame(n, 0xC0FFEE);
        g.bench_function(format!("select_nearest_{n}"), |b| {
            b.iter(|| black_box(select_nearest(black_box(&frame))));
        });
        g.bench_function(format!("submit_rearm_{n}"), |b| {
            b.iter_batched(
                DetectionGate::new,
                |gate| {
                    let m = gate.submit(black_box(&frame), Instant::now());
                    gate.rearm();
                    black_box(m);
                },
                BatchSize::SmallInput,
            )
        });
    }

    // Suppressed fast path: what every frame costs during a maneuver.
    let frame = synth_frame(8, 7);
    let gate = DetectionGate::suppressed();
    g.bench_function("submit_suppressed", |b| {
        b.iter(|| black_box(gate.submit(black_box(&frame), Instant::now())));
    });
    g.finish();
}

criterion_group!(gate, bench_gate);
criterion_main!(gate);
