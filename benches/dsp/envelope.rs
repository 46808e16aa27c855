//! Benchmarks for the control-rate energy envelope.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use gemsynth::dsp::envelope::{ControlRateEnvelope, EnvelopeSettings};

use crate::BLOCK_SIZES;

const CONTROL_RATE: f32 = 3_000.0;

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");
    let settings = EnvelopeSettings::default();

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Attack and decay (key held)
        let mut env = ControlRateEnvelope::new(&settings, CONTROL_RATE, 60, 1.0);
        group.bench_with_input(BenchmarkId::new("held", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer));
            })
        });

        // Release
        let mut env = ControlRateEnvelope::new(&settings, CONTROL_RATE, 60, 1.0);
        env.note_off();
        group.bench_with_input(BenchmarkId::new("release", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
