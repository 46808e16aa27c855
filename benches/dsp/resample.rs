//! Benchmarks for control-rate to audio-rate expansion.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use gemsynth::dsp::resample::{Interpolation, RateConverter};

use crate::BLOCK_SIZES;

const FACTOR: usize = 32;

pub fn bench_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/resample");

    for &size in BLOCK_SIZES {
        let control: Vec<f32> = (0..size / FACTOR).map(|n| (n as f32 * 0.3).sin()).collect();
        let mut buffer = vec![0.0f32; size];

        for interpolation in [Interpolation::Hold, Interpolation::Linear, Interpolation::Cubic] {
            let mut converter = RateConverter::new(FACTOR, interpolation);
            let name = format!("{interpolation:?}").to_lowercase();
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    converter.expand(black_box(&control), black_box(&mut buffer));
                })
            });
        }
    }

    group.finish();
}
