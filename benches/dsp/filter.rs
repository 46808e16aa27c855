//! Benchmarks for the ladder lowpass.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use gemsynth::dsp::filter::{warp, LadderFilter, LadderGains};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 96_000.0;

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|n| ((n * 37) % 101) as f32 / 50.0 - 1.0).collect();
        let mut buffer = input.clone();

        // Fixed coefficients for the whole block
        let mut filter = LadderFilter::new(SAMPLE_RATE);
        filter.set_params(1_200.0, 1.0, 3.0);
        group.bench_with_input(BenchmarkId::new("static", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.render(black_box(&mut buffer));
            })
        });

        // Coefficients recomputed every sample, as a modulated voice does
        let mut filter = LadderFilter::new(SAMPLE_RATE);
        group.bench_with_input(BenchmarkId::new("modulated", size), &size, |b, _| {
            b.iter(|| {
                for (n, sample) in buffer.iter_mut().enumerate() {
                    let g = warp(500.0 + n as f32 * 10.0, SAMPLE_RATE);
                    let gains = LadderGains::from_warp(g, 1.2, 3.0);
                    *sample = filter.process(black_box(input[n]), &gains);
                }
            })
        });
    }

    group.finish();
}
