//! Benchmarks for waveform table synthesis and reads.
//!
//! Rebuilds run on the control thread, so they are measured against the
//! time a user is willing to wait after moving a knob, not an audio deadline.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use gemsynth::dsp::spectrum::{SpectralWaveformBuilder, SpectrumParameters};

use crate::BLOCK_SIZES;

pub fn bench_spectrum(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/spectrum");

    for length in [16_384, 65_536] {
        let mut builder = SpectralWaveformBuilder::new(length, 256, 64);
        let params = SpectrumParameters {
            seed: 7,
            ..SpectrumParameters::default()
        };
        group.bench_with_input(BenchmarkId::new("build", length), &length, |b, _| {
            b.iter(|| builder.build(black_box(&params)))
        });
    }

    let mut builder = SpectralWaveformBuilder::new(65_536, 256, 64);
    if let Ok(waveform) = builder.build(&SpectrumParameters::default()) {
        for &size in BLOCK_SIZES {
            let mut buffer = vec![0.0f32; size];
            group.bench_with_input(BenchmarkId::new("read_cubic", size), &size, |b, _| {
                let mut phase = 0.0f64;
                b.iter(|| {
                    for sample in buffer.iter_mut() {
                        *sample = waveform.read_cubic(black_box(phase));
                        phase = (phase + 5.4321) % waveform.len() as f64;
                    }
                })
            });
        }
    }

    group.finish();
}
