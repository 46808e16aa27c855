//! Benchmarks for a single voice's full signal path.

use std::{hint::black_box, sync::Arc};

use criterion::{BenchmarkId, Criterion};
use gemsynth::{
    dsp::{rng::create_rng, spectrum::SpectralWaveformBuilder},
    synth::{
        params::{ParamId, ParamSnapshot},
        voice::{Voice, VoiceContext, VoiceSpawn},
    },
    EngineConfig,
};

use crate::BLOCK_SIZES;

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");

    let config = EngineConfig::default();
    let ctx = VoiceContext::from_config(&config);
    let mut builder = SpectralWaveformBuilder::from_config(&config);
    let Ok(waveform) = builder.build(&ParamSnapshot::default().spectrum()) else {
        return;
    };
    let waveform = Arc::new(waveform);
    let mut rng = create_rng(1);

    let spawn = VoiceSpawn {
        id: 0,
        note: 45,
        velocity: 0.8,
        detune: 0.0,
        left_gain: 1.0,
        right_gain: 1.0,
    };

    // plain: defaults, filter follows the amplitude envelope
    let plain = ParamSnapshot::default();

    // modulated: separate filter envelope, resonant, with vibrato and filter LFO
    let mut modulated = ParamSnapshot::default();
    modulated.set(ParamId::FilterDecay, 300.0);
    modulated.set(ParamId::Feedback, 3.5);
    modulated.set(ParamId::FilterLfo, 1.0);
    modulated.set(ParamId::PitchLfo, 20.0);
    modulated.set(ParamId::LfoFrequency, 5.0);

    for &size in BLOCK_SIZES {
        // internal rate is twice the output rate
        let internal = size * config.oversampling();
        let mut left = vec![0.0f32; internal];
        let mut right = vec![0.0f32; internal];

        for (name, params) in [("plain", &plain), ("modulated", &modulated)] {
            let mut voice = Voice::new(spawn, waveform.clone(), params, &ctx, &mut rng);
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    voice.produce(params, black_box(&mut left), black_box(&mut right));
                })
            });
        }
    }

    group.finish();
}
