//! Benchmarks for whole engine blocks.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use gemsynth::{EngineConfig, Instrument, NoteEvent, ParamId};

use crate::BLOCK_SIZES;

pub fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/engine");

    for &size in BLOCK_SIZES {
        let mut left = vec![0.0f32; size];
        let mut right = vec![0.0f32; size];

        for (name, notes, unison) in [("chord_4", 4u8, 1.0), ("unison_pad_8x3", 8, 3.0)] {
            let Ok((mut engine, mut controller)) = Instrument::new(EngineConfig::default()) else {
                return;
            };
            let _ = controller.set_parameter(ParamId::UnisonVoices, unison);
            let _ = controller.set_parameter(ParamId::Decay, 10_000.0);

            let chord: Vec<NoteEvent> = (0..notes)
                .map(|i| NoteEvent::note_on(0, 48 + 3 * i, 0.8))
                .collect();
            engine.render(&chord, &mut left, &mut right);

            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    engine.render(&[], black_box(&mut left), black_box(&mut right));
                })
            });
        }
    }

    group.finish();
}
