use std::sync::Arc;

use rand::Rng;
use rand_pcg::Pcg32;

use crate::{
    config::EngineConfig,
    dsp::{
        envelope::ControlRateEnvelope,
        filter::{self, LadderFilter, LadderGains, MAX_CUTOFF_RATIO},
        lfo::Lfo,
        resample::{Interpolation, RateConverter},
        spectrum::Waveform,
    },
    synth::params::ParamSnapshot,
};

/// Frames a voice renders per inner pass. Bounds the stack scratch.
pub const CHUNK: usize = 256;

/// Rates and sizes every voice of an engine shares.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceContext {
    /// Rate voices render at, after oversampling.
    pub internal_rate: f32,
    pub control_rate: f32,
    pub control_factor: usize,
    pub interpolation: Interpolation,
}

impl VoiceContext {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            internal_rate: config.internal_rate(),
            control_rate: config.control_rate(),
            control_factor: config.control_factor,
            interpolation: config.interpolation,
        }
    }
}

/// Where a new voice sits inside a (possibly unison) note.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceSpawn {
    pub id: u64,
    pub note: u8,
    pub velocity: f32,
    /// Offset from the note, in semitones.
    pub detune: f32,
    pub left_gain: f32,
    pub right_gain: f32,
}

/// One sounding note (or one member of a unison stack).
///
/// Envelope settings are frozen at creation. Filter and LFO settings come from
/// the snapshot passed to every [`produce`](Self::produce) call, so knob moves
/// affect notes that are already playing.
pub struct Voice {
    id: u64,
    note: u8,
    pan: [f32; 2],
    phase: [f64; 2],
    base_step: f64,
    table_length: f64,

    amp_env: ControlRateEnvelope,
    filter_env: Option<ControlRateEnvelope>,
    lfo: Lfo,

    amp_conv: RateConverter,
    warp_conv: RateConverter,
    pitch_conv: RateConverter,

    filters: [LadderFilter; 2],
    waveform: Arc<Waveform>,
    ctx: VoiceContext,
}

impl Voice {
    pub fn new(
        spawn: VoiceSpawn,
        waveform: Arc<Waveform>,
        params: &ParamSnapshot,
        ctx: &VoiceContext,
        rng: &mut Pcg32,
    ) -> Self {
        let table_length = waveform.len() as f64;
        let frequency = 440.0 * ((spawn.note as f64 - 69.0 + spawn.detune as f64) / 12.0).exp2();
        let base_step = frequency * waveform.period() as f64 / ctx.internal_rate as f64;

        let phase = [
            rng.gen::<f64>() * table_length,
            rng.gen::<f64>() * table_length,
        ];

        let amp_env = ControlRateEnvelope::new(
            &params.amplitude_envelope(),
            ctx.control_rate,
            spawn.note,
            spawn.velocity,
        );
        let filter_env = params.filter_envelope().map(|settings| {
            ControlRateEnvelope::new(&settings, ctx.control_rate, spawn.note, spawn.velocity)
        });

        Self {
            id: spawn.id,
            note: spawn.note,
            pan: [spawn.left_gain, spawn.right_gain],
            phase,
            base_step,
            table_length,

            amp_env,
            filter_env,
            lfo: Lfo::new(),

            amp_conv: RateConverter::new(ctx.control_factor, ctx.interpolation),
            warp_conv: RateConverter::new(ctx.control_factor, ctx.interpolation),
            pitch_conv: RateConverter::new(ctx.control_factor, ctx.interpolation),

            filters: [
                LadderFilter::new(ctx.internal_rate),
                LadderFilter::new(ctx.internal_rate),
            ],
            waveform,
            ctx: *ctx,
        }
    }

    /// Render and add into both channels. Renders the shorter length if the
    /// slices differ.
    pub fn produce(&mut self, params: &ParamSnapshot, left: &mut [f32], right: &mut [f32]) {
        let frames = left.len().min(right.len());
        let mut start = 0;
        while start < frames {
            let end = (start + CHUNK).min(frames);
            self.produce_chunk(params, &mut left[start..end], &mut right[start..end]);
            start = end;
        }
    }

    fn produce_chunk(&mut self, params: &ParamSnapshot, left: &mut [f32], right: &mut [f32]) {
        let frames = left.len();
        let ticks = self.amp_conv.ticks_needed(frames);

        let filter = params.filter();
        let lfo = params.lfo();
        let max_cutoff = MAX_CUTOFF_RATIO * self.ctx.internal_rate;
        let sweep = (max_cutoff / filter.cutoff_hz).max(1.0).ln() * filter.modulation_amount;

        let mut amp_ctl = [0.0f32; CHUNK];
        let mut warp_ctl = [0.0f32; CHUNK];
        let mut pitch_ctl = [0.0f32; CHUNK];

        for tick in 0..ticks {
            let level = self.amp_env.tick();
            let filter_level = match &mut self.filter_env {
                Some(env) => env.tick(),
                None => level,
            };
            let wobble = self
                .lfo
                .tick(lfo.shape, lfo.frequency_hz, self.ctx.control_rate);

            let cutoff = filter.cutoff_hz
                * (sweep * filter_level.max(0.0).powf(filter.envelope_amount)).exp()
                * (filter.lfo_octaves * wobble).exp2();

            amp_ctl[tick] = level;
            warp_ctl[tick] = filter::warp(cutoff, self.ctx.internal_rate);
            pitch_ctl[tick] = (lfo.pitch_cents * wobble / 1200.0).exp2();
        }

        let mut amp = [0.0f32; CHUNK];
        let mut warp = [0.0f32; CHUNK];
        let mut pitch = [0.0f32; CHUNK];
        self.amp_conv.expand(&amp_ctl[..ticks], &mut amp[..frames]);
        self.warp_conv.expand(&warp_ctl[..ticks], &mut warp[..frames]);
        self.pitch_conv.expand(&pitch_ctl[..ticks], &mut pitch[..frames]);

        let [left_gain, right_gain] = self.pan;
        let [left_filter, right_filter] = &mut self.filters;
        let waveform = &*self.waveform;

        for i in 0..frames {
            let gains = LadderGains::from_warp(warp[i], filter.spread, filter.feedback);
            let step = self.base_step * pitch[i] as f64;

            let l = waveform.read_cubic(self.phase[0]) * amp[i];
            left[i] += left_filter.process(l, &gains) * left_gain;

            let r = waveform.read_cubic(self.phase[1]) * amp[i];
            right[i] += right_filter.process(r, &gains) * right_gain;

            for phase in self.phase.iter_mut() {
                *phase += step;
                if *phase >= self.table_length {
                    *phase -= self.table_length;
                }
            }
        }
    }

    pub fn note_off(&mut self) {
        self.amp_env.note_off();
        if let Some(env) = &mut self.filter_env {
            env.note_off();
        }
    }

    pub fn terminated(&self) -> bool {
        self.amp_env.terminated()
    }

    /// Note-off has not been received yet.
    pub fn is_held(&self) -> bool {
        self.amp_env.is_alive()
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    /// Give up the waveform reference so the engine can decide where it is
    /// freed.
    pub fn into_waveform(self) -> Arc<Waveform> {
        self.waveform
    }
}
