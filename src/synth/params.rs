//! The instrument's parameter table.
//!
//! Values live as `f32` bit patterns in atomics shared between the controller
//! and the render thread. The render thread never waits on the controller: it
//! copies every value into a [`ParamSnapshot`] once per block and works from
//! that copy.

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use crate::dsp::{envelope::EnvelopeSettings, lfo::LfoShape, spectrum::SpectrumParameters};

pub const PARAM_COUNT: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamId {
    Brightness,
    Falloff,
    TwoFactor,
    ThreeFactor,
    FiveFactor,
    SevenFactor,
    HigherFactor,
    Bandwidth,
    BandwidthExponent,
    RandomSeed,
    Burst,
    Attack,
    Decay,
    Sustain,
    Release,
    KeyFollow,
    Cutoff,
    Spread,
    EnvelopeAmount,
    ModulationAmount,
    FilterLfo,
    Feedback,
    FilterDecay,
    FilterSustain,
    LfoShape,
    LfoFrequency,
    PitchLfo,
    UnisonVoices,
    UnisonDetune,
    UnisonWidth,
}

/// Static description of one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamInfo {
    pub id: ParamId,
    pub name: &'static str,
    pub symbol: &'static str,
    pub default: f32,
    pub min: f32,
    pub max: f32,
    /// Only whole numbers are meaningful.
    pub integer: bool,
    /// Hosts should present the range on a log scale.
    pub logarithmic: bool,
}

const fn param(
    id: ParamId,
    name: &'static str,
    symbol: &'static str,
    default: f32,
    min: f32,
    max: f32,
) -> ParamInfo {
    ParamInfo {
        id,
        name,
        symbol,
        default,
        min,
        max,
        integer: false,
        logarithmic: false,
    }
}

const fn integer(info: ParamInfo) -> ParamInfo {
    ParamInfo {
        integer: true,
        ..info
    }
}

const fn log(info: ParamInfo) -> ParamInfo {
    ParamInfo {
        logarithmic: true,
        ..info
    }
}

use ParamId as P;

pub static PARAMS: [ParamInfo; PARAM_COUNT] = [
    param(P::Brightness, "Brightness", "brightness", 0.0, 0.0, 4.0),
    param(P::Falloff, "Falloff", "falloff", 1.0, 0.75, 4.0),
    param(P::TwoFactor, "Two", "two", 1.0, 0.0, 2.0),
    param(P::ThreeFactor, "Three", "three", 1.0, 0.0, 2.0),
    param(P::FiveFactor, "Five", "five", 1.0, 0.0, 2.0),
    param(P::SevenFactor, "Seven", "seven", 1.0, 0.0, 2.0),
    param(P::HigherFactor, "Higher", "higher", 1.0, 0.0, 2.0),
    param(P::Bandwidth, "Bandwidth", "bandwidth", 10.0, 0.0, 100.0),
    param(P::BandwidthExponent, "Bandwidth exponent", "bwexp", 1.0, 0.0, 2.0),
    integer(param(P::RandomSeed, "Random seed", "seed", 0.0, 0.0, 9999.0)),
    param(P::Burst, "Burst", "burst", 1.0, 0.0, 1.0),
    log(param(P::Attack, "Attack", "attack", 10.0, 0.1, 1000.0)),
    log(param(P::Decay, "Decay", "decay", 1000.0, 0.1, 10000.0)),
    param(P::Sustain, "Sustain", "sustain", 0.5, 0.0, 1.0),
    log(param(P::Release, "Release", "release", 200.0, 0.1, 10000.0)),
    param(P::KeyFollow, "Key follow", "keyfollow", 0.0, 0.0, 1.0),
    log(param(P::Cutoff, "Cutoff", "cutoff", 2000.0, 20.0, 20000.0)),
    param(P::Spread, "Spread", "spread", 1.0, 0.5, 2.0),
    log(param(P::EnvelopeAmount, "Envelope amount", "envamount", 1.0, 0.25, 8.0)),
    param(P::ModulationAmount, "Modulation amount", "modamount", 0.5, 0.0, 1.0),
    param(P::FilterLfo, "Filter LFO", "filterlfo", 0.0, 0.0, 4.0),
    param(P::Feedback, "Feedback", "feedback", 0.0, 0.0, 4.0),
    param(P::FilterDecay, "Filter decay", "fdecay", 0.0, 0.0, 10000.0),
    param(P::FilterSustain, "Filter sustain", "fsustain", 0.5, 0.0, 1.0),
    integer(param(P::LfoShape, "LFO shape", "lfoshape", 0.0, 0.0, 3.0)),
    log(param(P::LfoFrequency, "LFO frequency", "lfofreq", 1.0, 0.01, 20.0)),
    param(P::PitchLfo, "Pitch LFO", "pitchlfo", 0.0, 0.0, 100.0),
    integer(param(P::UnisonVoices, "Unison voices", "univoices", 1.0, 1.0, 10.0)),
    log(param(P::UnisonDetune, "Unison detune", "unidetune", 10.0, 0.1, 100.0)),
    param(P::UnisonWidth, "Unison width", "uniwidth", 1.0, 0.0, 1.0),
];

impl ParamId {
    pub fn all() -> impl Iterator<Item = ParamId> {
        PARAMS.iter().map(|info| info.id)
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn info(self) -> &'static ParamInfo {
        &PARAMS[self.index()]
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        PARAMS.iter().find(|info| info.symbol == symbol).map(|info| info.id)
    }

    /// Changing this parameter requires a new waveform.
    pub fn affects_spectrum(self) -> bool {
        self <= ParamId::RandomSeed
    }
}

impl ParamInfo {
    /// Bring a host value into range. Non-finite values are rejected.
    pub fn sanitize(&self, value: f32) -> Option<f32> {
        if !value.is_finite() {
            return None;
        }
        let value = if self.integer { value.round() } else { value };
        Some(value.clamp(self.min, self.max))
    }
}

/// Lock-free parameter storage shared by the controller and the engine.
#[derive(Debug, Clone)]
pub struct SharedParams {
    values: Arc<[AtomicU32; PARAM_COUNT]>,
}

impl Default for SharedParams {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedParams {
    pub fn new() -> Self {
        Self {
            values: Arc::new(std::array::from_fn(|i| {
                AtomicU32::new(PARAMS[i].default.to_bits())
            })),
        }
    }

    #[inline]
    pub fn get(&self, id: ParamId) -> f32 {
        f32::from_bits(self.values[id.index()].load(Ordering::Relaxed))
    }

    /// Store a sanitized value. Returns whether the stored value changed.
    pub fn set(&self, id: ParamId, value: f32) -> bool {
        let Some(value) = id.info().sanitize(value) else {
            return false;
        };
        let previous = self.values[id.index()].swap(value.to_bits(), Ordering::Relaxed);
        previous != value.to_bits()
    }

    pub fn snapshot(&self) -> ParamSnapshot {
        ParamSnapshot {
            values: std::array::from_fn(|i| {
                f32::from_bits(self.values[i].load(Ordering::Relaxed))
            }),
        }
    }
}

/// Plain copy of every parameter, taken once per block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSnapshot {
    values: [f32; PARAM_COUNT],
}

impl Default for ParamSnapshot {
    fn default() -> Self {
        Self {
            values: std::array::from_fn(|i| PARAMS[i].default),
        }
    }
}

impl ParamSnapshot {
    #[inline]
    pub fn get(&self, id: ParamId) -> f32 {
        self.values[id.index()]
    }

    pub fn set(&mut self, id: ParamId, value: f32) {
        if let Some(value) = id.info().sanitize(value) {
            self.values[id.index()] = value;
        }
    }

    pub fn spectrum(&self) -> SpectrumParameters {
        SpectrumParameters {
            brightness: self.get(P::Brightness),
            falloff: self.get(P::Falloff),
            two_factor: self.get(P::TwoFactor),
            three_factor: self.get(P::ThreeFactor),
            five_factor: self.get(P::FiveFactor),
            seven_factor: self.get(P::SevenFactor),
            higher_factor: self.get(P::HigherFactor),
            bandwidth: self.get(P::Bandwidth),
            bandwidth_exponent: self.get(P::BandwidthExponent),
            seed: self.get(P::RandomSeed) as u32,
        }
    }

    pub fn amplitude_envelope(&self) -> EnvelopeSettings {
        EnvelopeSettings {
            attack_ms: self.get(P::Attack),
            decay_ms: self.get(P::Decay),
            sustain: self.get(P::Sustain),
            release_ms: self.get(P::Release),
            burst: self.get(P::Burst),
            key_follow: self.get(P::KeyFollow),
        }
    }

    /// Separate filter envelope, or `None` when the filter follows the
    /// amplitude envelope.
    pub fn filter_envelope(&self) -> Option<EnvelopeSettings> {
        let decay_ms = self.get(P::FilterDecay);
        (decay_ms > 0.0).then(|| EnvelopeSettings {
            decay_ms,
            sustain: self.get(P::FilterSustain),
            ..self.amplitude_envelope()
        })
    }

    pub fn filter(&self) -> FilterSettings {
        FilterSettings {
            cutoff_hz: self.get(P::Cutoff),
            spread: self.get(P::Spread),
            envelope_amount: self.get(P::EnvelopeAmount),
            modulation_amount: self.get(P::ModulationAmount),
            lfo_octaves: self.get(P::FilterLfo),
            feedback: self.get(P::Feedback),
        }
    }

    pub fn lfo(&self) -> LfoSettings {
        LfoSettings {
            shape: LfoShape::from_value(self.get(P::LfoShape)),
            frequency_hz: self.get(P::LfoFrequency),
            pitch_cents: self.get(P::PitchLfo),
        }
    }

    pub fn unison(&self) -> UnisonSettings {
        UnisonSettings {
            voices: self.get(P::UnisonVoices) as usize,
            detune_cents: self.get(P::UnisonDetune),
            width: self.get(P::UnisonWidth),
        }
    }
}

/// Live filter controls, read every block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSettings {
    pub cutoff_hz: f32,
    pub spread: f32,
    /// Exponent applied to the envelope before it sweeps the cutoff.
    pub envelope_amount: f32,
    /// Fraction of the way from the cutoff to the top of the range the
    /// envelope can push.
    pub modulation_amount: f32,
    pub lfo_octaves: f32,
    pub feedback: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LfoSettings {
    pub shape: LfoShape,
    pub frequency_hz: f32,
    pub pitch_cents: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnisonSettings {
    pub voices: usize,
    pub detune_cents: f32,
    pub width: f32,
}

impl UnisonSettings {
    /// Detune in semitones and (left, right) gains for unison member `index`.
    pub fn member(&self, index: usize) -> (f32, f32, f32) {
        let count = self.voices.max(1);
        if count == 1 {
            return (0.0, 1.0, 1.0);
        }

        let t = 2.0 * index as f32 / (count - 1) as f32 - 1.0;
        let detune = 0.01 * t * self.detune_cents;
        let n = count as f32;
        // down-detuned members lean right
        let left = (1.0 + t * self.width) / n;
        let right = (1.0 - t * self.width) / n;
        (detune, left, right)
    }
}
