//! Low-level DSP primitives used by the voices.
//!
//! These components are allocation-free and realtime-safe once constructed,
//! making them safe to embed directly inside voice structs. The one exception
//! is the spectral waveform builder, which allocates and is only ever run off
//! the render thread.

/// 2:1 decimation for the oversampled voice mix.
pub mod downsample;
/// Exponential attack/decay/sustain/release evaluated at control rate.
pub mod envelope;
/// Four-stage nonlinear ladder lowpass.
pub mod filter;
/// Per-voice low frequency oscillator.
pub mod lfo;
/// Control-rate to audio-rate expansion.
pub mod resample;
/// Seeded PCG32 generators.
pub mod rng;
/// Additive waveform tables built by inverse FFT.
pub mod spectrum;

pub use envelope::ControlRateEnvelope;
pub use filter::LadderFilter;
pub use resample::{Interpolation, RateConverter};
pub use spectrum::{SpectralWaveformBuilder, SpectrumParameters, Waveform};
