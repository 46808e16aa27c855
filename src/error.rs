//! Error types for instrument construction and waveform rebuilds.
//!
//! None of these are produced on the render path: the engine never fails while
//! rendering, it ignores malformed input instead.

use thiserror::Error;

/// Invalid [`EngineConfig`](crate::EngineConfig) values.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("sample rate must be positive and finite, got {0}")]
    SampleRate(f32),

    #[error("table length {0} must be a power of two")]
    TableLength(usize),

    #[error("period {period} must be a power of two that divides the table length {length}")]
    Period { period: usize, length: usize },

    #[error("harmonic count {0} must be between 1 and 64")]
    Harmonics(usize),

    #[error("control factor {0} must be between 1 and 256")]
    ControlFactor(usize),

    #[error("max voices must be at least 1")]
    NoVoices,

    #[error("queue capacity must be at least 1")]
    QueueCapacity,
}

/// Reasons a waveform rebuild was skipped. The engine keeps rendering with the
/// waveform it already has.
#[derive(Debug, Error)]
pub enum RebuildError {
    #[error(
        "spectrum normalization is degenerate for brightness {brightness} and falloff {falloff}"
    )]
    Degenerate { brightness: f32, falloff: f32 },

    #[error("inverse transform failed: {0}")]
    Transform(#[from] realfft::FftError),

    #[error("waveform contains non-finite samples")]
    NonFinite,

    #[error("render thread has not picked up the previous waveform yet")]
    QueueFull,
}

/// Failure to bring up an [`Instrument`](crate::Instrument).
#[derive(Debug, Error)]
pub enum InstrumentError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("initial waveform build failed: {0}")]
    Rebuild(#[from] RebuildError),
}
