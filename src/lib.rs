pub mod config;
pub mod dsp;
pub mod error;
pub mod io;
pub mod preset;
pub mod synth; // Voices, voice pool, engine and the control-thread side

pub use config::EngineConfig;
pub use error::{ConfigError, InstrumentError, RebuildError};
pub use preset::Preset;
pub use synth::{
    controller::Controller,
    engine::Engine,
    message::{NoteEvent, NoteEventKind},
    params::ParamId,
    Instrument,
};

/// Largest number of output frames rendered in one internal chunk.
///
/// `Engine::render` accepts longer blocks and splits them; the mix buffers are
/// sized from this constant at construction.
pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME_MS: f32 = 0.1;
