// Purpose: Voice management, polyphony, parameter plumbing
// This layer sits above the dsp primitives and owns the render/control split

pub mod controller;
pub mod engine;
pub mod message;
pub mod params;
pub mod pool;
pub mod voice;

use std::sync::Arc;

use rtrb::RingBuffer;
use tracing::info;

use crate::{
    config::EngineConfig,
    dsp::spectrum::SpectralWaveformBuilder,
    error::InstrumentError,
    synth::{controller::Controller, engine::Engine, params::SharedParams},
};

/// Entry point that wires an [`Engine`] to its [`Controller`].
pub struct Instrument;

impl Instrument {
    /// Validate `config`, build the initial waveform from the default
    /// parameters and connect both halves.
    ///
    /// The engine goes to the audio thread, the controller stays wherever
    /// parameters are edited.
    pub fn new(config: EngineConfig) -> Result<(Engine, Controller), InstrumentError> {
        config.validate()?;

        let params = SharedParams::new();
        let mut builder = SpectralWaveformBuilder::from_config(&config);
        let waveform = Arc::new(builder.build(&params.snapshot().spectrum())?);

        let (outgoing, incoming) = RingBuffer::new(config.queue_capacity);
        // every voice may hold a distinct waveform when they retire together
        let (retired_tx, retired_rx) = RingBuffer::new(config.queue_capacity + config.max_voices);

        let engine = Engine::new(&config, params.clone(), waveform, incoming, retired_tx);
        let controller = Controller::new(params, builder, outgoing, retired_rx);

        info!(
            sample_rate = config.sample_rate,
            oversampling = config.oversampling(),
            control_rate = config.control_rate(),
            max_voices = config.max_voices,
            "instrument ready"
        );

        Ok((engine, controller))
    }
}
