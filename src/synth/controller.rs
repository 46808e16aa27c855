use std::sync::Arc;

use rtrb::{Consumer, Producer};
use tracing::{debug, warn};

use crate::{
    dsp::spectrum::{SpectralWaveformBuilder, Waveform},
    error::RebuildError,
    preset::Preset,
    synth::params::{ParamId, SharedParams},
};

/// Control-thread half of an instrument.
///
/// Owns the waveform builder. Rebuilds run here, never on the render thread,
/// and finished waveforms are handed to the [`Engine`](crate::Engine) through
/// a single-producer queue. Waveforms the engine is done with come back
/// through a second queue and are dropped by [`collect_garbage`](Self::collect_garbage).
pub struct Controller {
    params: SharedParams,
    builder: SpectralWaveformBuilder,
    outgoing: Producer<Arc<Waveform>>,
    retired: Consumer<Arc<Waveform>>,
    pending: bool,
}

impl Controller {
    pub(crate) fn new(
        params: SharedParams,
        builder: SpectralWaveformBuilder,
        outgoing: Producer<Arc<Waveform>>,
        retired: Consumer<Arc<Waveform>>,
    ) -> Self {
        Self {
            params,
            builder,
            outgoing,
            retired,
            pending: false,
        }
    }

    pub fn get_parameter(&self, id: ParamId) -> f32 {
        self.params.get(id)
    }

    /// Store a parameter value. Spectrum parameters rebuild the waveform when
    /// their value actually changed; everything else is picked up by the
    /// engine on its next block.
    pub fn set_parameter(&mut self, id: ParamId, value: f32) -> Result<(), RebuildError> {
        let changed = self.params.set(id, value);
        if changed && id.affects_spectrum() {
            self.rebuild()
        } else {
            Ok(())
        }
    }

    /// Build a waveform from the current spectrum parameters and publish it.
    ///
    /// When the engine has not yet consumed earlier waveforms the rebuild is
    /// deferred: it returns [`RebuildError::QueueFull`] and [`flush`](Self::flush)
    /// retries later.
    pub fn rebuild(&mut self) -> Result<(), RebuildError> {
        self.collect_garbage();

        if self.outgoing.is_full() {
            self.pending = true;
            warn!("waveform queue full, rebuild deferred");
            return Err(RebuildError::QueueFull);
        }

        let spectrum = self.params.snapshot().spectrum();
        let waveform = match self.builder.build(&spectrum) {
            Ok(waveform) => waveform,
            Err(err) => {
                warn!(error = %err, "waveform rebuild skipped");
                return Err(err);
            }
        };

        match self.outgoing.push(Arc::new(waveform)) {
            Ok(()) => {
                self.pending = false;
                debug!(
                    brightness = spectrum.brightness,
                    falloff = spectrum.falloff,
                    seed = spectrum.seed,
                    "published rebuilt waveform"
                );
                Ok(())
            }
            Err(_) => {
                self.pending = true;
                warn!("waveform queue full, rebuild deferred");
                Err(RebuildError::QueueFull)
            }
        }
    }

    /// Retry a deferred rebuild and reclaim retired waveforms.
    pub fn flush(&mut self) -> Result<(), RebuildError> {
        if self.pending {
            self.rebuild()
        } else {
            self.collect_garbage();
            Ok(())
        }
    }

    /// A rebuild is waiting for queue space.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Drop every waveform the engine has retired. Returns how many were freed.
    pub fn collect_garbage(&mut self) -> usize {
        let mut freed = 0;
        while let Ok(waveform) = self.retired.pop() {
            drop(waveform);
            freed += 1;
        }
        freed
    }

    /// Apply every known value in `preset`, rebuilding at most once.
    pub fn apply_preset(&mut self, preset: &Preset) -> Result<(), RebuildError> {
        let mut spectrum_changed = false;
        for (id, value) in preset.entries() {
            if self.params.set(id, value) && id.affects_spectrum() {
                spectrum_changed = true;
            }
        }

        debug!(name = %preset.name, "applied preset");

        if spectrum_changed {
            self.rebuild()
        } else {
            Ok(())
        }
    }

    /// Capture the current parameter values.
    pub fn preset(&self, name: &str) -> Preset {
        Preset::from_snapshot(name, &self.params.snapshot())
    }
}
