#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{dsp::resample::Interpolation, error::ConfigError};

/// Static engine configuration, fixed for the lifetime of an instrument.
///
/// Everything a host can change while playing lives in the parameter table
/// instead (see [`ParamId`](crate::ParamId)).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Host output sample rate in Hz.
    pub sample_rate: f32,
    /// Render voices at twice the output rate and decimate.
    pub oversample: bool,
    /// Audio frames per control tick (at the internal rate).
    pub control_factor: usize,
    /// Interpolation used to bring control signals back to audio rate.
    pub interpolation: Interpolation,
    /// Waveform table length in samples.
    pub table_length: usize,
    /// Samples per period of the fundamental inside the table.
    pub period: usize,
    /// Number of harmonics summed into the table.
    pub harmonics: usize,
    /// Upper bound on simultaneously sounding voices.
    pub max_voices: usize,
    /// Slots in each waveform handoff queue.
    pub queue_capacity: usize,
    /// Seed for voice phase initialisation.
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            oversample: true,
            control_factor: 32,
            interpolation: Interpolation::Cubic,
            table_length: 65_536,
            period: 256,
            harmonics: 64,
            max_voices: 64,
            queue_capacity: 4,
            seed: 0x5EED,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(ConfigError::SampleRate(self.sample_rate));
        }
        if !self.table_length.is_power_of_two() {
            return Err(ConfigError::TableLength(self.table_length));
        }
        if !self.period.is_power_of_two() || self.period > self.table_length {
            return Err(ConfigError::Period {
                period: self.period,
                length: self.table_length,
            });
        }
        if !(1..=64).contains(&self.harmonics) {
            return Err(ConfigError::Harmonics(self.harmonics));
        }
        if !(1..=256).contains(&self.control_factor) {
            return Err(ConfigError::ControlFactor(self.control_factor));
        }
        if self.max_voices == 0 {
            return Err(ConfigError::NoVoices);
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::QueueCapacity);
        }
        Ok(())
    }

    /// Ratio between the internal voice rate and the output rate.
    pub fn oversampling(&self) -> usize {
        if self.oversample {
            2
        } else {
            1
        }
    }

    /// Rate the voices run at.
    pub fn internal_rate(&self) -> f32 {
        self.sample_rate * self.oversampling() as f32
    }

    /// Rate envelopes and LFOs are evaluated at.
    pub fn control_rate(&self) -> f32 {
        self.internal_rate() / self.control_factor as f32
    }
}
