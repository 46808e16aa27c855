//! Gemstone - audio stream setup and the control loop

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};
use tracing::{info, warn};

use gemsynth::{
    io::midi_note_to_freq, EngineConfig, Instrument, NoteEvent, ParamId, RebuildError,
    MAX_BLOCK_SIZE,
};

use super::arpeggio::{Arpeggio, MAX_EVENTS};

/// How often the control thread moves the brightness knob.
const SWEEP_INTERVAL: Duration = Duration::from_millis(250);

pub struct Gemstone {
    seconds: f32,
    tempo: f32,
    root: u8,
    unison: u8,
    oversample: bool,
}

impl Gemstone {
    pub fn new() -> Self {
        Self {
            seconds: 16.0,
            tempo: 480.0,
            root: 48,
            unison: 3,
            oversample: true,
        }
    }

    pub fn seconds(mut self, seconds: f32) -> Self {
        self.seconds = seconds;
        self
    }

    pub fn tempo(mut self, tempo: f32) -> Self {
        self.tempo = tempo;
        self
    }

    pub fn root(mut self, root: u8) -> Self {
        self.root = root.min(115);
        self
    }

    pub fn unison(mut self, unison: u8) -> Self {
        self.unison = unison;
        self
    }

    pub fn oversample(mut self, oversample: bool) -> Self {
        self.oversample = oversample;
        self
    }

    /// Play until the requested duration has elapsed.
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;

        let (mut engine, mut controller) = Instrument::new(EngineConfig {
            sample_rate,
            oversample: self.oversample,
            ..EngineConfig::default()
        })
        .wrap_err("failed to build instrument")?;

        controller.set_parameter(ParamId::UnisonVoices, self.unison as f32)?;
        controller.set_parameter(ParamId::Release, 120.0)?;
        controller.set_parameter(ParamId::Feedback, 2.5)?;

        info!(
            sample_rate,
            channels,
            root_hz = midi_note_to_freq(self.root),
            "playing arpeggio, Ctrl+C to stop"
        );

        let stopping = Arc::new(AtomicBool::new(false));
        let stopping_audio = stopping.clone();

        let mut arpeggio = Arpeggio::new(self.root, self.tempo, sample_rate);
        let mut events = [NoteEvent::all_notes_off(0); MAX_EVENTS];
        let mut left = vec![0.0f32; MAX_BLOCK_SIZE];
        let mut right = vec![0.0f32; MAX_BLOCK_SIZE];

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| {
                let total_frames = data.len() / channels;
                let mut frames_written = 0;

                while frames_written < total_frames {
                    let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);

                    let count = if stopping_audio.load(Ordering::Relaxed) {
                        arpeggio.stop(&mut events)
                    } else {
                        arpeggio.process_block(frames, &mut events)
                    };
                    engine.render(&events[..count], &mut left[..frames], &mut right[..frames]);

                    let out_off = frames_written * channels;
                    for i in 0..frames {
                        let frame = &mut data[out_off + i * channels..out_off + (i + 1) * channels];
                        for (ch, sample) in frame.iter_mut().enumerate() {
                            *sample = if ch % 2 == 0 { left[i] } else { right[i] };
                        }
                    }

                    frames_written += frames;
                }
            },
            |err| eprintln!("Audio error: {}", err),
            None,
        )?;

        stream.play()?;

        let started = Instant::now();
        let duration = Duration::from_secs_f32(self.seconds.max(0.0));
        let mut sweep_step = 0u32;

        while started.elapsed() < duration {
            std::thread::sleep(SWEEP_INTERVAL);

            // triangle sweep 0 -> 3 -> 0 over eight seconds
            sweep_step += 1;
            let phase = (sweep_step % 32) as f32 / 32.0;
            let brightness = 3.0 * (1.0 - (2.0 * phase - 1.0).abs());

            match controller.set_parameter(ParamId::Brightness, brightness) {
                Ok(()) | Err(RebuildError::QueueFull) => {}
                Err(err) => warn!(error = %err, "brightness change skipped"),
            }
            if let Err(err) = controller.flush() {
                warn!(error = %err, "deferred rebuild still waiting");
            }
        }

        stopping.store(true, Ordering::Relaxed);
        std::thread::sleep(Duration::from_millis(500));
        controller.collect_garbage();
        info!("done");

        Ok(())
    }
}

impl Default for Gemstone {
    fn default() -> Self {
        Self::new()
    }
}
