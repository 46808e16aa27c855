//! Arpeggio - sample-accurate note events for the audio thread.

use gemsynth::NoteEvent;

/// Minor seventh chord, spread over two octaves.
const STEPS: [u8; 8] = [0, 3, 7, 10, 12, 10, 7, 3];

/// Upper bound on events one block can produce.
pub const MAX_EVENTS: usize = 64;

pub struct Arpeggio {
    root: u8,
    samples_per_step: f64,
    /// Frames until the next step fires.
    countdown: f64,
    step: usize,
    sounding: Option<u8>,
}

impl Arpeggio {
    pub fn new(root: u8, steps_per_minute: f32, sample_rate: f32) -> Self {
        Self {
            root,
            samples_per_step: sample_rate as f64 * 60.0 / steps_per_minute.max(1.0) as f64,
            countdown: 0.0,
            step: 0,
            sounding: None,
        }
    }

    /// Fill `events` with the note changes inside the next `frames` frames and
    /// return how many were written.
    pub fn process_block(&mut self, frames: usize, events: &mut [NoteEvent; MAX_EVENTS]) -> usize {
        let mut count = 0;
        let mut position = self.countdown;

        while position < frames as f64 && count + 2 <= MAX_EVENTS {
            let frame = position as usize;
            if let Some(note) = self.sounding.take() {
                events[count] = NoteEvent::note_off(frame, note);
                count += 1;
            }

            let note = self.root.saturating_add(STEPS[self.step % STEPS.len()]).min(127);
            events[count] = NoteEvent::note_on(frame, note, 0.8);
            count += 1;

            self.sounding = Some(note);
            self.step += 1;
            position += self.samples_per_step;
        }

        self.countdown = position - frames as f64;
        count
    }

    pub fn stop(&mut self, events: &mut [NoteEvent; MAX_EVENTS]) -> usize {
        match self.sounding.take() {
            Some(note) => {
                events[0] = NoteEvent::note_off(0, note);
                1
            }
            None => 0,
        }
    }
}
