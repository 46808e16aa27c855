//! Low Frequency Oscillator (LFO) concepts.

use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Low Frequency Oscillators
=========================

An LFO is an oscillator running at sub-audio frequencies. Here it only ever
drives modulation: filter cutoff and pitch vibrato. Because nothing it
produces is heard directly, it runs at control rate alongside the envelopes
and is expanded to audio rate together with them.

Vocabulary
----------

  control-rate    The envelope/LFO tick rate, a few thousand Hz. The LFO
                  frequency range (0.01 to 20 Hz) sits far below it.

  phase           Position inside the current cycle, 0.0 to 1.0.

  bipolar         Output swings positive AND negative: -1.0 to +1.0. Vibrato
                  wants this, so pitch goes sharp and flat around the note.


Shapes
------

    SINE       sin(2 pi phase)      smooth vibrato
    FALLING    1 - 2 phase          ╲╲╲╲  snap up, glide down
    RISING     2 phase - 1          ╱╱╱╱  glide up, snap down
    ONE-SHOT   1 - phase, once      ╲____ one falling ramp, then rests at 0

One-shot turns the LFO into a second decaying modulator: a pitch drop at the
start of each note, or a filter sweep that does not repeat.


Sync
----

Every voice owns its LFO and starts it at phase 0 on note-on, so each note
gets the same modulation shape.
*/

/// Waveform of the per-voice LFO.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LfoShape {
    #[default]
    Sine,
    Falling,
    Rising,
    OneShot,
}

impl LfoShape {
    /// Map a parameter value (0..=3) onto a shape.
    pub fn from_value(value: f32) -> Self {
        match value.round() as i32 {
            i32::MIN..=0 => LfoShape::Sine,
            1 => LfoShape::Falling,
            2 => LfoShape::Rising,
            _ => LfoShape::OneShot,
        }
    }

    #[inline]
    fn evaluate(self, phase: f32) -> f32 {
        match self {
            LfoShape::Sine => (TAU * phase).sin(),
            LfoShape::Falling => 1.0 - 2.0 * phase,
            LfoShape::Rising => 2.0 * phase - 1.0,
            LfoShape::OneShot => 1.0 - phase,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Lfo {
    phase: f32,
    finished: bool,
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new()
    }
}

impl Lfo {
    pub fn new() -> Self {
        Self {
            phase: 0.0,
            finished: false,
        }
    }

    /// Restart from phase 0.
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.finished = false;
    }

    /// Current value, then advance one control tick.
    #[inline]
    pub fn tick(&mut self, shape: LfoShape, frequency_hz: f32, control_rate: f32) -> f32 {
        let value = if shape == LfoShape::OneShot && self.finished {
            0.0
        } else {
            shape.evaluate(self.phase)
        };

        self.phase += frequency_hz.max(0.0) / control_rate;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
            self.finished = true;
        }

        value
    }

    pub fn render(&mut self, shape: LfoShape, frequency_hz: f32, control_rate: f32, out: &mut [f32]) {
        for value in out.iter_mut() {
            *value = self.tick(shape, frequency_hz, control_rate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTROL_RATE: f32 = 1_000.0;

    #[test]
    fn sine_completes_one_cycle_per_period() {
        let mut lfo = Lfo::new();
        let mut out = [0.0; 1_000];
        lfo.render(LfoShape::Sine, 1.0, CONTROL_RATE, &mut out);

        assert!(out[0].abs() < 1e-6);
        assert!((out[250] - 1.0).abs() < 1e-3);
        assert!((out[750] + 1.0).abs() < 1e-3);
        assert!(lfo.tick(LfoShape::Sine, 1.0, CONTROL_RATE).abs() < 1e-2);
    }

    #[test]
    fn ramps_span_the_bipolar_range() {
        let mut falling = Lfo::new();
        let mut rising = Lfo::new();
        let mut a = [0.0; 100];
        let mut b = [0.0; 100];
        falling.render(LfoShape::Falling, 10.0, CONTROL_RATE, &mut a);
        rising.render(LfoShape::Rising, 10.0, CONTROL_RATE, &mut b);

        assert_eq!(a[0], 1.0);
        assert_eq!(b[0], -1.0);
        assert!(a.windows(2).take(90).all(|w| w[1] < w[0]));
        assert!(b.windows(2).take(90).all(|w| w[1] > w[0]));
    }

    #[test]
    fn one_shot_rests_after_first_period() {
        let mut lfo = Lfo::new();
        let mut out = [0.0; 300];
        lfo.render(LfoShape::OneShot, 10.0, CONTROL_RATE, &mut out);

        assert_eq!(out[0], 1.0);
        assert!(out[50] > 0.0 && out[50] < 1.0);
        assert!(out[150..].iter().all(|&v| v == 0.0));

        lfo.reset();
        assert_eq!(lfo.tick(LfoShape::OneShot, 10.0, CONTROL_RATE), 1.0);
    }

    #[test]
    fn shape_from_parameter_value() {
        assert_eq!(LfoShape::from_value(0.0), LfoShape::Sine);
        assert_eq!(LfoShape::from_value(1.2), LfoShape::Falling);
        assert_eq!(LfoShape::from_value(2.0), LfoShape::Rising);
        assert_eq!(LfoShape::from_value(3.0), LfoShape::OneShot);
        assert_eq!(LfoShape::from_value(-5.0), LfoShape::Sine);
    }
}
