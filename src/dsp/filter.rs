use std::f32::consts::FRAC_PI_2;

/*
Four-Stage Ladder Lowpass
=========================

Four one-pole lowpass stages in series, with the output of the last stage fed
back (inverted) into the input. Each stage rolls off 6 dB/octave, so the cascade
gives 24 dB/octave. The feedback creates a resonant peak at the cutoff; around
feedback = 4 the analog ladder would self-oscillate.

Vocabulary
----------

  warp g      Prewarped conductance tan(pi * cutoff / sample_rate / 2). The
              bilinear transform squeezes the whole analog frequency axis into
              0..nyquist; prewarping makes the cutoff land where asked.

  G           g / (1 + g). The share of the stage input that reaches the
              stage output in one sample.

  state s     Each stage's integrator memory (trapezoidal, so it holds twice
              the capacitor voltage minus the last output).

  spread      Stage k runs at g * spread^k. 1 gives the classic ladder, other
              values smear the poles apart for a softer knee.


Zero-Delay Feedback
-------------------

A naive ladder feeds back last sample's output, adding a one-sample delay
that detunes the resonance. Instead we solve for the input that is
consistent with the output it produces. Every stage output is linear in its
input:

    out_k = G_k * in_k + (1 - G_k) * s_k

so the cascade output is

    out_4 = G1 G2 G3 G4 * y + S

where S collects the states weighted by the gains of the stages after them.
Substituting y = x (1 + fb) - fb * out_4 and solving:

    y = (x (1 + fb) - fb * S) / (1 + fb * G1 G2 G3 G4)

The (1 + fb) on the input keeps the passband gain at 1 when feedback rises.
y then goes through tanh, which is where the drive character comes from.


Why It Cannot Blow Up
---------------------

Every warp is clamped so that G < 1/2. The stage update then writes

    s' = 2 G y + (1 - 2 G) s

a convex mix of input and old state. With a tanh-bounded cascade input every
state and every stage output stays inside [-1, 1], for any input and any
feedback up to 4.
*/

pub const MIN_CUTOFF_HZ: f32 = 10.0;

/// Highest cutoff as a fraction of the sample rate.
pub const MAX_CUTOFF_RATIO: f32 = 0.475;

/// Largest per-stage warp, `tan(pi / 2 * MAX_CUTOFF_RATIO)`. Keeps every `G`
/// below one half.
pub const MAX_WARP: f32 = 0.924_390_5;

/// Prewarped conductance for a cutoff in Hz, clamped to the usable range.
#[inline]
pub fn warp(cutoff_hz: f32, sample_rate: f32) -> f32 {
    let cutoff = cutoff_hz
        .min(MAX_CUTOFF_RATIO * sample_rate)
        .max(MIN_CUTOFF_HZ);
    (FRAC_PI_2 * cutoff / sample_rate).tan()
}

/// Per-sample coefficients, shared by every channel of a voice.
#[derive(Debug, Clone, Copy)]
pub struct LadderGains {
    gains: [f32; 4],
    weights: [f32; 4],
    feedback: f32,
    inv_denominator: f32,
}

impl LadderGains {
    pub fn from_warp(g: f32, spread: f32, feedback: f32) -> Self {
        let feedback = feedback.clamp(0.0, 4.0);

        let mut gains = [0.0; 4];
        let mut stage_g = g;
        for gain in gains.iter_mut() {
            let clamped = stage_g.clamp(0.0, MAX_WARP);
            *gain = clamped / (1.0 + clamped);
            stage_g *= spread;
        }

        // weight of s_k at the cascade output: (1 - G_k) times later gains
        let mut weights = [0.0; 4];
        let mut tail = 1.0;
        for k in (0..4).rev() {
            weights[k] = (1.0 - gains[k]) * tail;
            tail *= gains[k];
        }

        Self {
            gains,
            weights,
            feedback,
            inv_denominator: 1.0 / (1.0 + feedback * tail),
        }
    }

    pub fn from_cutoff(cutoff_hz: f32, sample_rate: f32, spread: f32, feedback: f32) -> Self {
        Self::from_warp(warp(cutoff_hz, sample_rate), spread, feedback)
    }
}

#[derive(Debug, Clone)]
pub struct LadderFilter {
    state: [f32; 4],
    gains: LadderGains,
    sample_rate: f32,
}

impl LadderFilter {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            state: [0.0; 4],
            gains: LadderGains::from_cutoff(1_000.0, sample_rate, 1.0, 0.0),
            sample_rate,
        }
    }

    /// Filter one sample with externally computed coefficients.
    #[inline]
    pub fn process(&mut self, input: f32, gains: &LadderGains) -> f32 {
        let s = &mut self.state;
        let weighted = gains.weights[0] * s[0]
            + gains.weights[1] * s[1]
            + gains.weights[2] * s[2]
            + gains.weights[3] * s[3];

        let fb = gains.feedback;
        let mut y = ((input * (1.0 + fb) - fb * weighted) * gains.inv_denominator).tanh();

        for (state, &g) in s.iter_mut().zip(&gains.gains) {
            let v = (y - *state) * g;
            y = v + *state;
            *state = y + v;
        }

        y
    }

    /// Set the stored coefficients used by [`render`](Self::render).
    pub fn set_params(&mut self, cutoff_hz: f32, spread: f32, feedback: f32) {
        self.gains = LadderGains::from_cutoff(cutoff_hz, self.sample_rate, spread, feedback);
    }

    /// Filter a buffer in place with the stored coefficients.
    pub fn render(&mut self, buffer: &mut [f32]) {
        let gains = self.gains;
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample, &gains);
        }
    }

    pub fn reset(&mut self) {
        self.state = [0.0; 4];
    }
}
