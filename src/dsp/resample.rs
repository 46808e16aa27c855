#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Control Rate to Audio Rate
==========================

Envelopes and LFOs tick once every `factor` audio frames. Multiplying audio
by a staircase would put a tiny step in the signal every tick, which is
audible as zipper noise on fast envelopes. The converter fills in the frames
between ticks.

    control  *-------*-------*-------*
    audio    ||||||||||||||||||||||||||||

A new control sample is consumed on every frame whose index is a multiple of
`factor`. All converters of one voice are advanced by the same frame counts,
so they consume their samples on the same frames.

Modes
-----

  Hold     Newest sample until the next one arrives. No latency, steps.

  Linear   Straight line from the previous sample to the newest one. The line
           can only be drawn once the newest sample exists, so the output
           lags by one control period.

  Cubic    Hermite curve between the same two points, with tangents taken
           from the samples already seen (p1 - p0 and p2 - p1). Smooth first
           derivative, same one-period lag.

In every mode the frame that consumes a sample outputs a control value
exactly, so nothing overshoots at the tick points.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    Hold,
    Linear,
    #[default]
    Cubic,
}

#[derive(Debug, Clone)]
pub struct RateConverter {
    factor: usize,
    interpolation: Interpolation,
    position: usize,
    // oldest to newest
    history: [f32; 3],
    primed: bool,
}

impl RateConverter {
    pub fn new(factor: usize, interpolation: Interpolation) -> Self {
        Self {
            factor: factor.max(1),
            interpolation,
            position: 0,
            history: [0.0; 3],
            primed: false,
        }
    }

    pub fn factor(&self) -> usize {
        self.factor
    }

    /// Control samples the next `frames` audio frames will consume.
    #[inline]
    pub fn ticks_needed(&self, frames: usize) -> usize {
        let f = self.factor;
        (self.position + frames + f - 1) / f - (self.position + f - 1) / f
    }

    /// Expand `control` into `out`. `control.len()` must equal
    /// `ticks_needed(out.len())`.
    pub fn expand(&mut self, control: &[f32], out: &mut [f32]) {
        debug_assert_eq!(control.len(), self.ticks_needed(out.len()));

        let inv_factor = 1.0 / self.factor as f32;
        let mut next = control.iter();

        for sample in out.iter_mut() {
            if self.position == 0 {
                if let Some(&value) = next.next() {
                    self.push(value);
                }
            }

            let t = self.position as f32 * inv_factor;
            let [p0, p1, p2] = self.history;

            *sample = match self.interpolation {
                Interpolation::Hold => p2,
                Interpolation::Linear => p1 + (p2 - p1) * t,
                Interpolation::Cubic => {
                    let m1 = p1 - p0;
                    let m2 = p2 - p1;
                    let t2 = t * t;
                    let t3 = t2 * t;
                    (2.0 * t3 - 3.0 * t2 + 1.0) * p1
                        + (t3 - 2.0 * t2 + t) * m1
                        + (-2.0 * t3 + 3.0 * t2) * p2
                        + (t3 - t2) * m2
                }
            };

            self.position += 1;
            if self.position == self.factor {
                self.position = 0;
            }
        }
    }

    #[inline]
    fn push(&mut self, value: f32) {
        if self.primed {
            self.history = [self.history[1], self.history[2], value];
        } else {
            self.history = [value; 3];
            self.primed = true;
        }
    }
}
