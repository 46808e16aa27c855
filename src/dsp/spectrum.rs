use std::{f64::consts::TAU, sync::Arc};

use rand_pcg::Pcg32;
use realfft::{num_complex::Complex, ComplexToReal, RealFftPlanner};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    config::EngineConfig,
    dsp::rng::{create_stream, unit_open_closed, PHASE_STREAM},
    error::RebuildError,
};

/*
Spectral Waveform Tables
========================

Instead of drawing a waveform in the time domain, we describe its spectrum
(how loud each harmonic is) and let one inverse FFT turn that description into
samples. The table is many periods long, so each harmonic can be smeared over
a small band of FFT bins. Reading the table back at audio rate then gives a
tone that slowly drifts and shimmers instead of a static, metallic comb.

Vocabulary
----------

  table length  L   Number of samples in the table (power of two).
  period       P    Samples per cycle of the fundamental. L / P periods fit in
                    the table, so harmonic h sits on FFT bin h * (L / P).
  brightness        Exponent that lifts the upper harmonics.
  falloff           Exponent that pulls the upper harmonics back down.
  bandwidth         Width of each spectral line, in cents of the fundamental.


Harmonic Amplitudes
-------------------

    y(h) = scale * h^brightness * (1 + h)^(-brightness - falloff)

The sum of y(h)^2 behaves like the integral of x^(2b) (1+x)^(-2b-2f), which is
the Beta function B(2b+1, 2f-1). Dividing by its square root keeps the total
energy roughly constant when brightness and falloff move:

    scale = 0.25 / sqrt(B(2b + 1, 2f - 1))

This needs falloff > 1/2, otherwise the integral diverges.


Harmonic Families
-----------------

Harmonic 12 = 2 * 2 * 3. Every factor 2 multiplies its amplitude by the "two"
factor, every factor 3 by the "three" factor, and so on for 5, 7 and the
remaining primes up to 61 ("higher"). Setting "two" to zero removes every even
harmonic, leaving a hollow, square-like tone.


Line Spreading
--------------

    bw = (L / P) * h^bw_exponent * (2^(bandwidth / 1200) - 1)     [bins]

The energy of harmonic h is spread over neighbouring bins with a Gaussian of
standard deviation bw / 2. Bin j receives the probability mass between
j - 1/2 and j + 1/2, which is the difference of two normal CDF values. Since
the phases are random, powers add, so the amplitude per bin is
y * sqrt(weight) and the line keeps its energy.


From Spectrum to Samples
------------------------

A real cosine of amplitude A on bin k corresponds to the complex value
A/2 * e^(i phase) in the half spectrum. realfft's inverse transform is
unnormalised, so filling bins this way gives peak amplitude A directly.
*/

/// Largest harmonic count the builder supports.
pub const MAX_HARMONICS: usize = 64;

const HIGHER_PRIMES: [usize; 14] = [11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61];

/// Below this standard deviation (in bins) a line occupies a single bin.
const MIN_SIGMA: f64 = 0.05;

/// Parameters that shape the harmonic spectrum. Changing any of them requires
/// a rebuild.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumParameters {
    pub brightness: f32,
    pub falloff: f32,
    pub two_factor: f32,
    pub three_factor: f32,
    pub five_factor: f32,
    pub seven_factor: f32,
    pub higher_factor: f32,
    /// Line width at the fundamental, in cents.
    pub bandwidth: f32,
    pub bandwidth_exponent: f32,
    /// 0 disables amplitude jitter.
    pub seed: u32,
}

impl Default for SpectrumParameters {
    fn default() -> Self {
        Self {
            brightness: 0.0,
            falloff: 1.0,
            two_factor: 1.0,
            three_factor: 1.0,
            five_factor: 1.0,
            seven_factor: 1.0,
            higher_factor: 1.0,
            bandwidth: 10.0,
            bandwidth_exponent: 1.0,
            seed: 0,
        }
    }
}

impl SpectrumParameters {
    fn is_finite(&self) -> bool {
        [
            self.brightness,
            self.falloff,
            self.two_factor,
            self.three_factor,
            self.five_factor,
            self.seven_factor,
            self.higher_factor,
            self.bandwidth,
            self.bandwidth_exponent,
        ]
        .iter()
        .all(|v| v.is_finite())
    }

    /// Product of the family factors for every prime factor of `h`.
    fn family_damping(&self, mut h: usize) -> f64 {
        let mut y = 1.0;

        for (prime, factor) in [
            (2, self.two_factor),
            (3, self.three_factor),
            (5, self.five_factor),
            (7, self.seven_factor),
        ] {
            while h % prime == 0 {
                h /= prime;
                y *= factor as f64;
            }
        }

        for prime in HIGHER_PRIMES {
            while h % prime == 0 {
                h /= prime;
                y *= self.higher_factor as f64;
            }
        }

        y
    }
}

/// An immutable, periodic sample table read with wraparound.
pub struct Waveform {
    samples: Box<[f32]>,
    period: usize,
    mask: usize,
}

impl Waveform {
    /// Wrap an existing buffer. `samples.len()` must be a power of two.
    pub fn from_samples(samples: Vec<f32>, period: usize) -> Self {
        debug_assert!(samples.len().is_power_of_two());
        let mask = samples.len() - 1;
        Self {
            samples: samples.into_boxed_slice(),
            period,
            mask,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples per cycle of the fundamental.
    pub fn period(&self) -> usize {
        self.period
    }

    /// Number of fundamental periods in the table.
    pub fn periods(&self) -> usize {
        self.samples.len() / self.period
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Root mean square over the whole table.
    pub fn rms(&self) -> f32 {
        let sum: f64 = self.samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
        (sum / self.samples.len() as f64).sqrt() as f32
    }

    /// Linear interpolation at a fractional, non-negative sample position.
    #[inline]
    pub fn read_linear(&self, phase: f64) -> f32 {
        let i = phase as usize;
        let t = (phase - i as f64) as f32;
        let x0 = self.samples[i & self.mask];
        let x1 = self.samples[(i + 1) & self.mask];
        x0 + (x1 - x0) * t
    }

    /// Catmull-Rom interpolation at a fractional, non-negative sample position.
    #[inline]
    pub fn read_cubic(&self, phase: f64) -> f32 {
        let i = phase as usize;
        let t = (phase - i as f64) as f32;

        let x0 = self.samples[i.wrapping_sub(1) & self.mask];
        let x1 = self.samples[i & self.mask];
        let x2 = self.samples[(i + 1) & self.mask];
        let x3 = self.samples[(i + 2) & self.mask];

        let c1 = 0.5 * (x2 - x0);
        let c2 = x0 - 2.5 * x1 + 2.0 * x2 - 0.5 * x3;
        let c3 = 0.5 * (x3 - x0) + 1.5 * (x1 - x2);
        ((c3 * t + c2) * t + c1) * t + x1
    }
}

/// Builds [`Waveform`]s from [`SpectrumParameters`].
///
/// Owns the FFT plan and its buffers so repeated rebuilds reuse them. Building
/// allocates the output table; never call it on the render thread.
pub struct SpectralWaveformBuilder {
    length: usize,
    period: usize,
    harmonics: usize,
    inverse: Arc<dyn ComplexToReal<f64>>,
    spectrum: Vec<Complex<f64>>,
    output: Vec<f64>,
    scratch: Vec<Complex<f64>>,
}

impl SpectralWaveformBuilder {
    pub fn new(length: usize, period: usize, harmonics: usize) -> Self {
        let mut planner = RealFftPlanner::<f64>::new();
        let inverse = planner.plan_fft_inverse(length);
        let spectrum = inverse.make_input_vec();
        let output = inverse.make_output_vec();
        let scratch = inverse.make_scratch_vec();

        Self {
            length,
            period,
            harmonics: harmonics.clamp(1, MAX_HARMONICS),
            inverse,
            spectrum,
            output,
            scratch,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.table_length, config.period, config.harmonics)
    }

    /// Per-harmonic amplitudes before line spreading; index 0 is harmonic 1.
    /// Entries past the configured harmonic count are zero.
    pub fn harmonic_amplitudes(
        &self,
        params: &SpectrumParameters,
    ) -> Result<[f64; MAX_HARMONICS], RebuildError> {
        let degenerate = || RebuildError::Degenerate {
            brightness: params.brightness,
            falloff: params.falloff,
        };

        if !params.is_finite() {
            return Err(degenerate());
        }

        let brightness = params.brightness as f64;
        let falloff = params.falloff as f64;
        let a = 2.0 * brightness + 1.0;
        let b = 2.0 * falloff - 1.0;
        if a <= 0.0 || b <= 0.0 {
            return Err(degenerate());
        }

        let scale = 0.25 / beta(a, b).sqrt();
        if !scale.is_finite() {
            return Err(degenerate());
        }

        let mut amplitudes = [0.0; MAX_HARMONICS];
        for (index, amplitude) in amplitudes.iter_mut().take(self.harmonics).enumerate() {
            let h = index + 1;
            let hf = h as f64;

            let mut y = scale * hf.powf(brightness) * (1.0 + hf).powf(-brightness - falloff);
            y *= params.family_damping(h);

            if params.seed != 0 {
                let mut jitter = create_stream(params.seed as u64, h as u64);
                y *= (-unit_open_closed(&mut jitter).ln()).sqrt();
            }

            *amplitude = y;
        }

        Ok(amplitudes)
    }

    /// Synthesize a new table. On error nothing is produced and the caller
    /// keeps whatever waveform it already had.
    pub fn build(&mut self, params: &SpectrumParameters) -> Result<Waveform, RebuildError> {
        let amplitudes = self.harmonic_amplitudes(params)?;

        let periods = (self.length / self.period) as f64;
        let half = self.length / 2;
        let widening = 2f64.powf(params.bandwidth as f64 / 1200.0) - 1.0;
        let mut phases = create_stream(params.seed as u64, PHASE_STREAM);

        self.spectrum.fill(Complex::new(0.0, 0.0));

        for (index, &y) in amplitudes.iter().take(self.harmonics).enumerate() {
            let h = index + 1;
            let center = h * self.length / self.period;
            if center >= half {
                break;
            }

            let bw = periods * (h as f64).powf(params.bandwidth_exponent as f64) * widening;
            let sigma = 0.5 * bw;

            if sigma < MIN_SIGMA {
                add_line(&mut self.spectrum, center, y, &mut phases);
                continue;
            }

            let reach = (3.0 * sigma).ceil() as isize + 1;
            for offset in -reach..=reach {
                let bin = center as isize + offset;
                if bin <= 0 || bin >= half as isize {
                    continue;
                }

                let j = offset as f64;
                let weight = normal_cdf((j + 0.5) / sigma) - normal_cdf((j - 0.5) / sigma);
                add_line(&mut self.spectrum, bin as usize, y * weight.sqrt(), &mut phases);
            }
        }

        // realfft rejects imaginary parts on the DC and Nyquist bins
        self.spectrum[0] = Complex::new(0.0, 0.0);
        self.spectrum[half] = Complex::new(0.0, 0.0);

        self.inverse
            .process_with_scratch(&mut self.spectrum, &mut self.output, &mut self.scratch)?;

        let mut samples = Vec::with_capacity(self.length);
        for &s in &self.output {
            if !s.is_finite() {
                return Err(RebuildError::NonFinite);
            }
            samples.push(s as f32);
        }

        Ok(Waveform::from_samples(samples, self.period))
    }
}

fn add_line(spectrum: &mut [Complex<f64>], bin: usize, amplitude: f64, phases: &mut Pcg32) {
    use rand::Rng;

    let phase = TAU * phases.gen::<f64>();
    spectrum[bin] += Complex::from_polar(0.5 * amplitude, phase);
}

/// Euler Beta function through log-gamma.
pub fn beta(a: f64, b: f64) -> f64 {
    (libm::lgamma(a) + libm::lgamma(b) - libm::lgamma(a + b)).exp()
}

/// Standard normal cumulative distribution.
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + libm::erf(x / std::f64::consts::SQRT_2))
}
