/*
2:1 Decimation
==============

Voices render at twice the output rate so that the waveform reads and the
ladder's tanh have room above the audible band. Before handing the mix to the
host we drop every other sample, after a short lowpass so the content between
the output Nyquist and the internal Nyquist does not fold back down.

The kernel is the binomial [1, 3, 3, 1] / 8. It has a double zero at the
internal Nyquist, unity gain at DC, and only needs two samples of history:

    y[i] = (x[2i-2] + 3 x[2i-1] + 3 x[2i] + x[2i+1]) / 8
*/

#[derive(Debug, Clone, Default)]
pub struct Downsampler {
    // x[2i-2], x[2i-1] for the next output
    history: [f32; 2],
}

impl Downsampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decimate `input` into `output`. `input.len()` must be
    /// `2 * output.len()`.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(input.len(), 2 * output.len());

        let [mut a, mut b] = self.history;
        for (pair, out) in input.chunks_exact(2).zip(output.iter_mut()) {
            let (c, d) = (pair[0], pair[1]);
            *out = (a + 3.0 * b + 3.0 * c + d) * 0.125;
            a = c;
            b = d;
        }
        self.history = [a, b];
    }

    pub fn reset(&mut self) {
        self.history = [0.0; 2];
    }
}
