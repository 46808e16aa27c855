//! Benchmarks for low-level DSP primitives.

mod envelope;
mod filter;
mod resample;
mod spectrum;

pub use envelope::bench_envelope;
pub use filter::bench_filter;
pub use resample::bench_resample;
pub use spectrum::bench_spectrum;
