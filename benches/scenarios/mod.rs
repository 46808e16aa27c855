//! Real-world scenario benchmarks.
//!
//! These benchmarks model actual usage: a single voice with live modulation,
//! and full engine blocks with many sounding notes.

mod engine;
mod voices;

pub use engine::bench_engine;
pub use voices::bench_voices;
