//! gemstone - plays an arpeggio through the default output device while the
//! control thread sweeps the spectrum.
//!
//! Run with: cargo run --bin gemstone -- --seconds 20

mod app;
mod arpeggio;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use app::Gemstone;

#[derive(Debug, Parser)]
#[command(name = "gemstone", about = "Spectral wavetable synth demo")]
struct Args {
    /// How long to play, in seconds
    #[arg(long, default_value_t = 16.0)]
    seconds: f32,

    /// Arpeggio tempo in steps per minute
    #[arg(long, default_value_t = 480.0)]
    tempo: f32,

    /// Root note of the arpeggio (MIDI note number)
    #[arg(long, default_value_t = 48)]
    root: u8,

    /// Unison voices per note
    #[arg(long, default_value_t = 3)]
    unison: u8,

    /// Render at the output rate instead of oversampling 2x
    #[arg(long)]
    no_oversample: bool,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    Gemstone::new()
        .seconds(args.seconds)
        .tempo(args.tempo)
        .root(args.root)
        .unison(args.unison)
        .oversample(!args.no_oversample)
        .run()
}
