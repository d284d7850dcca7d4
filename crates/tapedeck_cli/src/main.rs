//! Tapedeck CLI
//!
//! Inspect saved tapes and play them back in dry-run mode, where every
//! emission is logged with real timing instead of being injected into the
//! OS. Recording and real injection need a platform source/sink wired to
//! the `tapedeck_recorder` traits; this binary only drives the engine.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tapedeck_core::{store, TimedEvent};
use tapedeck_recorder::{MacroRecorder, ReplayOptions, SessionState, TraceSink};

#[derive(Parser)]
#[command(name = "tapedeck", version, about = "Input macro tape inspector and player")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize the contents of a saved tape
    Inspect {
        /// Tape file (JSON)
        tape: PathBuf,
    },
    /// Replay a saved tape against a logging sink (no input is injected)
    Play {
        /// Tape file (JSON)
        tape: PathBuf,
        /// Speed multiplier applied to inter-event delays (>1 = faster)
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
        /// How many times to replay the whole tape
        #[arg(long, default_value_t = 1)]
        repeat: u32,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Command::Inspect { tape } => inspect(&tape),
        Command::Play { tape, speed, repeat } => play(&tape, speed, repeat),
    }
}

fn inspect(path: &PathBuf) -> Result<()> {
    let tape = store::load(path)
        .with_context(|| format!("failed to load tape {}", path.display()))?;

    let mut moves = 0usize;
    let mut clicks = 0usize;
    let mut keys = 0usize;
    for event in &tape {
        match event {
            TimedEvent::MouseMove { .. } => moves += 1,
            TimedEvent::MouseClick { .. } => clicks += 1,
            TimedEvent::Keyboard { .. } => keys += 1,
        }
    }

    println!("tape:      {}", path.display());
    println!("events:    {}", tape.len());
    println!("  moves:   {moves}");
    println!("  clicks:  {clicks}");
    println!("  keys:    {keys}");
    println!("duration:  {:.3}s", tape.duration());
    Ok(())
}

fn play(path: &PathBuf, speed: f64, repeat: u32) -> Result<()> {
    let recorder = MacroRecorder::new();
    recorder
        .load_from(path)
        .with_context(|| format!("failed to load tape {}", path.display()))?;
    recorder.set_observer(|active, label| {
        tracing::info!(active, label, "session state changed");
    });

    let options = ReplayOptions::default()
        .with_speed(speed)
        .with_repetitions(repeat);
    recorder
        .start_replay(Box::new(TraceSink), options)
        .context("failed to start replay")?;

    while recorder.state() != SessionState::Idle {
        thread::sleep(Duration::from_millis(20));
    }
    Ok(())
}
