use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use trailride_core::cli::{replay_overview, ride_report};
use trailride_core::replay::run_replay;
use trailride_core::{load_config, save_summary, EngineConfig, RideEngine};

/// Spill av en JSON-lines hendelseslogg (fixes, BLE-notifikasjoner, øktkontroll)
/// gjennom sporingsmotoren og skriv ut turrapporten.
#[derive(Debug, Parser)]
#[command(name = "trailride-replay", version, about)]
struct Args {
    /// JSON-lines fil med hendelser
    input: PathBuf,

    /// Konfig (JSON). Mangler filen brukes standardverdier.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skriv sluttført tur som JSON hit
    #[arg(long)]
    summary_out: Option<PathBuf>,

    /// Skriv ut prometheus-tellere etter avspilling
    #[arg(long)]
    metrics: bool,

    /// Skriv ut hver hendelse som JSON
    #[arg(long)]
    events: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let cfg = match &args.config {
        Some(path) => load_config(path).with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let mut engine = RideEngine::new(cfg).context("creating engine")?;

    let file = File::open(&args.input).with_context(|| format!("opening {}", args.input.display()))?;
    let report = run_replay(BufReader::new(file), &mut engine).context("replaying events")?;

    if args.events {
        for ev in &report.events {
            println!("{}", serde_json::to_string(ev)?);
        }
    }

    print!("{}", replay_overview(&report));
    match report.summary().cloned().or_else(|| engine.summary()) {
        Some(summary) => {
            print!("{}", ride_report(&summary));
            if let Some(out) = &args.summary_out {
                save_summary(&summary, out).with_context(|| format!("writing {}", out.display()))?;
            }
        }
        None => println!("Ingen tur i loggen."),
    }

    if args.metrics {
        print!("{}", engine.counters().gather_text()?);
    }
    Ok(())
}
