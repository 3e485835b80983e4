//! Splash ITM: point-to-point RF path loss between two sites.
//!
//! Reads a link scenario (two sites, the terrain profile between them, and
//! radio settings) and prints the Longley-Rice median path loss, either over
//! the whole link or at every sample along it.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod scenario;

use scenario::Scenario;

/// Longley-Rice point-to-point path loss.
#[derive(Debug, Parser)]
#[command(name = "splash-itm")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Scenario file (JSON).
    scenario: PathBuf,

    /// Predict at every sample along the profile instead of only at the end.
    #[arg(long)]
    sweep: bool,

    /// Log derived model parameters.
    #[arg(short, long)]
    verbose: bool,

    /// Override the scenario's frequency (MHz).
    #[arg(short, long)]
    frequency: Option<f64>,

    /// Print predictions as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let scenario = Scenario::load(&cli.scenario)?;
    let (mut settings, substituted) = scenario.settings();
    if let Some(frequency) = cli.frequency {
        settings.frequency = frequency;
    }

    info!(
        tx = %scenario.transmitter.name,
        rx = %scenario.receiver.name,
        distance = scenario.distance(),
        samples = scenario.elevations.len(),
        frequency = settings.frequency,
        "loaded scenario"
    );

    if cli.sweep {
        let sweep = scenario.sweep(&settings, substituted)?;

        if cli.json {
            println!("{}", serde_json::to_string_pretty(&sweep)?);
        } else {
            for (distance, prediction) in &sweep {
                println!(
                    "{:>10.0} m  {:>7.1} dB  {:?} ({}{})",
                    distance,
                    prediction.loss,
                    prediction.region,
                    prediction.warning.code(),
                    if prediction.warning.is_valid() { "" } else { ", invalid" }
                );
            }
        }
    } else {
        let prediction = scenario.predict(&settings, substituted)?;

        if cli.json {
            println!("{}", serde_json::to_string_pretty(&prediction)?);
        } else {
            println!(
                "{} to {}: {:.1} dB ({:.1} dB free space + {:.1} dB, {:?}{})",
                scenario.transmitter.name,
                scenario.receiver.name,
                prediction.loss,
                prediction.free_space_loss,
                prediction.reference_attenuation,
                prediction.region,
                if prediction.line_of_sight { ", clear line of sight" } else { "" },
            );

            if prediction.warning != itm::Warning::None {
                println!("warning: {}", prediction.warning);
            }

            if !prediction.warning.is_valid() {
                println!("results are probably invalid");
            }
        }
    }

    Ok(())
}
