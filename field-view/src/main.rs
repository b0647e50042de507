//! Application entry point for the particle field viewer.
//!
//! This binary parses the command line, sets up logging and eframe/egui,
//! and delegates hosting of the field to [`Viewer`] from the `viewer` module.

mod viewer;

use clap::Parser;
use field_core::config::FieldConfig;
use std::path::PathBuf;
use viewer::Viewer;

#[derive(Parser)]
#[command(name = "particle-field")]
#[command(about = "Interactive decorative particle field", long_about = None)]
struct Cli {
    /// JSON file with field settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of particles (overrides the config file)
    #[arg(short, long)]
    quantity: Option<usize>,

    /// Tint as a 3- or 6-digit hex color (overrides the config file)
    #[arg(long)]
    color: Option<String>,

    /// Seed for a reproducible field
    #[arg(long)]
    seed: Option<u64>,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

/// Builds the field configuration from the config file and CLI overrides.
///
/// A config file that fails to load or validate is reported and replaced by
/// the defaults; the viewer always starts.
fn resolve_config(cli: &Cli) -> FieldConfig {
    let mut config = match &cli.config {
        Some(path) => FieldConfig::load(path).unwrap_or_else(|e| {
            tracing::error!("{}: {e}; using defaults", path.display());
            FieldConfig::default()
        }),
        None => FieldConfig::default(),
    };

    if let Some(quantity) = cli.quantity {
        config.quantity = quantity;
    }
    if let Some(color) = &cli.color {
        config.color = color.clone();
    }
    if let Err(e) = config.validate() {
        tracing::warn!("{e}; the field will still run");
    }
    config
}

/// Starts the native eframe application.
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if eframe fails to create the native window or event loop.
fn main() -> eframe::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    let config = resolve_config(&cli);
    let seed = cli.seed;
    tracing::info!(quantity = config.quantity, color = %config.color, "starting particle field");

    eframe::run_native(
        "Particle Field",
        eframe::NativeOptions::default(),
        Box::new(move |_cc| Ok(Box::new(Viewer::new(config, seed)))),
    )
}
