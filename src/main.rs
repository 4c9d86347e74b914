//! Main executable for smina-run

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use smina_run::{SminaPaths, SminaProperties};

/// Command-line arguments for the application
#[derive(Parser, Debug)]
#[clap(
    name = "smina_run",
    version = smina_run::VERSION,
    about = "Docks ligands to a predefined site on a target protein with smina"
)]
struct Cli {
    /// Configuration file or inline JSON/YAML with the tool properties
    #[clap(long)]
    config: Option<String>,

    /// Path to the input SDF ligands. Accepted formats: sdf
    #[clap(long = "input_ligands_sdf_path", value_parser)]
    input_ligands_sdf_path: PathBuf,

    /// Path to the input PDBQT receptor. Accepted formats: pdbqt
    #[clap(long = "input_receptor_pdbqt_path", value_parser)]
    input_receptor_pdbqt_path: PathBuf,

    /// Path to the smina box coordinates file. Accepted formats: yaml, yml
    #[clap(long = "input_site_coords_path", value_parser)]
    input_site_coords_path: PathBuf,

    /// Path to the output SDF file. Accepted formats: sdf
    #[clap(long = "output_sdf_path", value_parser)]
    output_sdf_path: PathBuf,

    /// Path to the log file. Accepted formats: log
    #[clap(long = "output_log_path", value_parser)]
    output_log_path: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize logger
    env_logger::init();

    // Parse command-line arguments
    let cli = Cli::parse();

    let config = cli.config.unwrap_or_default();
    let properties = SminaProperties::from_config(&config)
        .with_context(|| format!("Failed to load properties from config: {}", config))?;

    let paths = SminaPaths {
        input_ligands_sdf_path: cli.input_ligands_sdf_path,
        input_receptor_pdbqt_path: cli.input_receptor_pdbqt_path,
        input_site_coords_path: cli.input_site_coords_path,
        output_sdf_path: cli.output_sdf_path,
        output_log_path: cli.output_log_path,
    };

    let code = smina_run::smina_run(paths, properties).context("smina run failed")?;
    info!("smina finished with exit code {}", code);

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
