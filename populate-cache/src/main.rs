// ==============================================================================
// main.rs - VEP Cache Provisioning
// ==============================================================================
// Description: Downloads and unpacks annotator caches and reference FASTAs
//              into the shared data directory
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use vep_annotator::config::DEFAULT_DATA_DIR;
use vep_annotator::logging;

mod provisioner;
mod sources;

use provisioner::{CacheProvisioner, PopulateOutcome};

const DEFAULT_MARKER: &str = "/.installed";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Annotator version; only the release number before the first '.' is used
    #[arg(long, env = "VEP_VERSION")]
    vep_version: Option<String>,

    /// Re-fetch everything even if the cache is already populated
    #[arg(short, long)]
    force: bool,

    /// Only fetch GRCh38 data
    #[arg(long)]
    skip_grch37: bool,

    /// Cache and reference data directory
    #[arg(long, env = "VEP_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Sentinel file marking a completed populate run
    #[arg(long, env = "VEP_INSTALLED_MARKER", default_value = DEFAULT_MARKER)]
    marker: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init("vep_populate_cache=info");

    let args = Args::parse();

    let release = match args
        .vep_version
        .as_deref()
        .and_then(sources::release_from_version)
    {
        Some(release) => release,
        None => {
            error!("Environment variable VEP_VERSION is not set!");
            anyhow::bail!("VEP_VERSION must be set");
        }
    };

    let provisioner = CacheProvisioner::new(args.data_dir, args.marker);
    info!("Data directory: {:?}", provisioner.data_dir());

    let outcome = provisioner
        .populate(&release, args.skip_grch37, args.force)
        .await
        .context("Error populating cache")?;

    match outcome {
        PopulateOutcome::AlreadyPopulated => info!("Nothing to do"),
        PopulateOutcome::Populated { fetched } => {
            info!("Fetched {} sources for release {}", fetched, release)
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["vep-populate-cache", "--vep-version", "110.1"]).unwrap();
        assert_eq!(args.vep_version.as_deref(), Some("110.1"));
        assert!(!args.force);
        assert!(!args.skip_grch37);
    }

    #[test]
    fn test_short_force_flag() {
        let args = Args::try_parse_from(["vep-populate-cache", "-f", "--skip-grch37"]).unwrap();
        assert!(args.force);
        assert!(args.skip_grch37);
    }
}
