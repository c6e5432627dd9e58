// ==============================================================================
// main.rs - VEP Annotate Command Line
// ==============================================================================
// Description: Annotates variant tokens from the command line and prints the
//              annotator's records as a JSON array
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use vep_annotator::options::CallerOptions;
use vep_annotator::{logging, Annotator, AnnotatorConfig};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Variant token (chr_pos_ref_alt, chr_start_end_type or chr_start_end_ref_alt)
    #[arg(short, long = "query", required = true)]
    queries: Vec<String>,

    /// Annotator option override as key=value (e.g. assembly=GRCh37, sift=0)
    #[arg(short, long = "option", value_parser = parse_key_value)]
    options: Vec<(String, String)>,

    /// Annotator executable
    #[arg(long, env = "VEP_PROGRAM")]
    program: Option<PathBuf>,

    /// Cache and reference data directory
    #[arg(long, env = "VEP_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Annotator timeout in seconds
    #[arg(long, env = "VEP_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", raw)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init("vep_annotator=warn");

    let args = Args::parse();

    let mut config = AnnotatorConfig::from_env().context("Invalid annotator configuration")?;
    if let Some(program) = args.program {
        config.program = program;
    }
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(secs) = args.timeout_secs {
        anyhow::ensure!(secs > 0, "--timeout-secs must be greater than zero");
        config.timeout = Duration::from_secs(secs);
    }

    let annotator = Annotator::new(config);
    let caller = CallerOptions::from_pairs(args.options);

    info!("Annotating {} variant tokens", args.queries.len());
    let records = annotator
        .annotate(&args.queries, &caller)
        .await
        .context("Annotation failed")?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&records)?
    } else {
        serde_json::to_string(&records)?
    };
    println!("{}", json);

    Ok(())
}
