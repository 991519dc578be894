#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the range-map toolchain.
//!
//! Chains ingest -> classify -> transitions -> summaries -> breakdowns over
//! local input files and writes CSV outputs for downstream plotting and
//! tabulation.

mod export;
mod pipeline;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use range_map_analytics::GroupBy;

use crate::pipeline::InputArgs;

#[derive(Parser)]
#[command(name = "range_map", about = "Population range residency and movement analysis")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify fixes and derive transitions, writing the labeled dataset
    Classify {
        #[command(flatten)]
        input: InputArgs,
        /// Output CSV path for the labeled dataset
        #[arg(long, default_value = "labeled_fixes.csv")]
        output: PathBuf,
    },
    /// Derive per-individual movement summaries
    Summarize {
        #[command(flatten)]
        input: InputArgs,
        /// Output CSV path for the summaries
        #[arg(long, default_value = "individual_summaries.csv")]
        output: PathBuf,
    },
    /// Write grouped state and transition breakdown tables
    Breakdown {
        #[command(flatten)]
        input: InputArgs,
        /// Covariate to group by: SEX, AGE_CLASS, AGE_SEX, or HOME_POPULATION
        #[arg(long)]
        by: GroupBy,
        /// Directory to write the breakdown CSVs into
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Full pipeline: labeled dataset, summaries, and all breakdowns
    Run {
        #[command(flatten)]
        input: InputArgs,
        /// Directory to write all outputs into
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Classify { input, output } => {
            let labeled = pipeline::load_and_label(&input)?;
            export::write_labeled(&output, &labeled)?;
            log::info!("Wrote {} labeled fixes to {}", labeled.len(), output.display());
        }
        Commands::Summarize { input, output } => {
            let labeled = pipeline::load_and_label(&input)?;
            let summaries = range_map_transitions::summarize_all(&labeled)?;
            export::write_summaries(&output, &summaries)?;
            log::info!(
                "Wrote {} individual summaries to {}",
                summaries.len(),
                output.display()
            );
        }
        Commands::Breakdown {
            input,
            by,
            output_dir,
        } => {
            let labeled = pipeline::load_and_label(&input)?;
            export::write_breakdowns(&output_dir, &labeled, by)?;
        }
        Commands::Run { input, output_dir } => {
            let labeled = pipeline::load_and_label(&input)?;

            export::write_labeled(&output_dir.join("labeled_fixes.csv"), &labeled)?;

            let summaries = range_map_transitions::summarize_all(&labeled)?;
            export::write_summaries(
                &output_dir.join("individual_summaries.csv"),
                &summaries,
            )?;

            for &by in GroupBy::all() {
                export::write_breakdowns(&output_dir, &labeled, by)?;
            }

            log::info!(
                "Pipeline complete: {} fixes, {} individuals, outputs in {}",
                labeled.len(),
                summaries.len(),
                output_dir.display()
            );
        }
    }

    Ok(())
}
