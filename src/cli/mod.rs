// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pcaflow contributors

//! CLI definition and handler
//!
//! Defines the command-line interface for pcaflow.

pub mod run;

use clap::Parser;
use std::path::PathBuf;

/// PC-AiR pipeline orchestrator
///
/// Derives per-stage configuration and submits the pipeline as dependent
/// cluster jobs.
#[derive(Parser, Debug)]
#[clap(
    name = "pcaflow",
    version,
    about = "Submit the PC-AiR principal component analysis pipeline to a cluster",
    long_about = "PCA with the following steps:\n\
        1) Find unrelated sample set\n\
        2) Select variants with LD pruning using unrelated samples (optional)\n\
        3) PCA (using unrelated set, then project relatives)\n\
        4) PCA plots and PC-variant correlation by chromosome",
    after_help = "Examples:\n\
        pcaflow study.config                          Submit with SGE\n\
        pcaflow study.config --ld-pruning -c 1-22     Include LD pruning\n\
        pcaflow study.config --cluster-type slurm -c 2,5,9 --print-only"
)]
pub struct Cli {
    /// Pipeline configuration file
    #[clap(value_name = "CONFIG_FILE")]
    pub config_file: PathBuf,

    /// Run LD pruning of variants prior to PCA
    #[clap(long)]
    pub ld_pruning: bool,

    /// Chromosomes to run per-chromosome stages on (e.g. 1-22, 2,5,9, 1-10,X)
    #[clap(short, long, default_value = "1-22")]
    pub chromosomes: String,

    /// Cluster scheduler (sge, slurm)
    #[clap(long, default_value = "sge")]
    pub cluster_type: String,

    /// JSON file with options to pass to the cluster
    #[clap(long, value_name = "FILE")]
    pub cluster_file: Option<PathBuf>,

    /// Cores for the PCA stage; a number (4) or a range (1-8)
    #[clap(short = 'n', long, default_value = "1-8")]
    pub ncores: String,

    /// Email address for job reporting
    #[clap(short, long)]
    pub email: Option<String>,

    /// Print scheduler commands without submitting or writing files
    #[clap(long)]
    pub print_only: bool,

    /// Directory containing runRscript.sh, cleanup.sh and R/
    #[clap(long, env = "PCAFLOW_PIPELINE_PATH", value_name = "DIR")]
    pub pipeline_path: Option<PathBuf>,

    /// Print the submitted graph (text, dot, mermaid)
    #[clap(long, value_name = "FORMAT")]
    pub graph: Option<GraphFormat>,

    /// Enable verbose output
    #[clap(short, long)]
    pub verbose: bool,
}

/// Graph output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Text,
    Dot,
    Mermaid,
}

impl std::str::FromStr for GraphFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "dot" => Ok(Self::Dot),
            "mermaid" => Ok(Self::Mermaid),
            _ => Err(format!("Unknown graph format: {}", s)),
        }
    }
}
