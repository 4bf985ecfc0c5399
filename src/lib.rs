// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pcaflow contributors

//! # pcaflow - PC-AiR Pipeline Orchestrator
//!
//! `pcaflow` submits the PC-AiR principal component analysis pipeline to a
//! cluster scheduler as a graph of dependent jobs.
//!
//! ## Features
//!
//! - **Derived configuration** - One immutable configuration file per stage
//! - **Dependency wiring** - Each job holds on exactly the jobs it needs
//! - **Per-chromosome arrays** - Fan-out stages collapse to a single handle
//! - **Optional LD pruning** - Spliced in or left out as a unit
//! - **Print-only mode** - Preview every scheduler command without side effects
//!
//! ## Quick Start
//!
//! ```bash
//! # Preview the jobs
//! pcaflow study.config --print-only
//!
//! # Submit to Slurm with LD pruning on chromosomes 1-22
//! pcaflow study.config --cluster-type slurm --ld-pruning -c 1-22
//! ```

pub mod cli;
pub mod cluster;
pub mod config;
pub mod errors;
pub mod pipeline;
pub mod utils;

// Re-export commonly used types
pub use cluster::{ClusterGateway, JobHandle, JobRequest};
pub use config::{BaseConfig, ConfigStore, StageConfig};
pub use errors::{PipelineError, PipelineResult};
pub use pipeline::{OrchestrationReport, PipelineOrchestrator, RunOptions, StageId};

/// Library version, passed to every pipeline script
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
