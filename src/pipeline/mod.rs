// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pcaflow contributors

//! Pipeline graph construction
//!
//! This module defines the static stage table, per-stage configuration
//! derivation, the dependency frontier, and the orchestrator that submits
//! the PC-AiR pipeline as a graph of cluster jobs.

mod definition;
mod derive;
mod frontier;
mod graph;
mod orchestrator;
mod partition;

pub use definition::*;
pub use derive::{ConfigDeriver, StageOutputs, VariantSelection, VARIANT_INCLUDE_FILE};
pub use frontier::{Frontier, JoinSet};
pub use graph::SubmissionGraph;
pub use orchestrator::{
    OrchestrationReport, PipelineOrchestrator, PipelinePaths, RunOptions, SubmittedJob,
    PARTITION_FLAG,
};
pub use partition::{PartitionRange, CHROMOSOME_PLACEHOLDER, MAX_CHROMOSOME};
