// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pcaflow contributors

//! Static stage table
//!
//! The PC-AiR pipeline is a fixed sequence of stages listed in a valid
//! submission order. Conditional stages are skipped, never reordered.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageId {
    FindUnrelated,
    LdPruning,
    CombineVariants,
    Pca,
    PcaPlots,
    PcaCorr,
    PcaCorrPlots,
    Join,
}

impl StageId {
    /// Stage name, also used as the job name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FindUnrelated => "find-unrelated",
            Self::LdPruning => "ld-pruning",
            Self::CombineVariants => "combine-variants",
            Self::Pca => "pca",
            Self::PcaPlots => "pca-plots",
            Self::PcaCorr => "pca-corr",
            Self::PcaCorrPlots => "pca-corr-plots",
            Self::Join => "join",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a stage runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageCommand {
    /// `R/<stem>.R` through the `runRscript.sh` driver
    RScript(&'static str),
    /// `cleanup.sh`
    Cleanup,
}

/// Whether a stage is part of a given run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inclusion {
    Always,
    WhenLdPruning,
}

impl Inclusion {
    /// Evaluate against the run's flags
    pub fn includes(&self, flags: &PipelineFlags) -> bool {
        match self {
            Self::Always => true,
            Self::WhenLdPruning => flags.ld_pruning,
        }
    }
}

/// Where a stage's predecessors come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredecessorRule {
    /// Whatever the frontier holds when the stage is reached
    Frontier,
    /// A specific earlier stage
    Stage(StageId),
    /// Every terminal stage submitted so far
    JoinSet,
}

/// Flags that shape the graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineFlags {
    /// Run LD pruning and use the pruned variants for PCA
    pub ld_pruning: bool,
}

/// Static stage descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSpec {
    pub id: StageId,
    pub command: StageCommand,
    pub inclusion: Inclusion,
    pub predecessors: PredecessorRule,
    /// Runs once per chromosome as an array job
    pub partitioned: bool,
    /// Carries the run's core request
    pub requests_cores: bool,
    /// Ends a branch; its handle goes to the join set, not the frontier
    pub terminal: bool,
}

impl StageSpec {
    const fn new(id: StageId, command: StageCommand) -> Self {
        Self {
            id,
            command,
            inclusion: Inclusion::Always,
            predecessors: PredecessorRule::Frontier,
            partitioned: false,
            requests_cores: false,
            terminal: false,
        }
    }

    const fn when(mut self, inclusion: Inclusion) -> Self {
        self.inclusion = inclusion;
        self
    }

    const fn after(mut self, predecessors: PredecessorRule) -> Self {
        self.predecessors = predecessors;
        self
    }

    const fn partitioned(mut self) -> Self {
        self.partitioned = true;
        self
    }

    const fn requests_cores(mut self) -> Self {
        self.requests_cores = true;
        self
    }

    const fn terminal(mut self) -> Self {
        self.terminal = true;
        self
    }

    /// R script stem, for stages that run one
    pub fn script_stem(&self) -> Option<&'static str> {
        match self.command {
            StageCommand::RScript(stem) => Some(stem),
            StageCommand::Cleanup => None,
        }
    }
}

static STAGES: [StageSpec; 8] = [
    StageSpec::new(StageId::FindUnrelated, StageCommand::RScript("find_unrelated")),
    StageSpec::new(StageId::LdPruning, StageCommand::RScript("ld_pruning"))
        .when(Inclusion::WhenLdPruning)
        .partitioned(),
    StageSpec::new(StageId::CombineVariants, StageCommand::RScript("combine_variants"))
        .when(Inclusion::WhenLdPruning),
    StageSpec::new(StageId::Pca, StageCommand::RScript("pca_byrel")).requests_cores(),
    StageSpec::new(StageId::PcaPlots, StageCommand::RScript("pca_plots"))
        .after(PredecessorRule::Stage(StageId::Pca))
        .terminal(),
    StageSpec::new(StageId::PcaCorr, StageCommand::RScript("pca_corr"))
        .after(PredecessorRule::Stage(StageId::Pca))
        .partitioned(),
    StageSpec::new(StageId::PcaCorrPlots, StageCommand::RScript("pca_corr_plots")).terminal(),
    StageSpec::new(StageId::Join, StageCommand::Cleanup).after(PredecessorRule::JoinSet),
];

/// All stages in submission order
pub fn stages() -> &'static [StageSpec] {
    &STAGES
}

/// Look up a stage's descriptor
pub fn stage(id: StageId) -> Option<&'static StageSpec> {
    STAGES.iter().find(|s| s.id == id)
}

/// Stages a run with `flags` submits, in order
pub fn planned_stages(flags: &PipelineFlags) -> Vec<&'static StageSpec> {
    STAGES
        .iter()
        .filter(|s| s.inclusion.includes(flags))
        .collect()
}
