// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pcaflow contributors

//! Pipeline orchestrator
//!
//! Walks the stage table once, in order. For each included stage it resolves
//! predecessors, derives and persists the stage configuration, submits the
//! job and then moves the frontier (or, for terminal stages, the join set).
//! The first error stops the walk; nothing after it is submitted.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::cluster::{ClusterGateway, CoreRequest, JobHandle, JobRequest};
use crate::config::{BaseConfig, ConfigStore, StageConfig};
use crate::errors::{PipelineError, PipelineResult};
use crate::pipeline::{
    planned_stages, stages, ConfigDeriver, Frontier, JoinSet, PartitionRange, PipelineFlags,
    PredecessorRule, StageCommand, StageId, StageOutputs, StageSpec,
};

/// Flag telling `runRscript.sh` to append the array task's chromosome
pub const PARTITION_FLAG: &str = "-c";

/// Pipeline install layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelinePaths {
    root: PathBuf,
}

impl PipelinePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// R driver every script stage runs through
    pub fn driver(&self) -> PathBuf {
        self.root.join("runRscript.sh")
    }

    /// R script for a stage
    pub fn script(&self, stem: &str) -> PathBuf {
        self.root.join("R").join(format!("{}.R", stem))
    }

    /// Cleanup action run by the join job
    pub fn cleanup(&self) -> PathBuf {
        self.root.join("cleanup.sh")
    }
}

/// Everything that varies between runs apart from the base configuration
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub flags: PipelineFlags,
    pub partitions: PartitionRange,
    pub cores: CoreRequest,
    pub email: Option<String>,
    pub paths: PipelinePaths,
    /// Pipeline version passed to every R script
    pub version: String,
    pub dry_run: bool,
}

/// A job as it was submitted
#[derive(Debug, Clone)]
pub struct SubmittedJob {
    pub stage: StageId,
    pub handle: JobHandle,
    pub request: JobRequest,
    pub config: StageConfig,
}

impl SubmittedJob {
    pub fn predecessors(&self) -> &[JobHandle] {
        &self.request.predecessors
    }
}

/// Result of orchestrating a pipeline
#[derive(Debug, Clone, Default)]
pub struct OrchestrationReport {
    /// Jobs in submission order
    pub jobs: Vec<SubmittedJob>,
}

impl OrchestrationReport {
    /// Submitted stages, in order
    pub fn stage_ids(&self) -> Vec<StageId> {
        self.jobs.iter().map(|j| j.stage).collect()
    }

    /// The job submitted for `stage`
    pub fn job(&self, stage: StageId) -> Option<&SubmittedJob> {
        self.jobs.iter().find(|j| j.stage == stage)
    }

    /// Stage that was given `handle`
    pub fn stage_of(&self, handle: &JobHandle) -> Option<StageId> {
        self.jobs.iter().find(|j| &j.handle == handle).map(|j| j.stage)
    }

    /// Stages `stage` was made to wait for, sorted
    pub fn predecessor_stages(&self, stage: StageId) -> Vec<StageId> {
        let Some(job) = self.job(stage) else {
            return Vec::new();
        };
        let mut stages: Vec<StageId> = job
            .predecessors()
            .iter()
            .filter_map(|h| self.stage_of(h))
            .collect();
        stages.sort();
        stages.dedup();
        stages
    }
}

/// Drives derivation, persistence and submission
pub struct PipelineOrchestrator<'a> {
    store: &'a mut dyn ConfigStore,
    gateway: &'a mut dyn ClusterGateway,
}

impl<'a> PipelineOrchestrator<'a> {
    pub fn new(store: &'a mut dyn ConfigStore, gateway: &'a mut dyn ClusterGateway) -> Self {
        Self { store, gateway }
    }

    /// Build and submit the whole graph
    pub async fn run(
        &mut self,
        base: &BaseConfig,
        options: &RunOptions,
    ) -> PipelineResult<OrchestrationReport> {
        let deriver = ConfigDeriver::new(&options.partitions);
        let mut frontier = Frontier::empty();
        let mut join_set = JoinSet::new();
        let mut handles: BTreeMap<StageId, JobHandle> = BTreeMap::new();
        let mut outputs = StageOutputs::new();
        let mut report = OrchestrationReport::default();

        let plan = planned_stages(&options.flags);
        tracing::debug!("Planned {} of {} stages", plan.len(), stages().len());

        // A partition set the backend cannot express fails before the first job
        if plan.iter().any(|spec| spec.partitioned) {
            self.gateway.check_partitions(&options.partitions)?;
        }

        for spec in plan {
            let predecessors = match spec.predecessors {
                PredecessorRule::Frontier => frontier.handles(),
                PredecessorRule::Stage(dep) => {
                    let handle = handles.get(&dep).cloned().ok_or_else(|| {
                        PipelineError::UnresolvedPredecessor {
                            stage: spec.id.to_string(),
                            predecessor: dep.to_string(),
                        }
                    })?;
                    vec![handle]
                }
                PredecessorRule::JoinSet => join_set.handles().to_vec(),
            };

            let config = deriver.derive(base, spec, &outputs)?;
            if let Some(path) = config.path() {
                self.store.persist(path, &config)?;
                tracing::debug!("Wrote {} configuration to {}", spec.id, path.display());
            }

            let request = build_request(spec, &config, predecessors, options);
            let handle = self.gateway.submit(&request).await?;
            tracing::info!(
                stage = %spec.id,
                job = %handle,
                after = ?request.predecessors.iter().map(JobHandle::as_str).collect::<Vec<_>>(),
                "Submitted"
            );

            outputs.record(&config);
            handles.insert(spec.id, handle.clone());

            if spec.terminal {
                join_set.add(handle.clone());
            } else {
                frontier = frontier.advance(handle.clone());
            }

            report.jobs.push(SubmittedJob {
                stage: spec.id,
                handle,
                request,
                config,
            });
        }

        Ok(report)
    }
}

fn build_request(
    spec: &StageSpec,
    config: &StageConfig,
    predecessors: Vec<JobHandle>,
    options: &RunOptions,
) -> JobRequest {
    let (command, args) = match spec.command {
        StageCommand::RScript(stem) => {
            let mut args = Vec::new();
            if spec.partitioned {
                args.push(PARTITION_FLAG.to_string());
            }
            args.push(options.paths.script(stem).display().to_string());
            if let Some(path) = config.path() {
                args.push(path.display().to_string());
            }
            args.push("--version".to_string());
            args.push(options.version.clone());
            (options.paths.driver(), args)
        }
        StageCommand::Cleanup => (options.paths.cleanup(), Vec::new()),
    };

    let notify = match spec.command {
        StageCommand::RScript(_) => options.email.clone(),
        StageCommand::Cleanup => None,
    };

    JobRequest {
        name: spec.id.to_string(),
        command,
        args,
        predecessors,
        partitions: spec.partitioned.then(|| options.partitions.clone()),
        cores: spec.requests_cores.then_some(options.cores),
        notify,
        dry_run: options.dry_run,
    }
}
