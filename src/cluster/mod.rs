// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pcaflow contributors

//! Cluster job submission
//!
//! This module provides the [`ClusterGateway`] trait the orchestrator submits
//! through, the scheduler backends (SGE and Slurm) that render a
//! [`JobRequest`] into a scheduler command line, and two gateways: one that
//! really submits and one that only prints.

mod dry_run;
mod gateway;
mod options;
mod sge;
mod slurm;

pub use dry_run::DryRunGateway;
pub use gateway::SchedulerGateway;
pub use options::ClusterOptions;
pub use sge::SgeScheduler;
pub use slurm::SlurmScheduler;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::{PipelineError, PipelineResult};
use crate::pipeline::PartitionRange;

/// Opaque handle for a submitted job
///
/// Only ever passed back to the scheduler as a dependency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobHandle(String);

impl JobHandle {
    /// Wrap a scheduler job id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as the scheduler knows it
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Number of cores requested, either fixed or a range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreRequest {
    pub min: u32,
    pub max: u32,
}

impl CoreRequest {
    /// Parse `N` or `N-M`
    pub fn parse(input: &str) -> Result<Self, PipelineError> {
        let error = |reason: &str| PipelineError::CoreRequestParse {
            input: input.to_string(),
            reason: reason.to_string(),
        };
        let number = |s: &str| -> Result<u32, PipelineError> {
            match s.trim().parse::<u32>() {
                Ok(0) => Err(error("core count must be at least 1")),
                Ok(n) => Ok(n),
                Err(_) => Err(error("not a number")),
            }
        };

        let (min, max) = match input.split_once('-') {
            Some((min, max)) => (number(min)?, number(max)?),
            None => {
                let n = number(input)?;
                (n, n)
            }
        };

        if min > max {
            return Err(error("range is reversed"));
        }

        Ok(Self { min, max })
    }
}

impl FromStr for CoreRequest {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CoreRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min == self.max {
            write!(f, "{}", self.min)
        } else {
            write!(f, "{}-{}", self.min, self.max)
        }
    }
}

/// Everything a gateway needs to submit one job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    /// Job name
    pub name: String,
    /// Executable the job runs
    pub command: PathBuf,
    /// Arguments passed to the command
    pub args: Vec<String>,
    /// Jobs that must complete before this one starts
    pub predecessors: Vec<JobHandle>,
    /// Run once per partition, as one array job
    pub partitions: Option<PartitionRange>,
    /// Core request
    pub cores: Option<CoreRequest>,
    /// Address notified when the job ends
    pub notify: Option<String>,
    /// Request was built for a print-only run
    pub dry_run: bool,
}

/// Submits jobs to a cluster
///
/// Implementations guarantee that a submitted job does not start until every
/// handle in `predecessors` has completed, and that the handle returned for a
/// partitioned request stands for the completion of all of its partitions.
/// Whether a failed predecessor also holds its dependents is up to the
/// backend: Slurm dependencies use `afterok` and never start them, SGE holds
/// only order by completion.
#[async_trait]
pub trait ClusterGateway: Send {
    /// Check a partition set before anything is submitted
    fn check_partitions(&self, _partitions: &PartitionRange) -> PipelineResult<()> {
        Ok(())
    }

    /// Submit a job and return its handle
    async fn submit(&mut self, request: &JobRequest) -> PipelineResult<JobHandle>;
}

/// Renders job requests for a specific scheduler
pub trait Scheduler: Send + Sync {
    /// Submission program (`qsub`, `sbatch`)
    fn program(&self) -> &'static str;

    /// Arguments for the submission program
    fn render(&self, request: &JobRequest, options: &ClusterOptions) -> PipelineResult<Vec<String>>;

    /// Reject a partition set this scheduler cannot express as one array job
    fn validate_partitions(&self, _partitions: &PartitionRange) -> PipelineResult<()> {
        Ok(())
    }

    /// Extract the job id from the submission program's output
    fn parse_job_id(&self, stdout: &str) -> Option<JobHandle> {
        leading_job_id(stdout)
    }
}

static JOB_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)").expect("job id pattern is valid"));

/// Leading run of digits, which is how both `qsub -terse` and
/// `sbatch --parsable` report the job id
pub(crate) fn leading_job_id(stdout: &str) -> Option<JobHandle> {
    JOB_ID_PATTERN
        .captures(stdout)
        .and_then(|caps| caps.get(1))
        .map(|m| JobHandle::new(m.as_str()))
}

/// Supported cluster schedulers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterType {
    Sge,
    Slurm,
}

impl ClusterType {
    /// Scheduler backend for this cluster type
    pub fn scheduler(&self) -> Box<dyn Scheduler> {
        match self {
            Self::Sge => Box::new(SgeScheduler),
            Self::Slurm => Box::new(SlurmScheduler),
        }
    }
}

impl FromStr for ClusterType {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sge" | "uw_cluster" => Ok(Self::Sge),
            "slurm" => Ok(Self::Slurm),
            _ => Err(PipelineError::UnknownClusterType {
                name: s.to_string(),
            }),
        }
    }
}

/// Render a program and its arguments as a copy-pasteable shell line
pub fn command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program.to_string())
        .chain(args.iter().map(|arg| shell_quote(arg)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,@%+".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
