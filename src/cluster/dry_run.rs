// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pcaflow contributors

//! Print-only gateway
//!
//! Renders each request exactly as the real gateway would, but never runs
//! the scheduler. Handles are `dryrun-1`, `dryrun-2`, ... in submission
//! order, so dependency wiring stays visible in the printed commands.

use async_trait::async_trait;

use super::{command_line, ClusterGateway, ClusterOptions, JobHandle, JobRequest, Scheduler};
use crate::errors::PipelineResult;
use crate::pipeline::PartitionRange;

/// Gateway that records and prints instead of submitting
pub struct DryRunGateway {
    scheduler: Box<dyn Scheduler>,
    options: ClusterOptions,
    echo: bool,
    commands: Vec<String>,
}

impl DryRunGateway {
    /// Create a print-only gateway for a scheduler
    pub fn new(scheduler: Box<dyn Scheduler>, options: ClusterOptions) -> Self {
        Self {
            scheduler,
            options,
            echo: false,
            commands: Vec::new(),
        }
    }

    /// Print each command to stdout as it is rendered
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Commands rendered so far
    pub fn commands(&self) -> &[String] {
        &self.commands
    }
}

#[async_trait]
impl ClusterGateway for DryRunGateway {
    fn check_partitions(&self, partitions: &PartitionRange) -> PipelineResult<()> {
        self.scheduler.validate_partitions(partitions)
    }

    async fn submit(&mut self, request: &JobRequest) -> PipelineResult<JobHandle> {
        let args = self.scheduler.render(request, &self.options)?;
        let line = command_line(self.scheduler.program(), &args);

        if self.echo {
            println!("{}", line);
        }
        tracing::debug!("print-only: {}", line);

        self.commands.push(line);
        Ok(JobHandle::new(format!("dryrun-{}", self.commands.len())))
    }
}
