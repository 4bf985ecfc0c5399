// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pcaflow contributors

//! Submitting gateway
//!
//! Runs the scheduler's submission program and reads back the job id.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;

use super::{command_line, ClusterGateway, ClusterOptions, JobHandle, JobRequest, Scheduler};
use crate::errors::{PipelineError, PipelineResult};
use crate::pipeline::PartitionRange;
use crate::utils::create_spinner;

/// Gateway that submits to a real scheduler
pub struct SchedulerGateway {
    scheduler: Box<dyn Scheduler>,
    options: ClusterOptions,
    /// Resolved path of the submission program
    program: PathBuf,
    show_progress: bool,
}

impl SchedulerGateway {
    /// Create a gateway, checking that the submission program is installed
    pub fn new(scheduler: Box<dyn Scheduler>, options: ClusterOptions) -> PipelineResult<Self> {
        let name = scheduler.program();
        let program = which::which(name).map_err(|_| PipelineError::SchedulerNotFound {
            program: name.to_string(),
        })?;

        Ok(Self {
            scheduler,
            options,
            program,
            show_progress: false,
        })
    }

    /// Show a spinner while each submission is pending
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }
}

#[async_trait]
impl ClusterGateway for SchedulerGateway {
    fn check_partitions(&self, partitions: &PartitionRange) -> PipelineResult<()> {
        self.scheduler.validate_partitions(partitions)
    }

    async fn submit(&mut self, request: &JobRequest) -> PipelineResult<JobHandle> {
        if request.dry_run {
            return Err(PipelineError::submission(
                &request.name,
                "print-only request sent to a submitting gateway",
            ));
        }

        let args = self.scheduler.render(request, &self.options)?;
        let program = self.scheduler.program();
        tracing::debug!("{}", command_line(program, &args));

        let spinner = self
            .show_progress
            .then(|| create_spinner(&format!("Submitting {}", request.name)));

        let output = Command::new(&self.program).args(&args).output().await;

        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        let output = output.map_err(|e| {
            PipelineError::submission(&request.name, format!("failed to run {}: {}", program, e))
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            return Err(PipelineError::submission_rejected(&request.name, program, &stderr));
        }

        self.scheduler.parse_job_id(&stdout).ok_or_else(|| {
            PipelineError::submission(
                &request.name,
                format!("could not read a job id from {} output: '{}'", program, stdout.trim()),
            )
        })
    }
}
