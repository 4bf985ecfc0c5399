// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pcaflow contributors

//! Error types for pipeline orchestration
//!
//! Every variant is fatal: the orchestrator aborts at the first error and
//! never submits a stage whose predecessors could not be established.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for pcaflow operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Main error type for pcaflow
#[derive(Error, Debug, Diagnostic)]
pub enum PipelineError {
    // ─────────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Configuration file not found: {path}")]
    #[diagnostic(
        code(pcaflow::config_not_found),
        help("Pass the path to an existing pipeline configuration file")
    )]
    ConfigNotFound { path: PathBuf },

    #[error("Failed to load configuration '{path}' (line {line}): {reason}")]
    #[diagnostic(
        code(pcaflow::config_load),
        help("Each line must be 'key value'; quote values containing spaces")
    )]
    ConfigLoad {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Configuration key '{key}' is required")]
    #[diagnostic(
        code(pcaflow::missing_key),
        help("Set out_prefix, or all of data_prefix, plots_prefix and config_prefix")
    )]
    MissingKey { key: String },

    #[error("Cannot derive configuration for stage '{stage}': missing key '{key}'")]
    #[diagnostic(
        code(pcaflow::config_derive),
        help("Add '{key}' to the base configuration, or set 'out_prefix' so it can be derived")
    )]
    ConfigDerive { stage: String, key: String },

    #[error("Failed to write configuration for stage '{stage}' to '{path}': {error}")]
    #[diagnostic(code(pcaflow::persist))]
    Persist {
        stage: String,
        path: PathBuf,
        error: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Argument Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Invalid chromosome range '{input}': {reason}")]
    #[diagnostic(
        code(pcaflow::partition_range),
        help("Use a range or list such as '1-22', '2,5,9' or '1-10,X'")
    )]
    PartitionRangeParse { input: String, reason: String },

    #[error("Invalid core request '{input}': {reason}")]
    #[diagnostic(
        code(pcaflow::core_request),
        help("Use a single number (e.g. 4) or a range (e.g. 1-8)")
    )]
    CoreRequestParse { input: String, reason: String },

    #[error("Unknown cluster type: {name}")]
    #[diagnostic(
        code(pcaflow::unknown_cluster_type),
        help("Available cluster types: sge, slurm")
    )]
    UnknownClusterType { name: String },

    #[error("{scheduler} array jobs need a contiguous chromosome range, got '{partitions}'")]
    #[diagnostic(
        code(pcaflow::unsupported_partitions),
        help("Use --cluster-type slurm for discontinuous chromosome sets")
    )]
    UnsupportedPartitions {
        scheduler: String,
        partitions: String,
    },

    #[error("Failed to read cluster options '{path}': {error}")]
    #[diagnostic(code(pcaflow::cluster_options))]
    ClusterOptions { path: PathBuf, error: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Submission Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Submission of stage '{stage}' failed: {reason}")]
    #[diagnostic(code(pcaflow::submission))]
    Submission {
        stage: String,
        reason: String,
        #[help]
        help: Option<String>,
    },

    #[error("Scheduler command '{program}' not found")]
    #[diagnostic(
        code(pcaflow::scheduler_not_found),
        help("Run on a cluster submit host, or use --print-only to preview the jobs")
    )]
    SchedulerNotFound { program: String },

    #[error("Stage '{stage}' depends on '{predecessor}', which has not been submitted")]
    #[diagnostic(code(pcaflow::unresolved_predecessor))]
    UnresolvedPredecessor { stage: String, predecessor: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(pcaflow::io_error))]
    Io { message: String },

    #[error("JSON parsing error: {message}")]
    #[diagnostic(code(pcaflow::json_error))]
    Json { message: String },
}

impl From<std::io::Error> for PipelineError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl PipelineError {
    /// Create a submission error without a help message
    pub fn submission(stage: &str, reason: impl Into<String>) -> Self {
        Self::Submission {
            stage: stage.to_string(),
            reason: reason.into(),
            help: None,
        }
    }

    /// Create a submission error from scheduler stderr, adding a hint when
    /// the failure looks familiar
    pub fn submission_rejected(stage: &str, program: &str, stderr: &str) -> Self {
        Self::Submission {
            stage: stage.to_string(),
            reason: format!("{} rejected the job: {}", program, stderr.trim()),
            help: Self::hint_for_scheduler_error(stderr),
        }
    }

    fn hint_for_scheduler_error(stderr: &str) -> Option<String> {
        if stderr.contains("Invalid account") || stderr.contains("invalid partition") {
            Some("Set the account or partition in the cluster options file (submit_opts)".into())
        } else if stderr.contains("Unable to run job") || stderr.contains("unknown queue") {
            Some("Check the queue given in the cluster options file (submit_opts)".into())
        } else if stderr.contains("Job dependency problem") {
            Some("A predecessor job is no longer known to the scheduler".into())
        } else {
            None
        }
    }

    /// Stage the error is attributed to, when there is one
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::ConfigDerive { stage, .. }
            | Self::Persist { stage, .. }
            | Self::Submission { stage, .. }
            | Self::UnresolvedPredecessor { stage, .. } => Some(stage),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_rejected_adds_hint() {
        let err = PipelineError::submission_rejected(
            "pca",
            "sbatch",
            "sbatch: error: Batch job submission failed: Invalid account\n",
        );
        match err {
            PipelineError::Submission { stage, reason, help } => {
                assert_eq!(stage, "pca");
                assert!(reason.starts_with("sbatch rejected the job"));
                assert!(help.is_some());
            }
            _ => panic!("Expected Submission error"),
        }
    }

    #[test]
    fn test_stage_attribution() {
        let err = PipelineError::ConfigDerive {
            stage: "pca-plots".into(),
            key: "plots_prefix".into(),
        };
        assert_eq!(err.stage(), Some("pca-plots"));
        assert!(err.to_string().contains("plots_prefix"));

        let err = PipelineError::Io { message: "boom".into() };
        assert_eq!(err.stage(), None);
    }
}
