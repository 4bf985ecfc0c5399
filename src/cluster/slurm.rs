// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pcaflow contributors

//! Slurm backend
//!
//! Renders `sbatch` command lines. Dependencies use `afterok`, so a job never
//! starts after a failed predecessor.

use super::{ClusterOptions, JobRequest, Scheduler};
use crate::errors::PipelineResult;

/// Slurm scheduler (`sbatch`)
pub struct SlurmScheduler;

impl Scheduler for SlurmScheduler {
    fn program(&self) -> &'static str {
        "sbatch"
    }

    fn render(&self, request: &JobRequest, options: &ClusterOptions) -> PipelineResult<Vec<String>> {
        let mut args: Vec<String> = vec![
            "--parsable".into(),
            format!("--job-name={}", request.name),
        ];

        if !request.predecessors.is_empty() {
            let ids: Vec<&str> = request.predecessors.iter().map(|h| h.as_str()).collect();
            args.push(format!("--dependency=afterok:{}", ids.join(":")));
        }

        if let Some(ref partitions) = request.partitions {
            args.push(format!("--array={}", partitions.array_spec()));
        }

        // Slurm has no core range; ask for the upper bound
        if let Some(cores) = request.cores {
            args.push(format!("--cpus-per-task={}", cores.max));
        }

        if let Some(mb) = options.memory_for(&request.name) {
            args.push(format!("--mem={}", mb));
        }

        if let Some(ref email) = request.notify {
            args.push("--mail-type=END".into());
            args.push(format!("--mail-user={}", email));
        }

        for (flag, value) in &options.submit_opts {
            if value.is_empty() {
                args.push(flag.clone());
            } else if flag.starts_with("--") {
                args.push(format!("{}={}", flag, value));
            } else {
                args.push(flag.clone());
                args.push(value.clone());
            }
        }

        args.push(request.command.display().to_string());
        args.extend(request.args.iter().cloned());

        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{command_line, CoreRequest, JobHandle};
    use crate::pipeline::PartitionRange;
    use std::path::PathBuf;

    fn request(name: &str) -> JobRequest {
        JobRequest {
            name: name.into(),
            command: PathBuf::from("/opt/pipeline/runRscript.sh"),
            args: vec![
                "-c".into(),
                "/opt/pipeline/R/ld_pruning.R".into(),
                "config/s_ld_pruning.config".into(),
            ],
            predecessors: vec![JobHandle::new("77")],
            partitions: Some(PartitionRange::parse("2,5,9").unwrap()),
            cores: None,
            notify: Some("me@example.org".into()),
            dry_run: false,
        }
    }

    #[test]
    fn test_render_array_request() {
        let mut options = ClusterOptions::default();
        options.submit_opts.insert("--partition".into(), "short".into());
        options.submit_opts.insert("--requeue".into(), String::new());

        let args = SlurmScheduler.render(&request("ld-pruning"), &options).unwrap();
        insta::assert_snapshot!(
            command_line("sbatch", &args),
            @"sbatch --parsable --job-name=ld-pruning --dependency=afterok:77 --array=2,5,9 --mail-type=END --mail-user=me@example.org --partition=short --requeue /opt/pipeline/runRscript.sh -c /opt/pipeline/R/ld_pruning.R config/s_ld_pruning.config"
        );
    }

    #[test]
    fn test_render_core_range_uses_upper_bound() {
        let mut req = request("pca");
        req.partitions = None;
        req.cores = Some(CoreRequest { min: 1, max: 8 });

        let args = SlurmScheduler.render(&req, &ClusterOptions::default()).unwrap();
        assert!(args.contains(&"--cpus-per-task=8".to_string()));
    }

    #[test]
    fn test_render_multiple_dependencies() {
        let mut req = request("join");
        req.partitions = None;
        req.predecessors = vec![JobHandle::new("5"), JobHandle::new("9")];

        let args = SlurmScheduler.render(&req, &ClusterOptions::default()).unwrap();
        assert!(args.contains(&"--dependency=afterok:5:9".to_string()));
    }

    #[test]
    fn test_gapped_partitions_are_accepted() {
        let gapped = PartitionRange::parse("2,5,9").unwrap();
        assert!(SlurmScheduler.validate_partitions(&gapped).is_ok());
    }

    #[test]
    fn test_parse_parsable_output() {
        assert_eq!(
            SlurmScheduler.parse_job_id("31337;gpu-cluster\n"),
            Some(JobHandle::new("31337"))
        );
    }
}
