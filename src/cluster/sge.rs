// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pcaflow contributors

//! Sun Grid Engine backend
//!
//! Renders `qsub` command lines. Array jobs use `-t`, which SGE only accepts
//! as a contiguous range.

use super::{ClusterOptions, JobRequest, Scheduler};
use crate::errors::{PipelineError, PipelineResult};
use crate::pipeline::PartitionRange;

/// Parallel environment used for core requests
const PARALLEL_ENV: &str = "local";

/// SGE scheduler (`qsub`)
pub struct SgeScheduler;

impl Scheduler for SgeScheduler {
    fn program(&self) -> &'static str {
        "qsub"
    }

    fn validate_partitions(&self, partitions: &PartitionRange) -> PipelineResult<()> {
        array_bounds(partitions).map(|_| ())
    }

    fn render(&self, request: &JobRequest, options: &ClusterOptions) -> PipelineResult<Vec<String>> {
        let mut args: Vec<String> = vec![
            "-terse".into(),
            "-cwd".into(),
            "-j".into(),
            "y".into(),
            "-N".into(),
            request.name.clone(),
        ];

        if !request.predecessors.is_empty() {
            let holds: Vec<&str> = request.predecessors.iter().map(|h| h.as_str()).collect();
            args.push("-hold_jid".into());
            args.push(holds.join(","));
        }

        if let Some(ref partitions) = request.partitions {
            let (first, last) = array_bounds(partitions)?;
            args.push("-t".into());
            args.push(format!("{}-{}", first, last));
        }

        if let Some(cores) = request.cores {
            args.push("-pe".into());
            args.push(PARALLEL_ENV.into());
            args.push(cores.to_string());
        }

        if let Some(mb) = options.memory_for(&request.name) {
            args.push("-l".into());
            args.push(format!("h_vmem={}M", mb));
        }

        if let Some(ref email) = request.notify {
            args.extend(["-m".into(), "e".into(), "-M".into(), email.clone()]);
        }

        for (flag, value) in &options.submit_opts {
            args.push(flag.clone());
            if !value.is_empty() {
                args.push(value.clone());
            }
        }

        args.push(request.command.display().to_string());
        args.extend(request.args.iter().cloned());

        Ok(args)
    }
}

fn array_bounds(partitions: &PartitionRange) -> PipelineResult<(u8, u8)> {
    partitions
        .contiguous_bounds()
        .ok_or_else(|| PipelineError::UnsupportedPartitions {
            scheduler: "SGE".into(),
            partitions: partitions.array_spec(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{command_line, CoreRequest, JobHandle};
    use std::path::PathBuf;

    fn request(name: &str) -> JobRequest {
        JobRequest {
            name: name.into(),
            command: PathBuf::from("/opt/pipeline/runRscript.sh"),
            args: vec![
                "/opt/pipeline/R/pca_byrel.R".into(),
                "config/s_pca_byrel.config".into(),
            ],
            predecessors: vec![],
            partitions: None,
            cores: None,
            notify: None,
            dry_run: false,
        }
    }

    #[test]
    fn test_render_full_request() {
        let mut req = request("pca");
        req.predecessors = vec![JobHandle::new("101"), JobHandle::new("102")];
        req.cores = Some(CoreRequest { min: 1, max: 8 });
        req.notify = Some("me@example.org".into());

        let mut options = ClusterOptions::default();
        options.memory_limits.insert("pca".into(), 16000);
        options.submit_opts.insert("-q".into(), "all.q".into());

        let args = SgeScheduler.render(&req, &options).unwrap();
        insta::assert_snapshot!(
            command_line("qsub", &args),
            @"qsub -terse -cwd -j y -N pca -hold_jid 101,102 -pe local 1-8 -l h_vmem=16000M -m e -M me@example.org -q all.q /opt/pipeline/runRscript.sh /opt/pipeline/R/pca_byrel.R config/s_pca_byrel.config"
        );
    }

    #[test]
    fn test_render_contiguous_array() {
        let mut req = request("pca-corr");
        req.partitions = Some(PartitionRange::parse("1-22").unwrap());

        let args = SgeScheduler.render(&req, &ClusterOptions::default()).unwrap();
        let t = args.iter().position(|a| a == "-t").unwrap();
        assert_eq!(args[t + 1], "1-22");
    }

    #[test]
    fn test_render_rejects_discontinuous_array() {
        let mut req = request("ld-pruning");
        req.partitions = Some(PartitionRange::parse("2,5,9").unwrap());

        let err = SgeScheduler.render(&req, &ClusterOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::UnsupportedPartitions { ref partitions, .. } if partitions == "2,5,9"
        ));
    }

    #[test]
    fn test_validate_partitions() {
        let gapped = PartitionRange::parse("2,5,9").unwrap();
        assert!(SgeScheduler.validate_partitions(&gapped).is_err());
        assert!(SgeScheduler
            .validate_partitions(&PartitionRange::parse("1-22").unwrap())
            .is_ok());
    }

    #[test]
    fn test_parse_terse_array_id() {
        assert_eq!(
            SgeScheduler.parse_job_id("4242.1-22:1\n"),
            Some(JobHandle::new("4242"))
        );
    }
}
