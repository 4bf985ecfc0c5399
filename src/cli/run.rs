// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pcaflow contributors

//! Run command - derive configuration and submit the pipeline

use colored::Colorize;
use miette::Result;

use super::{Cli, GraphFormat};
use crate::cluster::{
    ClusterGateway, ClusterOptions, ClusterType, CoreRequest, DryRunGateway, Scheduler,
    SchedulerGateway,
};
use crate::config::{BaseConfig, ConfigStore, FileConfigStore, MemoryConfigStore};
use crate::pipeline::{
    stages, OrchestrationReport, PartitionRange, PipelineFlags, PipelineOrchestrator,
    PipelinePaths, RunOptions, SubmissionGraph,
};
use crate::utils::{print_header, print_info, print_skipped, print_submitted};

/// Run the pipeline
pub async fn run(cli: Cli) -> Result<()> {
    // Everything that can be rejected up front is, before any submission
    let partitions = PartitionRange::parse(&cli.chromosomes)?;
    let cores = CoreRequest::parse(&cli.ncores)?;
    let cluster_type: ClusterType = cli.cluster_type.parse()?;
    let scheduler = cluster_type.scheduler();
    scheduler.validate_partitions(&partitions)?;
    let cluster_options = match cli.cluster_file {
        Some(ref path) => ClusterOptions::from_file(path)?,
        None => ClusterOptions::default(),
    };

    let base = BaseConfig::from_file(&cli.config_file)?.with_run_prefixes()?;

    let working_dir = std::env::current_dir()
        .map_err(|e| miette::miette!("Failed to get current directory: {}", e))?;
    let pipeline_root = cli
        .pipeline_path
        .clone()
        .or_else(|| cluster_options.pipeline_path.clone())
        .unwrap_or_else(|| working_dir.clone());

    let options = RunOptions {
        flags: PipelineFlags {
            ld_pruning: cli.ld_pruning,
        },
        partitions,
        cores,
        email: cli.email.clone(),
        paths: PipelinePaths::new(pipeline_root),
        version: crate::VERSION.to_string(),
        dry_run: cli.print_only,
    };

    tracing::debug!(
        "Pipeline at {}, chromosomes {}, cores {}",
        options.paths.root().display(),
        options.partitions,
        options.cores
    );

    let (mut store, mut gateway): (Box<dyn ConfigStore>, Box<dyn ClusterGateway>) =
        if cli.print_only {
            (
                Box::new(MemoryConfigStore::new()),
                Box::new(DryRunGateway::new(scheduler, cluster_options).with_echo(true)),
            )
        } else {
            let gateway =
                SchedulerGateway::new(scheduler, cluster_options)?.with_progress(!cli.verbose);
            let mut store = FileConfigStore::new(working_dir);
            store.prepare(&base)?;
            (Box::new(store), Box::new(gateway))
        };

    let report = PipelineOrchestrator::new(store.as_mut(), gateway.as_mut())
        .run(&base, &options)
        .await
        .inspect_err(|e| {
            if let Some(stage) = e.stage() {
                tracing::error!(stage, "Run stopped; no later stage was submitted");
            }
        })?;

    print_summary(&report, &options);

    if let Some(format) = cli.graph {
        let graph = SubmissionGraph::from_report(&report);
        let output = match format {
            GraphFormat::Text => graph.to_text(&report),
            GraphFormat::Dot => graph.to_dot(),
            GraphFormat::Mermaid => graph.to_mermaid(),
        };
        println!();
        println!("{}", output);
    }

    Ok(())
}

fn print_summary(report: &OrchestrationReport, options: &RunOptions) {
    println!();
    print_header(if options.dry_run {
        "PC-AiR pipeline (print only)"
    } else {
        "PC-AiR pipeline"
    });

    for spec in stages() {
        let Some(job) = report.job(spec.id) else {
            print_skipped(spec.id.as_str());
            continue;
        };

        let mut detail = Vec::new();
        if let Some(ref partitions) = job.request.partitions {
            detail.push(format!("chromosomes {}", partitions));
        }
        let after = report.predecessor_stages(spec.id);
        if !after.is_empty() {
            let names: Vec<&str> = after.iter().map(|s| s.as_str()).collect();
            detail.push(format!("after {}", names.join(", ")));
        }

        print_submitted(
            spec.id.as_str(),
            &format!("job {}", job.handle),
            &detail.join("; "),
        );
    }

    println!();
    if options.dry_run {
        print_info(&format!(
            "{} jobs rendered, nothing submitted",
            report.jobs.len()
        ));
    } else {
        println!(
            "{}",
            format!("Submitted {} jobs", report.jobs.len()).green()
        );
    }
}
