// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pcaflow contributors

//! Graph of submitted jobs
//!
//! Rebuilds the dependency graph from an [`OrchestrationReport`], checks that
//! every job was submitted after all of its predecessors, and renders the
//! graph as text, DOT or Mermaid.

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use crate::pipeline::{OrchestrationReport, StageId};

/// Dependency graph of one run
pub struct SubmissionGraph {
    graph: DiGraph<StageId, ()>,
    index: HashMap<StageId, NodeIndex>,
    /// Edges whose predecessor handle was unknown or submitted later
    forward_references: Vec<(StageId, String)>,
}

impl SubmissionGraph {
    /// Build the graph from a report
    pub fn from_report(report: &OrchestrationReport) -> Self {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();
        let mut by_handle = HashMap::new();
        let mut forward_references = Vec::new();

        for job in &report.jobs {
            let node = graph.add_node(job.stage);
            index.insert(job.stage, node);

            for pred in job.predecessors() {
                match by_handle.get(pred) {
                    Some(&from) => {
                        graph.add_edge(from, node, ());
                    }
                    None => forward_references.push((job.stage, pred.to_string())),
                }
            }

            by_handle.insert(job.handle.clone(), node);
        }

        Self {
            graph,
            index,
            forward_references,
        }
    }

    /// Whether every predecessor was submitted before its dependent
    pub fn is_submission_order_valid(&self) -> bool {
        self.forward_references.is_empty() && toposort(&self.graph, None).is_ok()
    }

    /// Predecessors that were not known when their dependent was submitted
    pub fn forward_references(&self) -> &[(StageId, String)] {
        &self.forward_references
    }

    /// Direct predecessors of a stage
    pub fn dependencies(&self, stage: StageId) -> Option<Vec<StageId>> {
        let node = self.index.get(&stage)?;
        let mut deps: Vec<StageId> = self
            .graph
            .neighbors_directed(*node, petgraph::Direction::Incoming)
            .map(|n| self.graph[n])
            .collect();
        deps.sort();
        Some(deps)
    }

    /// Stages nothing depends on
    pub fn leaves(&self) -> Vec<StageId> {
        self.graph
            .node_indices()
            .filter(|n| {
                self.graph
                    .neighbors_directed(*n, petgraph::Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .map(|n| self.graph[n])
            .collect()
    }

    /// Generate Mermaid diagram of the graph
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");

        for node in self.graph.node_indices() {
            let stage = self.graph[node];
            out.push_str(&format!("    {}[{}]\n", mermaid_id(stage), stage));
        }

        for edge in self.graph.raw_edges() {
            out.push_str(&format!(
                "    {} --> {}\n",
                mermaid_id(self.graph[edge.source()]),
                mermaid_id(self.graph[edge.target()])
            ));
        }

        out
    }

    /// Generate DOT diagram of the graph
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph pipeline {\n");
        out.push_str("    rankdir=TB;\n");
        out.push_str("    node [shape=box, style=rounded];\n\n");

        for edge in self.graph.raw_edges() {
            out.push_str(&format!(
                "    \"{}\" -> \"{}\";\n",
                self.graph[edge.source()],
                self.graph[edge.target()]
            ));
        }

        // isolated nodes (a single-stage graph)
        for node in self.graph.node_indices() {
            if self.graph.neighbors_undirected(node).next().is_none() {
                out.push_str(&format!("    \"{}\";\n", self.graph[node]));
            }
        }

        out.push_str("}\n");
        out
    }

    /// Generate text representation in submission order
    pub fn to_text(&self, report: &OrchestrationReport) -> String {
        let mut out = String::new();

        for (i, job) in report.jobs.iter().enumerate() {
            out.push_str(&format!("{}. {} (job {})", i + 1, job.stage, job.handle));

            if let Some(ref partitions) = job.request.partitions {
                out.push_str(&format!(" [chromosomes: {}]", partitions));
            }

            let deps = self.dependencies(job.stage).unwrap_or_default();
            if !deps.is_empty() {
                let names: Vec<&str> = deps.iter().map(StageId::as_str).collect();
                out.push_str(&format!(" [depends: {}]", names.join(", ")));
            }

            out.push('\n');
        }

        out
    }
}

/// Mermaid node ids cannot contain '-'
fn mermaid_id(stage: StageId) -> String {
    stage.as_str().replace('-', "_")
}
