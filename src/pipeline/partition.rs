// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pcaflow contributors

//! Chromosome partitions for array stages
//!
//! A range expression is a comma-separated list of chromosomes or inclusive
//! ranges: `1-22`, `2,5,9`, `1-10,X`. `X` and `Y` are accepted as aliases for
//! 23 and 24. The result is sorted and free of duplicates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::errors::PipelineError;

/// Highest chromosome number accepted (`Y`)
pub const MAX_CHROMOSOME: u8 = 24;

/// Placeholder the R scripts replace with the chromosome number
pub const CHROMOSOME_PLACEHOLDER: &str = " ";

/// Non-empty, ordered set of chromosomes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionRange {
    chromosomes: Vec<u8>,
}

impl PartitionRange {
    /// Parse a range expression
    pub fn parse(input: &str) -> Result<Self, PipelineError> {
        let error = |reason: String| PipelineError::PartitionRangeParse {
            input: input.to_string(),
            reason,
        };

        let mut set = BTreeSet::new();

        for part in input.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(error("empty element".into()));
            }

            match part.split_once('-') {
                Some((start, end)) => {
                    let start = parse_chromosome(start.trim()).map_err(error)?;
                    let end = parse_chromosome(end.trim()).map_err(error)?;
                    if start > end {
                        return Err(error(format!("range '{}' is reversed", part)));
                    }
                    set.extend(start..=end);
                }
                None => {
                    set.insert(parse_chromosome(part).map_err(error)?);
                }
            }
        }

        Ok(Self {
            chromosomes: set.into_iter().collect(),
        })
    }

    /// Chromosomes in ascending order
    pub fn chromosomes(&self) -> &[u8] {
        &self.chromosomes
    }

    /// Number of partitions
    pub fn len(&self) -> usize {
        self.chromosomes.len()
    }

    /// Always false; a parsed range has at least one chromosome
    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }

    /// First and last chromosome, if the set has no gaps
    pub fn contiguous_bounds(&self) -> Option<(u8, u8)> {
        let first = *self.chromosomes.first()?;
        let last = *self.chromosomes.last()?;
        (usize::from(last - first) + 1 == self.chromosomes.len()).then_some((first, last))
    }

    /// Scheduler array spec, with consecutive runs collapsed (`1-3,5`)
    pub fn array_spec(&self) -> String {
        let mut runs: Vec<(u8, u8)> = Vec::new();
        for &chr in &self.chromosomes {
            match runs.last_mut() {
                Some((_, end)) if *end + 1 == chr => *end = chr,
                _ => runs.push((chr, chr)),
            }
        }

        runs.iter()
            .map(|&(start, end)| {
                if start == end {
                    start.to_string()
                } else {
                    format!("{}-{}", start, end)
                }
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Space-separated list, as written into stage configuration
    pub fn config_list(&self) -> String {
        self.chromosomes
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn parse_chromosome(token: &str) -> Result<u8, String> {
    match token {
        "X" | "x" => return Ok(23),
        "Y" | "y" => return Ok(24),
        _ => {}
    }

    let chr: u8 = token
        .parse()
        .map_err(|_| format!("'{}' is not a chromosome", token))?;

    if chr == 0 || chr > MAX_CHROMOSOME {
        return Err(format!(
            "chromosome {} is outside 1-{}",
            chr, MAX_CHROMOSOME
        ));
    }

    Ok(chr)
}

impl FromStr for PartitionRange {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PartitionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.array_spec())
    }
}
