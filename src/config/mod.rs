// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pcaflow contributors

//! Base and per-stage configuration
//!
//! The base configuration is read once and never mutated. Each stage gets its
//! own [`StageConfig`], built from the base plus upstream artifact paths.

mod format;
mod store;

pub use format::{parse_entries, render_entries};
pub use store::{ConfigStore, FileConfigStore, MemoryConfigStore};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::errors::{PipelineError, PipelineResult};
use crate::pipeline::StageId;

/// Naming root for data artifacts
pub const DATA_PREFIX: &str = "data_prefix";
/// Naming root for plot artifacts
pub const PLOTS_PREFIX: &str = "plots_prefix";
/// Naming root for derived configuration files
pub const CONFIG_PREFIX: &str = "config_prefix";
/// Run-wide prefix the naming roots are derived from when absent
pub const OUT_PREFIX: &str = "out_prefix";

/// Directories created for a run when the naming roots are derived
pub const RUN_SUBDIRS: [&str; 4] = ["config", "data", "log", "plots"];

/// Immutable base configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseConfig {
    entries: BTreeMap<String, String>,
}

impl BaseConfig {
    /// Build a base configuration from key/value pairs
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Load the base configuration from a file
    pub fn from_file(path: &Path) -> PipelineResult<Self> {
        if !path.exists() {
            return Err(PipelineError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::ConfigLoad {
            path: path.to_path_buf(),
            line: 0,
            reason: e.to_string(),
        })?;

        Ok(Self {
            entries: parse_entries(&content, path)?,
        })
    }

    /// Fill in any missing naming roots from `out_prefix`
    ///
    /// `data_prefix` becomes `data/<out_prefix>` and so on. Roots present in
    /// the file are kept verbatim; `out_prefix` is only needed when one is
    /// missing.
    pub fn with_run_prefixes(&self) -> PipelineResult<Self> {
        let mut entries = self.entries.clone();

        for (key, dir) in [
            (CONFIG_PREFIX, "config"),
            (DATA_PREFIX, "data"),
            (PLOTS_PREFIX, "plots"),
        ] {
            if entries.contains_key(key) {
                continue;
            }
            let out_prefix = self.get(OUT_PREFIX).ok_or_else(|| PipelineError::MissingKey {
                key: OUT_PREFIX.to_string(),
            })?;
            entries.insert(key.to_string(), format!("{}/{}", dir, out_prefix));
        }

        Ok(Self { entries })
    }

    /// Whether every naming root had to be derived from `out_prefix`
    pub fn uses_run_directories(&self) -> bool {
        [CONFIG_PREFIX, DATA_PREFIX, PLOTS_PREFIX]
            .iter()
            .all(|key| !self.entries.contains_key(*key))
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Get a value that a stage cannot be derived without
    pub fn require(&self, key: &str, stage: StageId) -> PipelineResult<&str> {
        self.get(key).ok_or_else(|| PipelineError::ConfigDerive {
            stage: stage.to_string(),
            key: key.to_string(),
        })
    }

    /// All entries, sorted by key
    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }
}

/// An artifact a stage writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Configuration key the path is written under
    pub key: String,
    /// Artifact path; per-partition paths contain the chromosome placeholder
    pub path: String,
    /// One file per partition rather than a single file
    pub per_partition: bool,
}

impl Artifact {
    /// A single-file artifact
    pub fn single(key: &str, path: String) -> Self {
        Self {
            key: key.to_string(),
            path,
            per_partition: false,
        }
    }

    /// An artifact written once per partition
    pub fn per_partition(key: &str, path: String) -> Self {
        Self {
            key: key.to_string(),
            path,
            per_partition: true,
        }
    }
}

/// Derived configuration for a single stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfig {
    stage: StageId,
    entries: BTreeMap<String, String>,
    outputs: Vec<Artifact>,
    path: Option<PathBuf>,
}

impl StageConfig {
    pub(crate) fn new(
        stage: StageId,
        entries: BTreeMap<String, String>,
        outputs: Vec<Artifact>,
        path: Option<PathBuf>,
    ) -> Self {
        Self {
            stage,
            entries,
            outputs,
            path,
        }
    }

    /// Stage this configuration belongs to
    pub fn stage(&self) -> StageId {
        self.stage
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Whether a key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// All entries, sorted by key
    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    /// Artifacts this stage produces
    pub fn outputs(&self) -> &[Artifact] {
        &self.outputs
    }

    /// Output artifact written under `key`
    pub fn output(&self, key: &str) -> Option<&Artifact> {
        self.outputs.iter().find(|a| a.key == key)
    }

    /// Where this configuration is persisted (the join stage has none)
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Serialized file content
    pub fn render(&self) -> String {
        render_entries(&self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_prefixes_from_out_prefix() {
        let base = BaseConfig::from_entries([("out_prefix", "study1")]);
        assert!(base.uses_run_directories());

        let prepared = base.with_run_prefixes().unwrap();
        assert_eq!(prepared.get(DATA_PREFIX), Some("data/study1"));
        assert_eq!(prepared.get(PLOTS_PREFIX), Some("plots/study1"));
        assert_eq!(prepared.get(CONFIG_PREFIX), Some("config/study1"));
        // original untouched
        assert_eq!(base.get(DATA_PREFIX), None);
    }

    #[test]
    fn test_explicit_prefixes_are_kept() {
        let base = BaseConfig::from_entries([
            (DATA_PREFIX, "study1"),
            (PLOTS_PREFIX, "study1"),
            (CONFIG_PREFIX, "study1"),
        ]);
        assert!(!base.uses_run_directories());
        assert_eq!(base.with_run_prefixes().unwrap(), base);
    }

    #[test]
    fn test_run_prefixes_need_out_prefix() {
        let base = BaseConfig::from_entries([(DATA_PREFIX, "study1"), ("gds_file", "g.gds")]);
        let err = base.with_run_prefixes().unwrap_err();
        assert!(matches!(err, PipelineError::MissingKey { ref key } if key == OUT_PREFIX));

        assert!(BaseConfig::default().with_run_prefixes().is_err());
    }

    #[test]
    fn test_require_reports_stage_and_key() {
        let base = BaseConfig::default();
        let err = base.require(DATA_PREFIX, StageId::Pca).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ConfigDerive { ref stage, ref key } if stage == "pca" && key == DATA_PREFIX
        ));
    }

    #[test]
    fn test_from_file_missing() {
        let result = BaseConfig::from_file(Path::new("/nonexistent/pcaflow.config"));
        assert!(matches!(result, Err(PipelineError::ConfigNotFound { .. })));
    }
}
