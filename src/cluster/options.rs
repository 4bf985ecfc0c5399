// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pcaflow contributors

//! Scheduler options file
//!
//! ```json
//! {
//!   "pipeline_path": "/opt/analysis_pipeline",
//!   "submit_opts": { "-q": "all.q" },
//!   "memory_limits": { "pca": 16000 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::errors::{PipelineError, PipelineResult};

/// Options passed through to the scheduler
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterOptions {
    /// Directory holding `runRscript.sh`, `cleanup.sh` and `R/`
    #[serde(default)]
    pub pipeline_path: Option<PathBuf>,

    /// Extra submission flags; an empty value emits the flag alone
    #[serde(default)]
    pub submit_opts: BTreeMap<String, String>,

    /// Memory limit in megabytes, by job name
    #[serde(default)]
    pub memory_limits: BTreeMap<String, u64>,
}

impl ClusterOptions {
    /// Load options from a JSON file
    pub fn from_file(path: &Path) -> PipelineResult<Self> {
        let error = |e: String| PipelineError::ClusterOptions {
            path: path.to_path_buf(),
            error: e,
        };

        let content = std::fs::read_to_string(path).map_err(|e| error(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| error(e.to_string()))
    }

    /// Memory limit for a job, if configured
    pub fn memory_for(&self, job_name: &str) -> Option<u64> {
        self.memory_limits.get(job_name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_options_file() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            r#"{
                "pipeline_path": "/opt/pipeline",
                "submit_opts": {"-q": "all.q"},
                "memory_limits": {"pca": 16000}
            }"#,
        )
        .unwrap();

        let options = ClusterOptions::from_file(file.path()).unwrap();
        assert_eq!(options.pipeline_path, Some(PathBuf::from("/opt/pipeline")));
        assert_eq!(options.submit_opts["-q"], "all.q");
        assert_eq!(options.memory_for("pca"), Some(16000));
        assert_eq!(options.memory_for("pca-plots"), None);
    }

    #[test]
    fn test_empty_object_is_default() {
        let options: ClusterOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, ClusterOptions::default());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), r#"{"queue": "all.q"}"#).unwrap();

        let result = ClusterOptions::from_file(file.path());
        assert!(matches!(result, Err(PipelineError::ClusterOptions { .. })));
    }
}
