// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pcaflow contributors

//! Persistence of derived stage configuration
//!
//! [`FileConfigStore`] writes real files relative to a run directory.
//! [`MemoryConfigStore`] keeps everything in memory and is used for
//! print-only runs, so previewing a pipeline leaves no trace on disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{BaseConfig, StageConfig, RUN_SUBDIRS};
use crate::errors::{PipelineError, PipelineResult};

/// Destination for derived stage configuration
pub trait ConfigStore: Send {
    /// Create the run directories the naming roots point into
    fn prepare(&mut self, base: &BaseConfig) -> PipelineResult<()>;

    /// Persist a fully derived stage configuration at `path`
    fn persist(&mut self, path: &Path, config: &StageConfig) -> PipelineResult<()>;
}

/// Filesystem-backed store
pub struct FileConfigStore {
    /// Base directory for resolving relative paths
    base_dir: PathBuf,
}

impl FileConfigStore {
    /// Create a store resolving relative paths against `base_dir`
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

impl ConfigStore for FileConfigStore {
    fn prepare(&mut self, base: &BaseConfig) -> PipelineResult<()> {
        if !base.uses_run_directories() {
            return Ok(());
        }

        for dir in RUN_SUBDIRS {
            let dir = self.base_dir.join(dir);
            if !dir.exists() {
                tracing::debug!("Creating run directory {}", dir.display());
                std::fs::create_dir_all(&dir)?;
            }
        }

        Ok(())
    }

    fn persist(&mut self, path: &Path, config: &StageConfig) -> PipelineResult<()> {
        let target = self.resolve(path);
        let persist_error = |e: std::io::Error| PipelineError::Persist {
            stage: config.stage().to_string(),
            path: target.clone(),
            error: e.to_string(),
        };

        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(persist_error)?;
            }
        }

        // Write to a sibling and rename, so readers never see a partial file
        let mut staging = target.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        std::fs::write(&staging, config.render()).map_err(persist_error)?;
        std::fs::rename(&staging, &target).map_err(persist_error)?;

        Ok(())
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    files: BTreeMap<PathBuf, String>,
}

impl MemoryConfigStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Content persisted at `path`, if any
    pub fn get(&self, path: &Path) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    /// Number of persisted files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether nothing has been persisted
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn prepare(&mut self, _base: &BaseConfig) -> PipelineResult<()> {
        Ok(())
    }

    fn persist(&mut self, path: &Path, config: &StageConfig) -> PipelineResult<()> {
        self.files.insert(path.to_path_buf(), config.render());
        Ok(())
    }
}
