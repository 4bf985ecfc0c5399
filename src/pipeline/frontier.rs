// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pcaflow contributors

//! Dependency frontier and join set

use crate::cluster::JobHandle;

/// Handles the next frontier-following stage depends on
///
/// Empty before the first submission, a single handle afterwards. A
/// partitioned stage contributes its one array handle, never one per task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontier(Option<JobHandle>);

impl Frontier {
    /// The frontier before anything has been submitted
    pub fn empty() -> Self {
        Self(None)
    }

    /// The frontier after `handle` was submitted
    pub fn advance(self, handle: JobHandle) -> Self {
        Self(Some(handle))
    }

    /// Handles to depend on
    pub fn handles(&self) -> Vec<JobHandle> {
        self.0.iter().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

/// Handles of terminal stages, for the final join
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinSet(Vec<JobHandle>);

impl JoinSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a terminal handle; repeats are ignored
    pub fn add(&mut self, handle: JobHandle) {
        if !self.0.contains(&handle) {
            self.0.push(handle);
        }
    }

    /// Handles in the order they were added
    pub fn handles(&self) -> &[JobHandle] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
