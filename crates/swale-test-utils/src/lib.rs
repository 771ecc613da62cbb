//! Test utilities for Swale development.
//!
//! [`fixtures`] builds small, valid drainage networks; [`models`] provides
//! runoff and routing collaborators that fail or produce non-finite output
//! on demand, for exercising the step engine's error paths.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
pub mod models;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use swale_core::{LoadError, Project, ProjectLoader};

/// A loader that maps input paths to prepared projects.
///
/// Unknown paths are rejected, like a missing input file would be.
#[derive(Clone, Debug, Default)]
pub struct PathLoader {
    projects: HashMap<PathBuf, Project>,
}

impl PathLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `project` for `path`.
    pub fn with(mut self, path: impl Into<PathBuf>, project: Project) -> Self {
        self.projects.insert(path.into(), project);
        self
    }
}

impl ProjectLoader for PathLoader {
    fn load(&self, input: &Path) -> Result<Project, LoadError> {
        self.projects.get(input).cloned().ok_or_else(|| LoadError::Io {
            path: input.display().to_string(),
            reason: "no such fixture".into(),
        })
    }
}
