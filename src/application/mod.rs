//! Application layer - the link and unlink use cases.
//!
//! Each action sequences the lower layers (provider registry, probe,
//! manifest store, stub writer) and turns their failures into outcomes.

mod link;
mod unlink;

use std::path::{Path, PathBuf};

use crate::manifest::MANIFEST_FILE;
use crate::stub::MODULES_DIR;

pub use link::{LinkAction, LinkFailure, LinkOptions, LinkStage, LinkedModule, ModuleReport};
pub use unlink::{UnlinkAction, UnlinkResult};

/// Locations of the manifest and stub directory inside a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    root: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/modules.json`
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    /// `<root>/modules`
    pub fn modules_dir(&self) -> PathBuf {
        self.root.join(MODULES_DIR)
    }
}
