//! Unlink action - drops a module from the manifest and deletes its stub.

use anyhow::Result;
use log::{debug, info, warn};
use std::path::PathBuf;

use super::ProjectPaths;
use crate::manifest::{LinkDescriptor, ManifestStore};
use crate::runtime::Runtime;
use crate::stub::{RemoveStubResult, StubWriter, validate_name};

/// Outcome of an unlink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlinkResult {
    pub name: String,
    /// The manifest entry that was removed, if there was one.
    pub removed: Option<LinkDescriptor>,
    pub stub: RemoveStubResult,
    pub stub_path: PathBuf,
}

impl UnlinkResult {
    /// The manifest was updated but there was no stub to delete.
    pub fn is_partial(&self) -> bool {
        self.stub == RemoveStubResult::NotFound
    }
}

pub struct UnlinkAction<'a, R: Runtime> {
    manifest: ManifestStore<'a, R>,
    stubs: StubWriter<'a, R>,
}

impl<'a, R: Runtime> UnlinkAction<'a, R> {
    pub fn new(runtime: &'a R, paths: &ProjectPaths) -> Self {
        Self {
            manifest: ManifestStore::new(runtime, paths.manifest_path()),
            stubs: StubWriter::new(runtime, paths.modules_dir()),
        }
    }

    /// Remove `name` from the manifest, then delete its stub.
    ///
    /// The stub is left alone when the manifest cannot be updated. A missing
    /// stub is reported, not treated as an error.
    #[tracing::instrument(skip(self))]
    pub fn unlink_one(&self, name: &str) -> Result<UnlinkResult> {
        validate_name(name)?;
        let removed = self.manifest.remove(name)?;
        if removed.is_none() {
            debug!("{} was not in the manifest", name);
        }

        let stub_path = self.stubs.stub_path(name);
        let stub = self.stubs.remove(name)?;
        match stub {
            RemoveStubResult::Removed => info!("Unlinked {}", name),
            RemoveStubResult::NotFound => warn!("No stub to delete at {:?}", stub_path),
        }

        Ok(UnlinkResult {
            name: name.to_string(),
            removed,
            stub,
            stub_path,
        })
    }
}
