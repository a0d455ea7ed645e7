//! Stub files: `modules/<name>.js` re-exporting a remote module.

use anyhow::Result;
use log::debug;
use std::path::{Component, Path, PathBuf};

use crate::error::LinkError;
use crate::runtime::{Runtime, is_already_exists, is_not_found};

/// Directory holding the stubs, relative to the project root.
pub const MODULES_DIR: &str = "modules";

/// Extension of generated stubs.
pub const STUB_EXTENSION: &str = "js";

/// Outcome of preparing the modules directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirStatus {
    Created,
    AlreadyExists,
}

/// Outcome of deleting a stub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveStubResult {
    Removed,
    /// There was no stub to delete.
    NotFound,
}

/// Reject names whose stub would land outside the modules directory.
///
/// Scoped names such as `@scope/pkg` are accepted.
pub fn validate_name(name: &str) -> Result<()> {
    let escapes = Path::new(name)
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if name.is_empty() || escapes {
        anyhow::bail!("Invalid module name '{}'", name);
    }
    Ok(())
}

/// Render the content of a stub.
pub fn render_stub(url: &str, include_default_export: bool) -> String {
    let mut content = format!("export * from '{}';\n", url);
    if include_default_export {
        content.push_str(&format!("export {{ default }} from '{}';\n", url));
    }
    content
}

pub struct StubWriter<'a, R: Runtime> {
    runtime: &'a R,
    dir: PathBuf,
}

impl<'a, R: Runtime> StubWriter<'a, R> {
    pub fn new(runtime: &'a R, dir: PathBuf) -> Self {
        Self { runtime, dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the stub for `name`.
    pub fn stub_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, STUB_EXTENSION))
    }

    /// Create the modules directory unless it is already there.
    #[tracing::instrument(skip(self))]
    pub fn ensure_dir(&self) -> Result<DirStatus> {
        match self.runtime.create_dir(&self.dir) {
            Ok(()) => {
                debug!("Created {:?}", self.dir);
                Ok(DirStatus::Created)
            }
            Err(e) if is_already_exists(&e) => Ok(DirStatus::AlreadyExists),
            Err(e) => Err(LinkError::write(&self.dir, e).into()),
        }
    }

    /// Write (or overwrite) the stub for `name`.
    #[tracing::instrument(skip(self))]
    pub fn write(&self, name: &str, url: &str, include_default_export: bool) -> Result<PathBuf> {
        validate_name(name)?;
        let path = self.stub_path(name);
        let content = render_stub(url, include_default_export);

        self.runtime
            .write(&path, content.as_bytes())
            .map_err(|e| LinkError::write(&path, e))?;

        debug!("Wrote {:?}", path);
        Ok(path)
    }

    /// Delete the stub for `name`.
    #[tracing::instrument(skip(self))]
    pub fn remove(&self, name: &str) -> Result<RemoveStubResult> {
        validate_name(name)?;
        let path = self.stub_path(name);
        match self.runtime.remove_file(&path) {
            Ok(()) => Ok(RemoveStubResult::Removed),
            Err(e) if is_not_found(&e) => {
                debug!("{:?} does not exist", path);
                Ok(RemoveStubResult::NotFound)
            }
            Err(e) => Err(LinkError::write(&path, e).into()),
        }
    }
}
