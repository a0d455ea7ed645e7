//! Failure kinds surfaced by the link pipeline.
//!
//! Components return `anyhow::Result` and put a [`LinkError`] at the root of
//! the chain; orchestrators recover it with [`LinkError::find`].

use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum LinkError {
    /// Provider id has no entry in the provider table.
    UnknownProvider(String),
    /// The reachability probe did not get a 2xx response.
    Unreachable { url: String, reason: String },
    /// The manifest could not be read, parsed or written.
    Persistence { path: PathBuf, source: anyhow::Error },
    /// A stub file or the modules directory could not be written or deleted.
    Write { path: PathBuf, source: anyhow::Error },
}

impl LinkError {
    pub fn persistence(path: impl Into<PathBuf>, source: impl Into<anyhow::Error>) -> Self {
        LinkError::Persistence {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: impl Into<anyhow::Error>) -> Self {
        LinkError::Write {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Finds the first `LinkError` in an error chain.
    pub fn find(err: &anyhow::Error) -> Option<&LinkError> {
        err.chain().find_map(|cause| cause.downcast_ref::<LinkError>())
    }

    /// Short machine-friendly name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            LinkError::UnknownProvider(_) => "unknown-provider",
            LinkError::Unreachable { .. } => "unreachable",
            LinkError::Persistence { .. } => "persistence",
            LinkError::Write { .. } => "write",
        }
    }
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::UnknownProvider(id) => {
                write!(f, "No provider named '{}'.", id)
            }
            LinkError::Unreachable { url, reason } => {
                write!(
                    f,
                    "{} is not reachable ({}). Use --no-check to link it anyway.",
                    url, reason
                )
            }
            LinkError::Persistence { path, .. } => {
                write!(f, "Cannot read/write manifest {:?}", path)
            }
            LinkError::Write { path, .. } => write!(f, "Cannot write {:?}", path),
        }
    }
}

impl std::error::Error for LinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LinkError::Persistence { source, .. } | LinkError::Write { source, .. } => {
                let source: &(dyn std::error::Error + 'static) = source.as_ref();
                Some(source)
            }
            _ => None,
        }
    }
}
