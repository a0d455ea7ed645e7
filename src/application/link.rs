//! Link action - resolves a module, records it in the manifest and writes its stub.
//!
//! A single link runs these stages in order, each one finishing before the
//! next starts:
//!
//! 1. preparing the modules directory
//! 2. resolving the URL
//! 3. checking reachability (only with `check` and no explicit URL)
//! 4. updating the manifest
//! 5. writing the stub
//!
//! The manifest is updated before the stub is written. If the stub write
//! fails the manifest entry is kept; running the link again repairs it.

use std::fmt;
use std::path::PathBuf;

use anyhow::Result;
use log::{debug, info, warn};

use super::ProjectPaths;
use crate::error::LinkError;
use crate::http::{Probe, Reachability};
use crate::manifest::{LinkDescriptor, ManifestStore};
use crate::provider::{ProviderRegistry, UrlRequest, resolve_url};
use crate::runtime::Runtime;
use crate::stub::{StubWriter, validate_name};

/// Options of a single link request. `None` means "use the default".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkOptions {
    pub provider: Option<String>,
    pub url: Option<String>,
    pub tag: Option<String>,
    /// Probe the URL before linking (default: true). Explicit URLs are never probed.
    pub check: Option<bool>,
    /// Also re-export `default` (default: true).
    pub include_default_export: Option<bool>,
}

impl From<&LinkDescriptor> for LinkOptions {
    fn from(descriptor: &LinkDescriptor) -> Self {
        match descriptor {
            LinkDescriptor::Provider { provider, tag } => LinkOptions {
                provider: Some(provider.clone()),
                tag: tag.clone(),
                ..Default::default()
            },
            LinkDescriptor::Url { url } => LinkOptions {
                url: Some(url.clone()),
                ..Default::default()
            },
        }
    }
}

/// Pipeline stage a link was in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStage {
    PreparingDirectory,
    ResolvingUrl,
    CheckingReachability,
    PersistingManifest,
    WritingStub,
}

impl fmt::Display for LinkStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            LinkStage::PreparingDirectory => "preparing the modules directory",
            LinkStage::ResolvingUrl => "resolving the URL",
            LinkStage::CheckingReachability => "checking reachability",
            LinkStage::PersistingManifest => "updating the manifest",
            LinkStage::WritingStub => "writing the stub",
        };
        f.write_str(stage)
    }
}

/// A successfully linked module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedModule {
    pub name: String,
    pub url: String,
    pub descriptor: LinkDescriptor,
    pub stub_path: PathBuf,
    /// Whether the URL was probed before linking.
    pub checked: bool,
}

/// A link that stopped at `stage`.
#[derive(Debug)]
pub struct LinkFailure {
    pub name: String,
    pub stage: LinkStage,
    pub error: anyhow::Error,
}

impl LinkFailure {
    pub fn kind(&self) -> Option<&LinkError> {
        LinkError::find(&self.error)
    }

    /// The manifest records the module even though its stub is missing.
    pub fn manifest_committed(&self) -> bool {
        self.stage == LinkStage::WritingStub
    }
}

impl fmt::Display for LinkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Failed to link {} while {}: {:#}",
            self.name, self.stage, self.error
        )
    }
}

impl std::error::Error for LinkFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let source: &(dyn std::error::Error + 'static) = self.error.as_ref();
        Some(source)
    }
}

/// Result of one module in a bulk relink.
#[derive(Debug)]
pub struct ModuleReport {
    pub name: String,
    pub result: Result<LinkedModule, LinkFailure>,
}

fn at(name: &str, stage: LinkStage) -> impl FnOnce(anyhow::Error) -> LinkFailure + '_ {
    move |error| LinkFailure {
        name: name.to_string(),
        stage,
        error,
    }
}

/// Link action - creates stubs for modules and records them in the manifest.
pub struct LinkAction<'a, R: Runtime, P: Probe> {
    registry: &'a ProviderRegistry,
    probe: &'a P,
    manifest: ManifestStore<'a, R>,
    stubs: StubWriter<'a, R>,
}

impl<'a, R: Runtime, P: Probe> LinkAction<'a, R, P> {
    pub fn new(
        runtime: &'a R,
        registry: &'a ProviderRegistry,
        probe: &'a P,
        paths: &ProjectPaths,
    ) -> Self {
        Self {
            registry,
            probe,
            manifest: ManifestStore::new(runtime, paths.manifest_path()),
            stubs: StubWriter::new(runtime, paths.modules_dir()),
        }
    }

    /// Link a single module.
    #[tracing::instrument(skip(self))]
    pub async fn link_one(
        &self,
        name: &str,
        options: &LinkOptions,
    ) -> Result<LinkedModule, LinkFailure> {
        let check = options.check.unwrap_or(true);
        let include_default_export = options.include_default_export.unwrap_or(true);
        let provider = options
            .provider
            .as_deref()
            .unwrap_or_else(|| self.registry.default_provider());

        debug!("{}: {}", name, LinkStage::PreparingDirectory);
        validate_name(name).map_err(at(name, LinkStage::PreparingDirectory))?;
        self.stubs
            .ensure_dir()
            .map_err(at(name, LinkStage::PreparingDirectory))?;

        debug!("{}: {}", name, LinkStage::ResolvingUrl);
        let request = UrlRequest {
            provider: Some(provider),
            tag: options.tag.as_deref(),
            explicit_url: options.url.as_deref(),
        };
        let url = resolve_url(self.registry, name, &request)
            .map_err(at(name, LinkStage::ResolvingUrl))?;
        debug!("Resolved {} to {}", name, url);

        let checked = check && options.url.is_none();
        if checked {
            debug!("{}: {}", name, LinkStage::CheckingReachability);
            match self.probe.probe(&url).await {
                Reachability::Reachable => info!("Found {} on {}", name, provider),
                Reachability::Unreachable(reason) => {
                    let error = LinkError::Unreachable {
                        url: url.clone(),
                        reason,
                    };
                    return Err(at(name, LinkStage::CheckingReachability)(error.into()));
                }
            }
        }

        debug!("{}: {}", name, LinkStage::PersistingManifest);
        let descriptor = match &options.url {
            Some(url) => LinkDescriptor::url(url.clone()),
            None => LinkDescriptor::provider(provider, options.tag.clone()),
        };
        self.manifest
            .upsert(name, &descriptor)
            .map_err(at(name, LinkStage::PersistingManifest))?;

        debug!("{}: {}", name, LinkStage::WritingStub);
        let stub_path = self
            .stubs
            .write(name, &url, include_default_export)
            .map_err(|e| {
                warn!("{} is in the manifest but its stub was not written", name);
                at(name, LinkStage::WritingStub)(e)
            })?;

        info!("Linked {} -> {}", name, url);
        Ok(LinkedModule {
            name: name.to_string(),
            url,
            descriptor,
            stub_path,
            checked,
        })
    }

    /// Relink every module in the manifest, one after another.
    pub async fn link_all(&self, check: bool) -> Result<Vec<ModuleReport>> {
        self.link_all_with(check, |_| {}).await
    }

    /// Relink every module in manifest order, calling `on_report` after each.
    ///
    /// A failed module does not stop the ones after it. Fails only when the
    /// manifest itself cannot be loaded.
    #[tracing::instrument(skip(self, on_report))]
    pub async fn link_all_with<F>(&self, check: bool, mut on_report: F) -> Result<Vec<ModuleReport>>
    where
        F: FnMut(&ModuleReport),
    {
        let manifest = self.manifest.get_all()?;
        if manifest.is_empty() {
            info!("No modules in {:?}", self.manifest.path());
            return Ok(Vec::new());
        }

        debug!("Relinking {} module(s)", manifest.len());
        let mut reports = Vec::with_capacity(manifest.len());

        for (name, descriptor) in manifest {
            let options = LinkOptions {
                check: Some(check),
                ..LinkOptions::from(&descriptor)
            };
            let result = self.link_one(&name, &options).await;
            if let Err(failure) = &result {
                warn!("{}", failure);
            }

            let report = ModuleReport { name, result };
            on_report(&report);
            reports.push(report);
        }

        Ok(reports)
    }
}
