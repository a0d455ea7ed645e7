use anyhow::Result;

use crate::http::Probe;
use crate::manifest::{LinkDescriptor, ManifestStore};
use crate::provider::{ProviderRegistry, resolve_url};
use crate::runtime::Runtime;

use super::config::Config;

const UNKNOWN_PROVIDER: &str = "<unknown provider>";

/// One row of `list` output.
fn format_entry(registry: &ProviderRegistry, name: &str, descriptor: &LinkDescriptor) -> String {
    let url = resolve_url(registry, name, &descriptor.as_request())
        .unwrap_or_else(|_| UNKNOWN_PROVIDER.to_string());
    match descriptor {
        LinkDescriptor::Provider { .. } => format!("{}  {}  {}", name, descriptor, url),
        LinkDescriptor::Url { .. } => format!("{}  {}", name, url),
    }
}

/// List linked modules in manifest order
#[tracing::instrument(skip(config))]
pub fn list<R: Runtime, P: Probe>(config: &Config<R, P>) -> Result<()> {
    let store = ManifestStore::new(&config.runtime, config.paths.manifest_path());
    let manifest = store.read_or_empty()?;

    if manifest.is_empty() {
        println!("No modules linked.");
        return Ok(());
    }

    for (name, descriptor) in manifest.iter() {
        println!("{}", format_entry(&config.registry, name, descriptor));
    }
    Ok(())
}
