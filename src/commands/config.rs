use anyhow::Result;
use log::debug;
use std::path::PathBuf;

use crate::{
    application::ProjectPaths,
    http::{HttpProbe, Probe, build_client},
    provider::ProviderRegistry,
    runtime::Runtime,
};

/// Name of the per-user configuration directory.
pub const CONFIG_DIR_NAME: &str = "cdnlink";

/// File holding a custom provider table.
pub const PROVIDERS_FILE: &str = "providers.json";

/// Values given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub root: Option<PathBuf>,
    pub providers_file: Option<PathBuf>,
}

pub struct Config<R: Runtime, P: Probe> {
    pub runtime: R,
    pub probe: P,
    pub paths: ProjectPaths,
    pub registry: ProviderRegistry,
}

impl<R: Runtime> Config<R, HttpProbe> {
    pub fn new(runtime: R, overrides: ConfigOverrides) -> Result<Self> {
        let root = match overrides.root {
            Some(root) => root,
            None => runtime.current_dir()?,
        };
        debug!("Project root: {:?}", root);

        let registry = load_registry(&runtime, overrides.providers_file)?;
        let probe = HttpProbe::new(build_client()?);

        Ok(Self {
            runtime,
            probe,
            paths: ProjectPaths::new(root),
            registry,
        })
    }
}

#[cfg(test)]
impl<R: Runtime, P: Probe> Config<R, P> {
    pub fn for_test(runtime: R, probe: P, root: impl Into<PathBuf>) -> Self {
        Self {
            runtime,
            probe,
            paths: ProjectPaths::new(root),
            registry: ProviderRegistry::builtin().unwrap(),
        }
    }
}

/// Pick the provider table: an explicit file, then the user's config
/// directory, then the built-in table.
fn load_registry<R: Runtime>(runtime: &R, explicit: Option<PathBuf>) -> Result<ProviderRegistry> {
    let user_file = runtime
        .config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME).join(PROVIDERS_FILE))
        .filter(|path| runtime.exists(path));

    match explicit.or(user_file) {
        Some(path) => {
            debug!("Loading providers from {:?}", path);
            ProviderRegistry::load(runtime, &path)
        }
        None => {
            debug!("Using built-in providers");
            ProviderRegistry::builtin()
        }
    }
}
