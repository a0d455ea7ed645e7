use anyhow::Result;

use crate::application::UnlinkAction;
use crate::http::Probe;
use crate::runtime::Runtime;

use super::config::Config;

/// Unlink a module
#[tracing::instrument(skip(config))]
pub fn unlink<R: Runtime, P: Probe>(config: &Config<R, P>, name: &str) -> Result<()> {
    let action = UnlinkAction::new(&config.runtime, &config.paths);
    let result = action.unlink_one(name)?;

    if result.removed.is_none() {
        eprintln!("warning: {} was not in the manifest", name);
    }
    if result.is_partial() {
        eprintln!("warning: no stub at {}", result.stub_path.display());
    }
    println!("Unlinked {}", name);
    Ok(())
}
