use anyhow::{Result, bail};

use crate::application::{LinkAction, LinkFailure, LinkOptions, LinkedModule};
use crate::http::Probe;
use crate::runtime::Runtime;

use super::config::Config;

fn print_linked(linked: &LinkedModule) {
    println!("Linked {} -> {}", linked.name, linked.url);
}

fn print_repair_hint(failure: &LinkFailure) {
    if failure.manifest_committed() {
        eprintln!(
            "  {} is recorded in the manifest without a stub; run `cdnlink link {}` to repair it",
            failure.name, failure.name
        );
    }
}

fn print_failure(failure: &LinkFailure) {
    eprintln!("{}", failure);
    print_repair_hint(failure);
}

/// Link a single module
#[tracing::instrument(skip(config))]
pub async fn link<R: Runtime, P: Probe>(
    config: &Config<R, P>,
    name: &str,
    options: &LinkOptions,
) -> Result<()> {
    let action = LinkAction::new(
        &config.runtime,
        &config.registry,
        &config.probe,
        &config.paths,
    );

    match action.link_one(name, options).await {
        Ok(linked) => {
            print_linked(&linked);
            Ok(())
        }
        Err(failure) => {
            print_repair_hint(&failure);
            let context = format!("Failed to link {} while {}", failure.name, failure.stage);
            Err(failure.error.context(context))
        }
    }
}

/// Relink every module in the manifest
#[tracing::instrument(skip(config))]
pub async fn link_all<R: Runtime, P: Probe>(config: &Config<R, P>, check: bool) -> Result<()> {
    let action = LinkAction::new(
        &config.runtime,
        &config.registry,
        &config.probe,
        &config.paths,
    );

    let reports = action
        .link_all_with(check, |report| match &report.result {
            Ok(linked) => print_linked(linked),
            Err(failure) => print_failure(failure),
        })
        .await?;

    if reports.is_empty() {
        println!("No modules to link.");
        return Ok(());
    }

    let failed = reports.iter().filter(|r| r.result.is_err()).count();
    if failed > 0 {
        bail!("{} of {} module(s) failed to link", failed, reports.len());
    }
    Ok(())
}
