//! Module URL resolution.

use anyhow::Result;

use super::{NAME_PLACEHOLDER, ProviderRegistry, TAG_GROUP, TAG_PLACEHOLDER};

/// Inputs for resolving a module URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UrlRequest<'a> {
    /// Provider id; the registry default is used when `None`.
    pub provider: Option<&'a str>,
    pub tag: Option<&'a str>,
    /// Taken verbatim; provider and tag are ignored when set.
    pub explicit_url: Option<&'a str>,
}

/// Resolve the remote URL of a module. Performs no I/O.
pub fn resolve_url(
    registry: &ProviderRegistry,
    name: &str,
    request: &UrlRequest<'_>,
) -> Result<String> {
    if let Some(url) = request.explicit_url {
        return Ok(url.to_string());
    }

    let provider = request
        .provider
        .unwrap_or_else(|| registry.default_provider());
    let template = registry.template(provider)?;
    Ok(render_template(template, name, request.tag))
}

/// Substitute a name and optional tag into a provider template.
///
/// Without a tag the `@%t` group is dropped, along with any bare `%t` left over.
pub fn render_template(template: &str, name: &str, tag: Option<&str>) -> String {
    let url = template.replacen(NAME_PLACEHOLDER, name, 1);
    match tag {
        Some(tag) => url.replacen(TAG_PLACEHOLDER, tag, 1),
        None => url.replacen(TAG_GROUP, "", 1).replacen(TAG_PLACEHOLDER, "", 1),
    }
}
