//! CDN providers and module URL resolution.
//!
//! A provider is a URL template with a `%n` placeholder for the module name
//! and an optional `@%t` group for the version or dist tag.

mod registry;
mod url;

pub use registry::{BUILTIN_PROVIDERS, ProviderRegistry, ProviderTable};
pub use url::{UrlRequest, render_template, resolve_url};

/// Placeholder replaced by the module name.
pub const NAME_PLACEHOLDER: &str = "%n";

/// Placeholder replaced by the tag.
pub const TAG_PLACEHOLDER: &str = "%t";

/// Tag group removed from the template when no tag is given.
pub const TAG_GROUP: &str = "@%t";
