//! Provider registry: the immutable provider id -> URL template table.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::NAME_PLACEHOLDER;
use crate::error::LinkError;
use crate::runtime::Runtime;

/// Provider table compiled into the binary.
pub const BUILTIN_PROVIDERS: &str = include_str!("../../providers.json");

/// On-disk shape of a providers file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProviderTable {
    pub default: String,
    pub providers: BTreeMap<String, String>,
}

/// Registry of CDN providers.
///
/// Built once at startup and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRegistry {
    templates: BTreeMap<String, String>,
    default_provider: String,
}

impl ProviderRegistry {
    /// Build a registry from a table, validating it.
    ///
    /// The default provider must be present and every template must contain `%n`.
    pub fn from_table(table: ProviderTable) -> Result<Self> {
        if !table.providers.contains_key(&table.default) {
            anyhow::bail!(
                "Default provider '{}' is not defined in the provider table.",
                table.default
            );
        }

        if let Some((id, _)) = table
            .providers
            .iter()
            .find(|(_, template)| !template.contains(NAME_PLACEHOLDER))
        {
            anyhow::bail!(
                "Template for provider '{}' has no {} placeholder.",
                id,
                NAME_PLACEHOLDER
            );
        }

        Ok(Self {
            templates: table.providers,
            default_provider: table.default,
        })
    }

    /// Parse a registry from the JSON providers format.
    pub fn from_json(content: &str) -> Result<Self> {
        let table: ProviderTable =
            serde_json::from_str(content).context("Failed to parse provider table")?;
        Self::from_table(table)
    }

    /// The provider table shipped with the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_PROVIDERS)
    }

    /// Load a registry from a providers file.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime
            .read_to_string(path)
            .with_context(|| format!("Failed to read providers file {:?}", path))?;
        Self::from_json(&content).with_context(|| format!("Invalid providers file {:?}", path))
    }

    /// Look up the URL template of a provider.
    pub fn template(&self, provider: &str) -> Result<&str> {
        self.templates
            .get(provider)
            .map(String::as_str)
            .ok_or_else(|| LinkError::UnknownProvider(provider.to_string()).into())
    }

    /// The provider used when the caller names none.
    pub fn default_provider(&self) -> &str {
        &self.default_provider
    }

    pub fn contains(&self, provider: &str) -> bool {
        self.templates.contains_key(provider)
    }

    /// Iterate over `(id, template)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.templates
            .iter()
            .map(|(id, template)| (id.as_str(), template.as_str()))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
