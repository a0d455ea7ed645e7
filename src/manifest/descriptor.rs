use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::provider::UrlRequest;

/// Where a linked module comes from.
///
/// Serialized as either `{"provider": ..., "tag": ...}` or `{"url": ...}`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(try_from = "RawDescriptor")]
pub enum LinkDescriptor {
    Provider { provider: String, tag: Option<String> },
    Url { url: String },
}

impl LinkDescriptor {
    pub fn provider(provider: impl Into<String>, tag: Option<String>) -> Self {
        LinkDescriptor::Provider {
            provider: provider.into(),
            tag,
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        LinkDescriptor::Url { url: url.into() }
    }

    /// The resolver inputs this descriptor stands for.
    pub fn as_request(&self) -> UrlRequest<'_> {
        match self {
            LinkDescriptor::Provider { provider, tag } => UrlRequest {
                provider: Some(provider.as_str()),
                tag: tag.as_deref(),
                explicit_url: None,
            },
            LinkDescriptor::Url { url } => UrlRequest {
                explicit_url: Some(url.as_str()),
                ..Default::default()
            },
        }
    }
}

impl fmt::Display for LinkDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkDescriptor::Provider {
                provider,
                tag: Some(tag),
            } => write!(f, "{}@{}", provider, tag),
            LinkDescriptor::Provider { provider, tag: None } => write!(f, "{}", provider),
            LinkDescriptor::Url { url } => write!(f, "{}", url),
        }
    }
}

impl Serialize for LinkDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            LinkDescriptor::Provider { provider, tag } => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("provider", provider)?;
                if let Some(tag) = tag {
                    map.serialize_entry("tag", tag)?;
                }
                map.end()
            }
            LinkDescriptor::Url { url } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("url", url)?;
                map.end()
            }
        }
    }
}

/// Manifest entry as written by hand; checked for exactly one shape.
#[derive(Deserialize)]
struct RawDescriptor {
    provider: Option<String>,
    tag: Option<String>,
    url: Option<String>,
}

impl TryFrom<RawDescriptor> for LinkDescriptor {
    type Error = String;

    fn try_from(raw: RawDescriptor) -> Result<Self, Self::Error> {
        match (raw.provider, raw.tag, raw.url) {
            (Some(provider), tag, None) => Ok(LinkDescriptor::Provider { provider, tag }),
            (None, None, Some(url)) => Ok(LinkDescriptor::Url { url }),
            (Some(_), _, Some(_)) => {
                Err("entry has both \"provider\" and \"url\"; keep only one".to_string())
            }
            (None, Some(_), Some(_)) => {
                Err("\"tag\" cannot be combined with \"url\"".to_string())
            }
            (None, _, None) => Err("entry needs either \"provider\" or \"url\"".to_string()),
        }
    }
}

/// Ordered mapping from module name to descriptor.
///
/// Keeps insertion order; replacing an existing name keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<(String, LinkDescriptor)>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&LinkDescriptor> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, descriptor)| descriptor)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Set the descriptor of `name`, returning the previous one.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        descriptor: LinkDescriptor,
    ) -> Option<LinkDescriptor> {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, descriptor)),
            None => {
                self.entries.push((name, descriptor));
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<LinkDescriptor> {
        let index = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LinkDescriptor)> {
        self.entries.iter().map(|(name, d)| (name.as_str(), d))
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Manifest {
    type Item = (String, LinkDescriptor);
    type IntoIter = std::vec::IntoIter<(String, LinkDescriptor)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(String, LinkDescriptor)> for Manifest {
    fn from_iter<I: IntoIterator<Item = (String, LinkDescriptor)>>(iter: I) -> Self {
        let mut manifest = Manifest::new();
        for (name, descriptor) in iter {
            manifest.insert(name, descriptor);
        }
        manifest
    }
}

impl Serialize for Manifest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, descriptor) in &self.entries {
            map.serialize_entry(name, descriptor)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Manifest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ManifestVisitor;

        impl<'de> Visitor<'de> for ManifestVisitor {
            type Value = Manifest;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of module names to link descriptors")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Manifest, A::Error> {
                let mut manifest = Manifest::new();
                // Duplicate keys: the later value wins, the first position is kept.
                while let Some((name, descriptor)) =
                    access.next_entry::<String, LinkDescriptor>()?
                {
                    manifest.insert(name, descriptor);
                }
                Ok(manifest)
            }
        }

        deserializer.deserialize_map(ManifestVisitor)
    }
}
