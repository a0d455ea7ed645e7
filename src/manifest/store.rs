//! Manifest persistence.
//!
//! Every mutation reads the whole manifest, changes it in memory and writes
//! it back in full. Writes go to a sibling temp file that is then renamed
//! over the manifest, so a failed write never leaves a truncated file.

use anyhow::{Context, Result};
use log::{debug, info};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::path::{Path, PathBuf};

use super::{LinkDescriptor, Manifest};
use crate::error::LinkError;
use crate::runtime::{Runtime, is_not_found};

/// File name of the manifest inside the project root.
pub const MANIFEST_FILE: &str = "modules.json";

pub struct ManifestStore<'a, R: Runtime> {
    runtime: &'a R,
    path: PathBuf,
}

impl<'a, R: Runtime> ManifestStore<'a, R> {
    pub fn new(runtime: &'a R, path: PathBuf) -> Self {
        Self { runtime, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| MANIFEST_FILE.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Read and parse the manifest. `Ok(None)` when the file does not exist.
    fn read(&self) -> Result<Option<Manifest>> {
        let content = match self.runtime.read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if is_not_found(&e) => {
                debug!("Manifest {:?} does not exist", self.path);
                return Ok(None);
            }
            Err(e) => return Err(LinkError::persistence(&self.path, e).into()),
        };

        // An empty file is treated like `{}`.
        if content.trim().is_empty() {
            return Ok(Some(Manifest::new()));
        }

        let manifest: Manifest = serde_json::from_str(&content)
            .with_context(|| format!("Malformed manifest {:?}", self.path))
            .map_err(|e| LinkError::persistence(&self.path, e))?;
        Ok(Some(manifest))
    }

    /// Load the manifest, or an empty one when the file does not exist.
    pub fn read_or_empty(&self) -> Result<Manifest> {
        Ok(self.read()?.unwrap_or_default())
    }

    fn save(&self, manifest: &Manifest) -> Result<()> {
        let content = to_pretty_json(manifest).map_err(|e| LinkError::persistence(&self.path, e))?;
        let temp_path = self.temp_path();

        self.runtime
            .write(&temp_path, content.as_bytes())
            .map_err(|e| LinkError::persistence(&self.path, e))?;

        if let Err(e) = self.runtime.rename(&temp_path, &self.path) {
            if let Err(cleanup) = self.runtime.remove_file(&temp_path) {
                debug!("Failed to remove {:?}: {:#}", temp_path, cleanup);
            }
            return Err(LinkError::persistence(&self.path, e).into());
        }

        debug!("Saved {} module(s) to {:?}", manifest.len(), self.path);
        Ok(())
    }

    /// Set the descriptor of `name`, creating the manifest if it is missing.
    #[tracing::instrument(skip(self))]
    pub fn upsert(&self, name: &str, descriptor: &LinkDescriptor) -> Result<()> {
        let mut manifest = match self.read()? {
            Some(manifest) => manifest,
            None => {
                info!("Creating {:?}", self.path);
                Manifest::new()
            }
        };

        manifest.insert(name, descriptor.clone());
        self.save(&manifest)
    }

    /// Drop `name` from the manifest and write it back, even if `name` was absent.
    ///
    /// Returns the removed descriptor. A missing manifest is an error and
    /// nothing is written.
    #[tracing::instrument(skip(self))]
    pub fn remove(&self, name: &str) -> Result<Option<LinkDescriptor>> {
        let mut manifest = self.read()?.ok_or_else(|| self.missing_manifest())?;
        let removed = manifest.remove(name);
        if removed.is_none() {
            debug!("{} is not in the manifest", name);
        }
        self.save(&manifest)?;
        Ok(removed)
    }

    /// Load the whole manifest. A missing manifest is an error here.
    #[tracing::instrument(skip(self))]
    pub fn get_all(&self) -> Result<Manifest> {
        self.read()?.ok_or_else(|| self.missing_manifest())
    }

    fn missing_manifest(&self) -> anyhow::Error {
        LinkError::persistence(
            &self.path,
            anyhow::anyhow!("manifest not found, link a module first"),
        )
        .into()
    }
}

/// Pretty JSON with four-space indentation and a trailing newline.
pub(crate) fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .context("Failed to serialize manifest")?;
    buf.push(b'\n');
    String::from_utf8(buf).context("Manifest is not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use mockall::predicate::eq;
    use std::io;
    use tempfile::tempdir;

    fn lodash() -> LinkDescriptor {
        LinkDescriptor::provider("jsdelivr", Some("4.17.21".into()))
    }

    fn not_found() -> anyhow::Error {
        io::Error::new(io::ErrorKind::NotFound, "not found").into()
    }

    #[test]
    fn test_upsert_bootstraps_missing_manifest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        let store = ManifestStore::new(&RealRuntime, path.clone());

        store.upsert("lodash", &lodash()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"lodash": {"provider": "jsdelivr", "tag": "4.17.21"}})
        );
        assert!(!dir.path().join("modules.json.tmp").exists());
    }

    #[test]
    fn test_upsert_then_get_all_round_trip() {
        let dir = tempdir().unwrap();
        let store = ManifestStore::new(&RealRuntime, dir.path().join(MANIFEST_FILE));

        store.upsert("lodash", &lodash()).unwrap();
        store
            .upsert("alpine", &LinkDescriptor::url("https://x/alpine.js"))
            .unwrap();

        let manifest = store.get_all().unwrap();
        assert_eq!(manifest.names(), vec!["lodash", "alpine"]);
        assert_eq!(manifest.get("lodash"), Some(&lodash()));
    }

    #[test]
    fn test_remove_keeps_other_entries() {
        let dir = tempdir().unwrap();
        let store = ManifestStore::new(&RealRuntime, dir.path().join(MANIFEST_FILE));

        store.upsert("a", &LinkDescriptor::provider("skypack", None)).unwrap();
        store.upsert("b", &lodash()).unwrap();
        store.upsert("c", &LinkDescriptor::url("https://x/c.js")).unwrap();

        let removed = store.remove("b").unwrap();
        assert_eq!(removed, Some(lodash()));

        let manifest = store.get_all().unwrap();
        assert_eq!(manifest.names(), vec!["a", "c"]);
        assert_eq!(
            manifest.get("c"),
            Some(&LinkDescriptor::url("https://x/c.js"))
        );
    }

    #[test]
    fn test_remove_absent_key_still_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        std::fs::write(&path, "{}").unwrap();
        let store = ManifestStore::new(&RealRuntime, path.clone());

        assert_eq!(store.remove("ghost").unwrap(), None);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}\n");
    }

    #[test]
    fn test_remove_missing_manifest_fails_without_creating_it() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        let store = ManifestStore::new(&RealRuntime, path.clone());

        let err = store.remove("typo").unwrap_err();
        assert!(matches!(
            LinkError::find(&err),
            Some(LinkError::Persistence { .. })
        ));
        assert!(!path.exists());
        assert!(!dir.path().join("modules.json.tmp").exists());
    }

    #[test]
    fn test_get_all_missing_manifest_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        let store = ManifestStore::new(&RealRuntime, path.clone());

        let err = store.get_all().unwrap_err();
        assert!(matches!(
            LinkError::find(&err),
            Some(LinkError::Persistence { .. })
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_pretty_printed_with_four_spaces() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        let store = ManifestStore::new(&RealRuntime, path.clone());

        store.upsert("lodash", &lodash()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "{\n    \"lodash\": {\n        \"provider\": \"jsdelivr\",\n        \"tag\": \"4.17.21\"\n    }\n}\n"
        );
    }

    #[test]
    fn test_unreadable_manifest_is_not_treated_as_empty() {
        let mut runtime = MockRuntime::new();
        let path = PathBuf::from("/project/modules.json");

        runtime
            .expect_read_to_string()
            .with(eq(path.clone()))
            .returning(|_| {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied").into())
            });
        // No write or rename may happen.
        runtime.expect_write().never();
        runtime.expect_rename().never();

        let store = ManifestStore::new(&runtime, path);
        let err = store.upsert("lodash", &lodash()).unwrap_err();
        assert!(matches!(
            LinkError::find(&err),
            Some(LinkError::Persistence { .. })
        ));

        let err = store.remove("lodash").unwrap_err();
        assert!(matches!(
            LinkError::find(&err),
            Some(LinkError::Persistence { .. })
        ));
    }

    #[test]
    fn test_malformed_manifest_is_not_overwritten() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .returning(|_| Ok("{ not json".to_string()));
        runtime.expect_write().never();

        let store = ManifestStore::new(&runtime, PathBuf::from("/project/modules.json"));
        let err = store.upsert("lodash", &lodash()).unwrap_err();
        assert!(err.to_string().contains("modules.json"));
    }

    #[test]
    fn test_write_goes_through_temp_file() {
        let mut runtime = MockRuntime::new();
        let path = PathBuf::from("/project/modules.json");
        let temp = PathBuf::from("/project/modules.json.tmp");
        let mut seq = mockall::Sequence::new();

        runtime
            .expect_read_to_string()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(not_found()));
        runtime
            .expect_write()
            .withf(|p, contents| {
                p.to_string_lossy().ends_with("modules.json.tmp") && contents.starts_with(b"{")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        runtime
            .expect_rename()
            .with(eq(temp), eq(path.clone()))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let store = ManifestStore::new(&runtime, path);
        store.upsert("lodash", &lodash()).unwrap();
    }

    #[test]
    fn test_failed_write_is_persistence_error() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .returning(|_| Ok("{}".to_string()));
        runtime
            .expect_write()
            .returning(|_, _| Err(io::Error::other("disk full").into()));
        runtime.expect_rename().never();

        let store = ManifestStore::new(&runtime, PathBuf::from("/project/modules.json"));
        let err = store.upsert("lodash", &lodash()).unwrap_err();
        assert!(matches!(
            LinkError::find(&err),
            Some(LinkError::Persistence { .. })
        ));
    }

    #[test]
    fn test_failed_rename_cleans_up_temp_file() {
        let mut runtime = MockRuntime::new();
        let temp = PathBuf::from("/project/modules.json.tmp");

        runtime
            .expect_read_to_string()
            .returning(|_| Ok("{}".to_string()));
        runtime.expect_write().times(1).returning(|_, _| Ok(()));
        runtime
            .expect_rename()
            .times(1)
            .returning(|_, _| Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied").into()));
        runtime
            .expect_remove_file()
            .with(eq(temp))
            .times(1)
            .returning(|_| Ok(()));

        let store = ManifestStore::new(&runtime, PathBuf::from("/project/modules.json"));
        let err = store.upsert("lodash", &lodash()).unwrap_err();
        assert!(matches!(
            LinkError::find(&err),
            Some(LinkError::Persistence { .. })
        ));
    }

    #[test]
    fn test_empty_file_reads_as_empty_manifest() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .returning(|_| Ok("\n".to_string()));

        let store = ManifestStore::new(&runtime, PathBuf::from("/project/modules.json"));
        assert!(store.get_all().unwrap().is_empty());
    }
}
