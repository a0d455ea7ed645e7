//! The `modules.json` manifest: what should be linked, and from where.

mod descriptor;
mod store;

pub use descriptor::{LinkDescriptor, Manifest};
pub use store::{MANIFEST_FILE, ManifestStore};
