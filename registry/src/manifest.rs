//! Build-time module manifest.
//!
//! `spec.md` §9 flags "dynamic list-of-modules by filesystem scan" as a
//! source pattern to replace: the set of modules a deployment runs is an
//! explicit, compiled-in table plus explicit registration calls at
//! startup, not something discovered by walking a directory at runtime.
//! `titan-core`'s system builder owns the concrete manifest for a
//! deployment; this type is the shape it fills in.

use crate::types::ModuleType;
use serde::{Deserialize, Serialize};

/// One row of the startup manifest: everything [`crate::Registry::register`]
/// needs to create a [`crate::types::ModuleRecord`] without consulting the
/// filesystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub version: String,
    pub creator: String,
    pub module_type: ModuleType,
    pub declared_keys: Vec<String>,
    pub declared_channels: Vec<String>,
}

impl ManifestEntry {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        creator: impl Into<String>,
        module_type: ModuleType,
        declared_keys: impl IntoIterator<Item = impl Into<String>>,
        declared_channels: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            creator: creator.into(),
            module_type,
            declared_keys: declared_keys.into_iter().map(Into::into).collect(),
            declared_channels: declared_channels.into_iter().map(Into::into).collect(),
        }
    }
}

/// An ordered, explicit set of modules a deployment runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleManifest {
    pub entries: Vec<ManifestEntry>,
}

impl ModuleManifest {
    pub fn new(entries: Vec<ManifestEntry>) -> Self {
        Self { entries }
    }

    pub fn push(&mut self, entry: ManifestEntry) -> &mut Self {
        self.entries.push(entry);
        self
    }
}
