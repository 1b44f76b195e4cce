// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The serialized catalog of a package.
//!
//! Loose packages store it as RON next to their files so it can be edited by hand;
//! archives store it bincode-encoded after their data sections.

use crate::{
    catalog::{AssetRecord, AssetTable, Locator},
    error::PackageError,
};
use khora_core::asset::AssetUUID;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The manifest layout version written by this crate.
pub const MANIFEST_VERSION: u32 = 1;

/// One asset as listed in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// The asset's identifier.
    pub uuid: AssetUUID,
    /// The asset's name, empty if unnamed.
    #[serde(default)]
    pub name: String,
    /// The asset's tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Where the asset's bytes live in the package.
    pub locator: Locator,
    /// Hex-encoded BLAKE3 hash of the decoded asset bytes.
    #[serde(default)]
    pub checksum: Option<String>,
}

impl ManifestEntry {
    /// Describes an existing catalog record.
    pub fn from_record(uuid: AssetUUID, record: &AssetRecord) -> Self {
        Self {
            uuid,
            name: record.name.clone(),
            tags: record.tags.iter().cloned().collect(),
            locator: record.locator.clone(),
            checksum: record.checksum.map(|hash| hash.to_hex().to_string()),
        }
    }

    /// Converts the entry into a catalog record.
    pub fn into_record(self) -> Result<(AssetUUID, AssetRecord), blake3::HexError> {
        let mut record = AssetRecord::new(self.locator)
            .with_name(self.name)
            .with_tags(self.tags);
        if let Some(hex) = self.checksum {
            record = record.with_checksum(blake3::Hash::from_hex(hex)?);
        }
        Ok((self.uuid, record))
    }
}

/// The full list of assets in a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
    /// Layout version, see [`MANIFEST_VERSION`].
    pub version: u32,
    /// Every asset, in insertion order. Later entries win over earlier ones with the same UUID.
    pub entries: Vec<ManifestEntry>,
}

impl PackageManifest {
    /// Creates an empty manifest at the current version.
    pub fn new() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: Vec::new(),
        }
    }

    /// Describes every record of a catalog.
    pub fn from_table(table: &AssetTable) -> Self {
        let mut entries: Vec<_> = table
            .iter()
            .map(|(uuid, record)| ManifestEntry::from_record(uuid, record))
            .collect();
        entries.sort_by_key(|entry| entry.uuid);
        Self {
            version: MANIFEST_VERSION,
            entries,
        }
    }

    /// Parses a RON manifest.
    pub fn from_ron(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    /// Writes the manifest as pretty-printed RON.
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    /// Decodes a bincode manifest.
    pub fn from_bincode(bytes: &[u8]) -> Result<Self, bincode::error::DecodeError> {
        let config = bincode::config::standard();
        let (manifest, _) = bincode::serde::decode_from_slice(bytes, config)?;
        Ok(manifest)
    }

    /// Encodes the manifest with bincode.
    pub fn to_bincode(&self) -> Result<Vec<u8>, bincode::error::EncodeError> {
        let config = bincode::config::standard();
        bincode::serde::encode_to_vec(self, config)
    }

    /// Builds the catalog of the package at `path` from this manifest.
    pub(crate) fn into_table(self, path: &Path) -> Result<AssetTable, PackageError> {
        if self.version != MANIFEST_VERSION {
            return Err(PackageError::manifest(
                path,
                format!("unknown manifest version {}", self.version),
            ));
        }

        let mut table = AssetTable::new();
        for entry in self.entries {
            let (uuid, record) = entry
                .into_record()
                .map_err(|e| PackageError::manifest(path, format!("invalid checksum: {e}")))?;
            if table.insert(uuid, record).is_some() {
                log::debug!(
                    "Manifest of '{}' lists {uuid} more than once, keeping the last entry",
                    path.display()
                );
            }
        }
        Ok(table)
    }
}

impl Default for PackageManifest {
    fn default() -> Self {
        Self::new()
    }
}
