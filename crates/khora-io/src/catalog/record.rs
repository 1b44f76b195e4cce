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

use khora_core::asset::ByteSlice;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, path::PathBuf};

/// Where a loose package keeps an asset: paths relative to the package directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LooseLocator {
    /// The asset file.
    pub asset_path: PathBuf,
    /// The metadata file. Empty when the asset has no metadata.
    #[serde(default)]
    pub meta_path: PathBuf,
}

/// Where an archive package keeps an asset: byte ranges of the archive file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveLocator {
    /// The asset section.
    pub asset: ByteSlice,
    /// The metadata section, [`ByteSlice::ABSENT`] when the asset has no metadata.
    #[serde(default)]
    pub metadata: ByteSlice,
}

/// The backend-specific part of an [`AssetRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locator {
    /// A pair of files inside a loose package directory.
    Loose(LooseLocator),
    /// A pair of byte slices inside an archive.
    Archive(ArchiveLocator),
}

impl From<LooseLocator> for Locator {
    fn from(locator: LooseLocator) -> Self {
        Self::Loose(locator)
    }
}

impl From<ArchiveLocator> for Locator {
    fn from(locator: ArchiveLocator) -> Self {
        Self::Archive(locator)
    }
}

/// One catalog entry: everything a package knows about an asset without reading it.
///
/// Records live inside their package's catalog and are never shared on their own;
/// an [`AssetHandle`](crate::AssetHandle) pairs the owning package with the asset's
/// UUID to reach them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRecord {
    /// Human-readable name. Empty for unnamed assets.
    pub name: String,
    /// Semantic tags for querying and organization.
    pub tags: BTreeSet<String>,
    /// Where the asset and metadata bytes live.
    pub locator: Locator,
    /// BLAKE3 hash of the decoded asset bytes, if the packer recorded one.
    pub checksum: Option<blake3::Hash>,
}

impl AssetRecord {
    /// Creates an unnamed, untagged record.
    pub fn new(locator: impl Into<Locator>) -> Self {
        Self {
            name: String::new(),
            tags: BTreeSet::new(),
            locator: locator.into(),
            checksum: None,
        }
    }

    /// Sets the record's name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds tags to the record.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Sets the expected hash of the decoded asset bytes.
    pub fn with_checksum(mut self, checksum: blake3::Hash) -> Self {
        self.checksum = Some(checksum);
        self
    }

    /// Returns `true` if the record has a non-empty name.
    pub fn is_named(&self) -> bool {
        !self.name.is_empty()
    }

    /// Returns `true` if the record carries `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}
