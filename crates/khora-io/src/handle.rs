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

use crate::{error::PackageError, io::AssetSource, package::Package};
use khora_core::asset::AssetUUID;
use std::{collections::BTreeSet, fmt, io};

/// A reference to one asset of a loaded package.
///
/// The handle keeps its package alive: the package is not freed while any handle
/// taken from it exists. Cloning is cheap.
///
/// Opening comes in two forms. `try_open` / `try_metadata` report the raw
/// `io::Error` (`InvalidInput` for unusable locators, OS errors as-is);
/// `open` / `metadata` wrap the same error in a [`PackageError`] naming the asset.
#[derive(Clone)]
pub struct AssetHandle {
    package: Package,
    uuid: AssetUUID,
}

impl AssetHandle {
    pub(crate) fn new(package: Package, uuid: AssetUUID) -> Self {
        Self { package, uuid }
    }

    /// The asset's identifier.
    pub fn uuid(&self) -> AssetUUID {
        self.uuid
    }

    /// The package that owns the asset.
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Returns `false` once the asset has been erased from its package.
    pub fn is_valid(&self) -> bool {
        self.package.with_catalog(|table| table.contains(&self.uuid))
    }

    /// The asset's name, if it has one.
    pub fn name(&self) -> Option<String> {
        self.package.with_catalog(|table| {
            table
                .get(&self.uuid)
                .filter(|record| record.is_named())
                .map(|record| record.name.clone())
        })
    }

    /// The asset's tags.
    pub fn tags(&self) -> BTreeSet<String> {
        self.package.with_catalog(|table| {
            table
                .get(&self.uuid)
                .map(|record| record.tags.clone())
                .unwrap_or_default()
        })
    }

    /// Returns `true` if the asset has a metadata section.
    pub fn has_metadata(&self) -> bool {
        self.package
            .locator(&self.uuid)
            .map(|locator| self.package.backend().has_metadata(&locator))
            .unwrap_or(false)
    }

    /// The expected hash of the decoded asset bytes, if the packer recorded one.
    pub fn checksum(&self) -> Option<blake3::Hash> {
        self.package
            .with_catalog(|table| table.get(&self.uuid).and_then(|record| record.checksum))
    }

    /// Opens an independent stream over the asset bytes.
    pub fn try_open(&self) -> io::Result<AssetSource> {
        let locator = self.package.locator(&self.uuid)?;
        self.package.backend().open_asset(&locator)
    }

    /// Opens an independent stream over the asset bytes.
    pub fn open(&self) -> Result<AssetSource, PackageError> {
        self.try_open().map_err(|source| self.error(source))
    }

    /// Opens an independent stream over the asset's metadata.
    pub fn try_metadata(&self) -> io::Result<AssetSource> {
        let locator = self.package.locator(&self.uuid)?;
        self.package.backend().open_metadata(&locator)
    }

    /// Opens an independent stream over the asset's metadata.
    pub fn metadata(&self) -> Result<AssetSource, PackageError> {
        self.try_metadata().map_err(|source| self.error(source))
    }

    /// Reads the whole asset into memory.
    pub fn read_all(&self) -> Result<Vec<u8>, PackageError> {
        self.try_open()
            .and_then(|mut source| source.read_to_vec())
            .map_err(|source| self.error(source))
    }

    /// Checks the asset bytes against the recorded checksum.
    ///
    /// Returns `Ok(false)` only on a mismatch; assets without a checksum pass.
    pub fn verify(&self) -> Result<bool, PackageError> {
        let Some(expected) = self.checksum() else {
            return Ok(true);
        };
        let bytes = self.read_all()?;
        let matches = blake3::hash(&bytes) == expected;
        if !matches {
            log::warn!(
                "Asset {} in '{}' does not match its checksum",
                self.uuid,
                self.package.location().display()
            );
        }
        Ok(matches)
    }

    fn error(&self, source: io::Error) -> PackageError {
        PackageError::Asset {
            uuid: self.uuid,
            source,
        }
    }
}

impl PartialEq for AssetHandle {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid && self.package.ptr_eq(&other.package)
    }
}

impl Eq for AssetHandle {}

impl fmt::Debug for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetHandle")
            .field("uuid", &self.uuid)
            .field("package", &self.package.location())
            .finish()
    }
}
