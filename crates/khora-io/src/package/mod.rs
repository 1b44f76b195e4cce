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

//! Packages: reference-counted containers of assets backed by a loose directory
//! or a single archive file.
//!
//! A [`Package`] owns its catalog and a [`PackageBackend`] that knows how to turn a
//! record's [`Locator`] into an [`AssetSource`]. Three backends exist:
//! - [`LoosePackage`]: one file per asset section inside a directory.
//! - [`FlatArchive`]: uncompressed byte ranges of one archive file.
//! - [`ZstdArchive`]: zstd-compressed byte ranges, decoded on the shared [`DecodePool`](crate::DecodePool).

pub mod archive;
pub mod builder;
mod loose;
pub mod manifest;

pub use archive::{ArchiveCompression, FlatArchive, ZstdArchive};
pub use loose::LoosePackage;

use crate::{
    catalog::{AssetRecord, AssetTable, Locator},
    context::StorageContext,
    error::PackageError,
    handle::AssetHandle,
    io::AssetSource,
};
use khora_core::asset::AssetUUID;
use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

/// The storage form of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageKind {
    /// A directory of loose files.
    Loose,
    /// An archive of uncompressed sections.
    FlatArchive,
    /// An archive of zstd-compressed sections.
    ZstdArchive,
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Loose => "loose",
            Self::FlatArchive => "flat archive",
            Self::ZstdArchive => "zstd archive",
        };
        f.write_str(name)
    }
}

/// The storage-specific half of a package: resolves locators into byte streams.
///
/// Every call opens fresh OS resources, so implementations are safe to call from
/// any number of threads at once.
pub trait PackageBackend: Send + Sync + fmt::Debug {
    /// The storage form this backend reads.
    fn kind(&self) -> PackageKind;

    /// Opens the asset bytes described by `locator`.
    fn open_asset(&self, locator: &Locator) -> io::Result<AssetSource>;

    /// Opens the metadata bytes described by `locator`.
    fn open_metadata(&self, locator: &Locator) -> io::Result<AssetSource>;

    /// Returns `true` if `locator` describes a metadata section.
    fn has_metadata(&self, locator: &Locator) -> bool;
}

struct PackageInner {
    location: PathBuf,
    backend: Box<dyn PackageBackend>,
    catalog: RwLock<AssetTable>,
}

impl Drop for PackageInner {
    fn drop(&mut self) {
        let assets = self
            .catalog
            .get_mut()
            .map(|table| table.len())
            .unwrap_or_default();
        log::debug!(
            "Unloaded {} package '{}' ({assets} assets)",
            self.backend.kind(),
            self.location.display()
        );
    }
}

/// A shared handle to a loaded package.
///
/// Cloning a `Package` (or any [`AssetHandle`] taken from it) keeps the package
/// alive; the package and its catalog are freed when the last clone is dropped.
///
/// Lookups are safe from any thread. Catalog mutation through [`insert`](Self::insert)
/// and [`erase`](Self::erase) is meant for a single editing thread; it takes a
/// write lock that briefly blocks lookups and `open` calls.
#[derive(Clone)]
pub struct Package {
    inner: Arc<PackageInner>,
}

impl Package {
    /// Creates a package from a backend and an already-populated catalog.
    pub fn new(
        location: impl Into<PathBuf>,
        backend: impl PackageBackend + 'static,
        catalog: AssetTable,
    ) -> Self {
        Self::from_boxed(location.into(), Box::new(backend), catalog)
    }

    fn from_boxed(location: PathBuf, backend: Box<dyn PackageBackend>, catalog: AssetTable) -> Self {
        Self {
            inner: Arc::new(PackageInner {
                location,
                backend,
                catalog: RwLock::new(catalog),
            }),
        }
    }

    /// Loads the package at `path`: a loose directory or an archive file.
    pub fn load(ctx: &StorageContext, path: impl AsRef<Path>) -> Result<Self, PackageError> {
        let path = path.as_ref();
        let metadata = fs::metadata(path).map_err(|e| PackageError::io(path, e))?;

        let (backend, manifest): (Box<dyn PackageBackend>, _) = if metadata.is_dir() {
            let (package, manifest) = LoosePackage::load(path, ctx.config())?;
            (Box::new(package), manifest)
        } else {
            archive::open(path, ctx)?
        };

        let catalog = manifest.into_table(path)?;
        log::debug!(
            "Loaded {} package '{}' ({} assets)",
            backend.kind(),
            path.display(),
            catalog.len()
        );
        Ok(Self::from_boxed(path.to_path_buf(), backend, catalog))
    }

    /// Loads every package found directly under `directory`.
    ///
    /// Sub-directories holding a manifest and files with the configured archive
    /// extension are loaded, in path order; other entries are skipped. The first
    /// package that fails to load aborts the whole call.
    pub fn load_all(
        ctx: &StorageContext,
        directory: impl AsRef<Path>,
    ) -> Result<Vec<Self>, PackageError> {
        let directory = directory.as_ref();
        let mut paths = fs::read_dir(directory)
            .and_then(|entries| {
                entries
                    .map(|entry| entry.map(|e| e.path()))
                    .collect::<io::Result<Vec<_>>>()
            })
            .map_err(|e| PackageError::io(directory, e))?;
        paths.sort();

        let config = ctx.config();
        let mut packages = Vec::new();
        for path in paths {
            let is_loose = path.join(&config.manifest_name).is_file();
            let is_archive = path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext == config.archive_extension.as_str());
            if is_loose || is_archive {
                packages.push(Self::load(ctx, &path)?);
            } else {
                log::debug!("Skipping '{}': not a package", path.display());
            }
        }
        Ok(packages)
    }

    /// Where the package was loaded from.
    pub fn location(&self) -> &Path {
        &self.inner.location
    }

    /// The package's storage form.
    pub fn kind(&self) -> PackageKind {
        self.inner.backend.kind()
    }

    /// The number of assets in the catalog.
    pub fn len(&self) -> usize {
        self.catalog().len()
    }

    /// Returns `true` if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.catalog().is_empty()
    }

    /// The number of live `Package` and [`AssetHandle`] references to this package.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Returns `true` if both values refer to the same loaded package.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Every asset UUID in the catalog, sorted.
    pub fn uuids(&self) -> Vec<AssetUUID> {
        let mut uuids: Vec<_> = self.catalog().iter().map(|(uuid, _)| uuid).collect();
        uuids.sort();
        uuids
    }

    /// A copy of the record stored under `uuid`.
    pub fn record(&self, uuid: &AssetUUID) -> Option<AssetRecord> {
        self.catalog().get(uuid).cloned()
    }

    /// Runs `f` with read access to the catalog.
    pub fn with_catalog<R>(&self, f: impl FnOnce(&AssetTable) -> R) -> R {
        let table = self.catalog();
        f(&*table)
    }

    /// Looks an asset up by UUID.
    pub fn find(&self, uuid: &AssetUUID) -> Option<AssetHandle> {
        self.catalog()
            .contains(uuid)
            .then(|| AssetHandle::new(self.clone(), *uuid))
    }

    /// Looks an asset up by name. Among assets sharing a name, returns the one
    /// that claimed it most recently.
    pub fn find_by_name(&self, name: &str) -> Option<AssetHandle> {
        let uuid = self.catalog().find_by_name(name).map(|(uuid, _)| uuid)?;
        Some(AssetHandle::new(self.clone(), uuid))
    }

    /// Returns every asset bearing `name`.
    pub fn find_all(&self, name: &str) -> Vec<AssetHandle> {
        let uuids: Vec<_> = self.catalog().find_all(name).map(|(uuid, _)| uuid).collect();
        self.handles(uuids)
    }

    /// Returns the first asset whose record satisfies `predicate`.
    pub fn match_one<F>(&self, predicate: F) -> Option<AssetHandle>
    where
        F: FnMut(&AssetUUID, &AssetRecord) -> bool,
    {
        let uuid = self.catalog().match_one(predicate).map(|(uuid, _)| uuid)?;
        Some(AssetHandle::new(self.clone(), uuid))
    }

    /// Returns every asset whose record satisfies `predicate`.
    pub fn match_all<F>(&self, predicate: F) -> Vec<AssetHandle>
    where
        F: FnMut(&AssetUUID, &AssetRecord) -> bool,
    {
        let uuids: Vec<_> = self
            .catalog()
            .match_all(predicate)
            .map(|(uuid, _)| uuid)
            .collect();
        self.handles(uuids)
    }

    /// Adds or replaces a record at runtime. Returns the replaced record.
    pub fn insert(&self, uuid: AssetUUID, record: AssetRecord) -> Option<AssetRecord> {
        self.catalog_mut().insert(uuid, record)
    }

    /// Removes a record at runtime. Handles to it stay valid but fail to open.
    pub fn erase(&self, uuid: &AssetUUID) -> Option<AssetRecord> {
        self.catalog_mut().erase(uuid)
    }

    pub(crate) fn backend(&self) -> &dyn PackageBackend {
        self.inner.backend.as_ref()
    }

    /// Copies the locator of `uuid` out of the catalog so the lock is not held
    /// during I/O.
    pub(crate) fn locator(&self, uuid: &AssetUUID) -> io::Result<Locator> {
        self.catalog()
            .get(uuid)
            .map(|record| record.locator.clone())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("asset {uuid} is no longer in the package"),
                )
            })
    }

    fn handles(&self, uuids: Vec<AssetUUID>) -> Vec<AssetHandle> {
        uuids
            .into_iter()
            .map(|uuid| AssetHandle::new(self.clone(), uuid))
            .collect()
    }

    fn catalog(&self) -> RwLockReadGuard<'_, AssetTable> {
        self.inner
            .catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn catalog_mut(&self) -> RwLockWriteGuard<'_, AssetTable> {
        self.inner
            .catalog
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Package")
            .field("location", &self.inner.location)
            .field("kind", &self.kind())
            .field("assets", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::LooseLocator;

    fn loose_package(dir: &Path) -> Package {
        std::fs::write(dir.join("a.bin"), b"alpha").unwrap();
        std::fs::write(dir.join("b.bin"), b"beta").unwrap();

        let mut table = AssetTable::new();
        for (uuid, file) in [(1u128, "a.bin"), (2, "b.bin")] {
            table.insert(
                AssetUUID::from_u128(uuid),
                AssetRecord::new(LooseLocator {
                    asset_path: PathBuf::from(file),
                    meta_path: PathBuf::new(),
                }),
            );
        }
        Package::new(dir, LoosePackage::new(dir), table)
    }

    #[test]
    fn test_package_outlives_dropped_owner_until_last_handle() {
        let dir = tempfile::tempdir().unwrap();
        let package = loose_package(dir.path());
        let weak = Arc::downgrade(&package.inner);

        let first = package.find(&AssetUUID::from_u128(1)).unwrap();
        let second = package.find(&AssetUUID::from_u128(2)).unwrap();
        assert_eq!(package.ref_count(), 3);

        drop(package);
        assert!(weak.upgrade().is_some());
        drop(second);
        assert!(weak.upgrade().is_some());
        assert_eq!(first.read_all().unwrap(), b"alpha");
        drop(first);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_handles_dropped_in_either_order() {
        let dir = tempfile::tempdir().unwrap();
        let package = loose_package(dir.path());
        let weak = Arc::downgrade(&package.inner);
        let first = package.find(&AssetUUID::from_u128(1)).unwrap();
        let second = first.clone();
        drop(package);

        drop(first);
        assert_eq!(weak.strong_count(), 1);
        drop(second);
        assert_eq!(weak.strong_count(), 0);
    }

    #[test]
    fn test_erased_asset_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let package = loose_package(dir.path());
        let handle = package.find(&AssetUUID::from_u128(2)).unwrap();

        assert!(package.erase(&AssetUUID::from_u128(2)).is_some());
        assert!(!handle.is_valid());
        let err = handle.try_open().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert_eq!(package.len(), 1);
    }

    #[test]
    fn test_runtime_insert_is_visible_to_lookups() {
        let dir = tempfile::tempdir().unwrap();
        let package = loose_package(dir.path());
        let uuid = AssetUUID::from_u128(3);
        package.insert(
            uuid,
            AssetRecord::new(LooseLocator {
                asset_path: PathBuf::from("a.bin"),
                meta_path: PathBuf::new(),
            })
            .with_name("alias"),
        );

        let handle = package.find_by_name("alias").unwrap();
        assert_eq!(handle.uuid(), uuid);

        package.insert(
            AssetUUID::from_u128(0),
            AssetRecord::new(LooseLocator {
                asset_path: PathBuf::from("b.bin"),
                meta_path: PathBuf::new(),
            }),
        );
        let expected: Vec<_> = (0..4).map(AssetUUID::from_u128).collect();
        assert_eq!(package.uuids(), expected);
    }
}
