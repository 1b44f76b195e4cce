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

use super::{manifest::PackageManifest, PackageBackend, PackageKind};
use crate::{
    catalog::{Locator, LooseLocator},
    config::StorageConfig,
    error::{invalid_argument, PackageError},
    io::AssetSource,
};
use std::{
    fs::{self, File},
    io,
    path::{Component, Path, PathBuf},
};

/// A package stored as a directory: one file per asset section plus a RON manifest.
#[derive(Debug, Clone)]
pub struct LoosePackage {
    root: PathBuf,
}

impl LoosePackage {
    /// Creates a backend reading files below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The package directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Opens a package-relative file as a source spanning the whole file.
    ///
    /// Empty paths, absolute paths and paths leaving the package directory are
    /// rejected with `InvalidInput` before touching the filesystem.
    pub fn open_at(&self, relative: &Path) -> io::Result<AssetSource> {
        if relative.as_os_str().is_empty() {
            return Err(invalid_argument("empty asset path"));
        }
        if !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
        {
            return Err(invalid_argument("asset path leaves the package directory"));
        }

        let file = File::open(self.root.join(relative))?;
        let size = file.metadata()?.len();
        AssetSource::from_file(file, 0, size)
    }

    /// Reads the manifest of the package directory at `root`.
    pub(crate) fn load(
        root: &Path,
        config: &StorageConfig,
    ) -> Result<(Self, PackageManifest), PackageError> {
        let manifest_path = root.join(&config.manifest_name);
        let text = fs::read_to_string(&manifest_path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => PackageError::NotAPackage {
                path: root.to_path_buf(),
                reason: format!("no '{}' in directory", config.manifest_name),
            },
            _ => PackageError::io(&manifest_path, e),
        })?;
        let manifest =
            PackageManifest::from_ron(&text).map_err(|e| PackageError::manifest(&manifest_path, e))?;
        Ok((Self::new(root), manifest))
    }

    fn loose(locator: &Locator) -> io::Result<&LooseLocator> {
        match locator {
            Locator::Loose(loose) => Ok(loose),
            Locator::Archive(_) => Err(invalid_argument("archive locator in a loose package")),
        }
    }
}

impl PackageBackend for LoosePackage {
    fn kind(&self) -> PackageKind {
        PackageKind::Loose
    }

    fn open_asset(&self, locator: &Locator) -> io::Result<AssetSource> {
        self.open_at(&Self::loose(locator)?.asset_path)
    }

    fn open_metadata(&self, locator: &Locator) -> io::Result<AssetSource> {
        self.open_at(&Self::loose(locator)?.meta_path)
    }

    fn has_metadata(&self, locator: &Locator) -> bool {
        Self::loose(locator).is_ok_and(|loose| !loose.meta_path.as_os_str().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator(asset: &str, meta: &str) -> Locator {
        Locator::Loose(LooseLocator {
            asset_path: PathBuf::from(asset),
            meta_path: PathBuf::from(meta),
        })
    }

    #[test]
    fn test_open_at_spans_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("textures")).unwrap();
        fs::write(dir.path().join("textures/stone.png"), b"png bytes").unwrap();

        let package = LoosePackage::new(dir.path());
        let mut source = package.open_at(Path::new("textures/stone.png")).unwrap();
        assert_eq!(source.len(), 9);
        assert_eq!(source.read_to_vec().unwrap(), b"png bytes");
    }

    #[test]
    fn test_empty_path_is_invalid_argument() {
        let package = LoosePackage::new("does-not-matter");
        let err = package.open_at(Path::new("")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_escaping_path_is_invalid_argument() {
        let dir = tempfile::tempdir().unwrap();
        let package = LoosePackage::new(dir.path().join("pkg"));
        let err = package.open_at(Path::new("../secret")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_missing_file_reports_os_error() {
        let dir = tempfile::tempdir().unwrap();
        let package = LoosePackage::new(dir.path());
        let err = package.open_at(Path::new("missing.bin")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_metadata_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.bin"), b"a").unwrap();
        fs::write(dir.path().join("a.meta"), b"meta").unwrap();
        let package = LoosePackage::new(dir.path());

        let with_meta = locator("a.bin", "a.meta");
        assert!(package.has_metadata(&with_meta));
        let mut meta = package.open_metadata(&with_meta).unwrap();
        assert_eq!(meta.read_to_vec().unwrap(), b"meta");

        let without_meta = locator("a.bin", "");
        assert!(!package.has_metadata(&without_meta));
        let err = package.open_metadata(&without_meta).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_directory_without_manifest_is_not_a_package() {
        let dir = tempfile::tempdir().unwrap();
        let err = LoosePackage::load(dir.path(), &StorageConfig::default()).unwrap_err();
        assert!(matches!(err, PackageError::NotAPackage { .. }));
    }
}
