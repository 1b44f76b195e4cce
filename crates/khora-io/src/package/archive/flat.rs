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

use super::{archive_locator, check_slice};
use crate::{
    catalog::Locator,
    io::AssetSource,
    package::{PackageBackend, PackageKind},
};
use khora_core::asset::ByteSlice;
use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
};

/// An archive whose sections are stored uncompressed.
///
/// Opening a section yields a window directly over a freshly opened file handle;
/// nothing is copied into memory.
#[derive(Debug, Clone)]
pub struct FlatArchive {
    path: PathBuf,
}

impl FlatArchive {
    /// Creates a backend reading the archive at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The archive file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens `slice.size` bytes at `slice.offset` of the archive.
    pub fn open_at(&self, slice: &ByteSlice) -> io::Result<AssetSource> {
        check_slice(slice)?;
        let file = File::open(&self.path)?;
        AssetSource::from_file(file, slice.offset, slice.size)
    }
}

impl PackageBackend for FlatArchive {
    fn kind(&self) -> PackageKind {
        PackageKind::FlatArchive
    }

    fn open_asset(&self, locator: &Locator) -> io::Result<AssetSource> {
        self.open_at(&archive_locator(locator)?.asset)
    }

    fn open_metadata(&self, locator: &Locator) -> io::Result<AssetSource> {
        self.open_at(&archive_locator(locator)?.metadata)
    }

    fn has_metadata(&self, locator: &Locator) -> bool {
        archive_locator(locator).is_ok_and(|archive| !archive.metadata.is_absent())
    }
}
