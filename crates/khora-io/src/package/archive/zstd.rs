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
    decode::{decode_frames, DecodePool},
    io::AssetSource,
    package::{PackageBackend, PackageKind},
};
use khora_core::asset::ByteSlice;
use std::{
    fs::File,
    io::{self, Seek, SeekFrom},
    path::{Path, PathBuf},
    sync::Arc,
};

/// An archive whose sections are stored as independent zstd frames.
///
/// Opening a section decodes it into memory on the shared [`DecodePool`], blocking
/// the caller until the last frame is done, and yields a window over the decoded
/// buffer.
#[derive(Debug, Clone)]
pub struct ZstdArchive {
    path: PathBuf,
    pool: Arc<DecodePool>,
}

impl ZstdArchive {
    /// Creates a backend reading the archive at `path` and decoding on `pool`.
    pub fn new(path: impl Into<PathBuf>, pool: Arc<DecodePool>) -> Self {
        Self {
            path: path.into(),
            pool,
        }
    }

    /// The archive file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decodes the section at `slice` and returns a source over its `src_size` bytes.
    ///
    /// A frame count that differs from `slice.frames` is logged, not returned as
    /// an error.
    pub fn open_at(&self, slice: &ByteSlice) -> io::Result<AssetSource> {
        check_slice(slice)?;
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(slice.offset))?;

        let section = decode_frames(&mut file, slice, &self.pool)?;
        log::trace!(
            "Decoded {} frames ({} -> {} bytes) from '{}'",
            section.frames,
            slice.size,
            slice.src_size,
            self.path.display()
        );
        Ok(AssetSource::from_buffer(section.buffer))
    }
}

impl PackageBackend for ZstdArchive {
    fn kind(&self) -> PackageKind {
        PackageKind::ZstdArchive
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
