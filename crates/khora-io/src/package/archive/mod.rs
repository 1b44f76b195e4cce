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

//! Single-file archive packages.
//!
//! Layout, all integers little-endian:
//!
//! ```text
//! +--------+---------+-------------+--------------+-------------+----------+
//! | "KPAK" | version | compression | index_offset | index_size  | reserved |
//! | 4 B    | u16     | u16         | u64          | u64         | u64      |
//! +--------+---------+-------------+--------------+-------------+----------+
//! | asset and metadata sections ...                                        |
//! +------------------------------------------------------------------------+
//! | bincode-encoded PackageManifest (index_size bytes at index_offset)     |
//! +------------------------------------------------------------------------+
//! ```
//!
//! Sections start after the 32-byte header, so an offset of zero never
//! addresses data and marks an absent section.

mod flat;
mod zstd;

pub use self::zstd::ZstdArchive;
pub use flat::FlatArchive;

use super::{manifest::PackageManifest, PackageBackend};
use crate::{
    catalog::{ArchiveLocator, Locator},
    context::StorageContext,
    error::{invalid_argument, PackageError},
};
use khora_core::asset::ByteSlice;
use std::{
    fs::File,
    io::{self, Read, Seek, SeekFrom},
    path::Path,
};

/// Magic bytes opening every archive.
pub const ARCHIVE_MAGIC: [u8; 4] = *b"KPAK";
/// The archive layout version written by this crate.
pub const ARCHIVE_VERSION: u16 = 1;
/// Size of the fixed archive header, and offset of the first section.
pub const HEADER_SIZE: u64 = 32;

/// How the sections of an archive are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveCompression {
    /// Raw bytes.
    None,
    /// Independent zstd frames.
    Zstd,
}

impl ArchiveCompression {
    /// The header code of this compression.
    pub const fn code(self) -> u16 {
        match self {
            Self::None => 0,
            Self::Zstd => 1,
        }
    }

    /// Parses a header code.
    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Zstd),
            _ => None,
        }
    }
}

/// The fixed-size header at the start of an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveHeader {
    /// Layout version.
    pub version: u16,
    /// Section storage.
    pub compression: ArchiveCompression,
    /// Absolute offset of the encoded manifest.
    pub index_offset: u64,
    /// Length of the encoded manifest.
    pub index_size: u64,
}

impl ArchiveHeader {
    /// Serializes the header.
    pub fn encode(&self) -> [u8; HEADER_SIZE as usize] {
        let mut bytes = [0u8; HEADER_SIZE as usize];
        bytes[0..4].copy_from_slice(&ARCHIVE_MAGIC);
        bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.compression.code().to_le_bytes());
        bytes[8..16].copy_from_slice(&self.index_offset.to_le_bytes());
        bytes[16..24].copy_from_slice(&self.index_size.to_le_bytes());
        bytes
    }

    /// Parses the header of the archive at `path`.
    pub fn decode(path: &Path, bytes: &[u8; HEADER_SIZE as usize]) -> Result<Self, PackageError> {
        let not_a_package = |reason: &str| PackageError::NotAPackage {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        if bytes[0..4] != ARCHIVE_MAGIC {
            return Err(not_a_package("bad archive magic"));
        }
        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != ARCHIVE_VERSION {
            return Err(PackageError::UnsupportedVersion {
                path: path.to_path_buf(),
                version,
            });
        }
        let compression = ArchiveCompression::from_code(u16::from_le_bytes([bytes[6], bytes[7]]))
            .ok_or_else(|| not_a_package("unknown compression code"))?;
        let index_offset = u64::from_le_bytes(le_u64(&bytes[8..16]));
        let index_size = u64::from_le_bytes(le_u64(&bytes[16..24]));
        if index_offset < HEADER_SIZE {
            return Err(not_a_package("index overlaps the header"));
        }

        Ok(Self {
            version,
            compression,
            index_offset,
            index_size,
        })
    }
}

fn le_u64(bytes: &[u8]) -> [u8; 8] {
    let mut out = [0u8; 8];
    out.copy_from_slice(bytes);
    out
}

/// Opens the archive at `path` and reads its manifest.
pub(crate) fn open(
    path: &Path,
    ctx: &StorageContext,
) -> Result<(Box<dyn PackageBackend>, PackageManifest), PackageError> {
    let mut file = File::open(path).map_err(|e| PackageError::io(path, e))?;

    let mut header_bytes = [0u8; HEADER_SIZE as usize];
    file.read_exact(&mut header_bytes).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => PackageError::NotAPackage {
            path: path.to_path_buf(),
            reason: "file is shorter than an archive header".to_string(),
        },
        _ => PackageError::io(path, e),
    })?;
    let header = ArchiveHeader::decode(path, &header_bytes)?;

    let mut index = Vec::new();
    file.seek(SeekFrom::Start(header.index_offset))
        .and_then(|_| (&mut file).take(header.index_size).read_to_end(&mut index))
        .map_err(|e| PackageError::io(path, e))?;
    if (index.len() as u64) < header.index_size {
        return Err(PackageError::manifest(path, "archive index is truncated"));
    }
    let manifest =
        PackageManifest::from_bincode(&index).map_err(|e| PackageError::manifest(path, e))?;

    let backend: Box<dyn PackageBackend> = match header.compression {
        ArchiveCompression::None => Box::new(FlatArchive::new(path)),
        ArchiveCompression::Zstd => {
            Box::new(ZstdArchive::new(path, ctx.decode_pool().clone()))
        }
    };
    Ok((backend, manifest))
}

/// Rejects slices that cannot address data. The only check made before I/O;
/// the archive itself is trusted.
pub(crate) fn check_slice(slice: &ByteSlice) -> io::Result<()> {
    if !slice.is_valid() {
        return Err(invalid_argument(
            "archive slice has a zero offset, size or source size",
        ));
    }
    if slice.offset.checked_add(slice.size).is_none() {
        return Err(invalid_argument("archive slice ends past the largest file offset"));
    }
    Ok(())
}

pub(crate) fn archive_locator(locator: &Locator) -> io::Result<&ArchiveLocator> {
    match locator {
        Locator::Archive(archive) => Ok(archive),
        Locator::Loose(_) => Err(invalid_argument("loose locator in an archive package")),
    }
}
