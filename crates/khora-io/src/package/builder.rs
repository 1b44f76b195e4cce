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

//! Writing packages.
//!
//! A [`PackageBuilder`] collects [`PendingAsset`]s, in memory or by walking a source
//! tree, and writes them out as a loose directory or a single archive file.

use super::{
    archive::{ArchiveCompression, ArchiveHeader, ARCHIVE_VERSION, HEADER_SIZE},
    manifest::{ManifestEntry, PackageManifest},
};
use crate::{
    catalog::{ArchiveLocator, AssetRecord, Locator, LooseLocator},
    config::StorageConfig,
    error::{invalid_argument, PackageError},
};
use khora_core::asset::{AssetUUID, ByteSlice};
use rayon::prelude::*;
use std::{
    collections::{BTreeMap, BTreeSet},
    fs::{self, File},
    io::{self, BufWriter, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Uncompressed bytes per zstd frame unless configured otherwise.
pub const DEFAULT_FRAME_SIZE: usize = 256 * 1024;

/// Extension of the sidecar file holding an asset's metadata.
const META_EXTENSION: &str = "meta";

/// Directory of a loose package that holds the asset files.
const LOOSE_ASSET_DIR: &str = "assets";

/// An asset waiting to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAsset {
    /// The asset's identifier.
    pub uuid: AssetUUID,
    /// The asset's name, empty if unnamed.
    pub name: String,
    /// The asset's tags.
    pub tags: BTreeSet<String>,
    /// The asset bytes.
    pub data: Vec<u8>,
    /// The metadata bytes, if any.
    pub metadata: Option<Vec<u8>>,
}

impl PendingAsset {
    /// Creates an unnamed, untagged asset without metadata.
    pub fn new(uuid: AssetUUID, data: impl Into<Vec<u8>>) -> Self {
        Self {
            uuid,
            name: String::new(),
            tags: BTreeSet::new(),
            data: data.into(),
            metadata: None,
        }
    }

    /// Sets the asset's name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds tags to the asset.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Attaches metadata bytes.
    pub fn with_metadata(mut self, metadata: impl Into<Vec<u8>>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }

    fn record(&self, locator: impl Into<Locator>) -> AssetRecord {
        AssetRecord::new(locator)
            .with_name(self.name.clone())
            .with_tags(self.tags.iter().cloned())
            .with_checksum(blake3::hash(&self.data))
    }
}

/// Collects assets and writes them as a package.
///
/// Assets are written in UUID order, so the same input always produces the same
/// package bytes.
#[derive(Debug, Clone)]
pub struct PackageBuilder {
    assets: BTreeMap<AssetUUID, PendingAsset>,
    frame_size: usize,
    compression_level: i32,
    manifest_name: String,
}

impl Default for PackageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageBuilder {
    /// Creates an empty builder with default frame size and compression level.
    pub fn new() -> Self {
        Self {
            assets: BTreeMap::new(),
            frame_size: DEFAULT_FRAME_SIZE,
            compression_level: zstd::DEFAULT_COMPRESSION_LEVEL,
            manifest_name: StorageConfig::default().manifest_name,
        }
    }

    /// Sets how many uncompressed bytes go into each zstd frame. Clamped to at least 1.
    pub fn with_frame_size(mut self, frame_size: usize) -> Self {
        self.frame_size = frame_size.max(1);
        self
    }

    /// Sets the zstd compression level.
    pub fn with_compression_level(mut self, level: i32) -> Self {
        self.compression_level = level;
        self
    }

    /// Sets the manifest file name used by [`write_loose`](Self::write_loose).
    pub fn with_manifest_name(mut self, name: impl Into<String>) -> Self {
        self.manifest_name = name.into();
        self
    }

    /// Uncompressed bytes per zstd frame.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Adds an asset, returning the one it replaced if the UUID was already present.
    pub fn add(&mut self, asset: PendingAsset) -> Option<PendingAsset> {
        self.assets.insert(asset.uuid, asset)
    }

    /// Number of pending assets.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Returns `true` if no asset is pending.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Iterates over the pending assets in write order.
    pub fn assets(&self) -> impl Iterator<Item = &PendingAsset> {
        self.assets.values()
    }

    /// Adds every file below `root`.
    ///
    /// Each asset is named by its forward-slash path relative to `root`, gets a
    /// UUID derived from that name and is tagged with its lower-case extension.
    /// A sibling `<file>.meta` becomes the asset's metadata and is not packed as
    /// an asset of its own. Returns the number of assets added.
    pub fn add_directory(&mut self, root: impl AsRef<Path>) -> Result<usize, PackageError> {
        let root = root.as_ref();
        let mut added = 0;

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                PackageError::io(path, e.into())
            })?;
            let path = entry.path();
            if !entry.file_type().is_file() || has_extension(path, META_EXTENSION) {
                continue;
            }

            let name = relative_name(root, path);
            let data = fs::read(path).map_err(|e| PackageError::io(path, e))?;
            let mut asset = PendingAsset::new(AssetUUID::new_v5(&name), data).with_name(&name);
            if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
                asset = asset.with_tags([extension.to_ascii_lowercase()]);
            }

            let meta_path = sidecar_path(path);
            if meta_path.is_file() {
                let metadata = fs::read(&meta_path).map_err(|e| PackageError::io(&meta_path, e))?;
                asset = asset.with_metadata(metadata);
            }

            log::trace!("Adding '{name}' as {}", asset.uuid);
            self.add(asset);
            added += 1;
        }

        log::debug!("Collected {added} assets from '{}'", root.display());
        Ok(added)
    }

    /// Writes a loose package into `dir`, creating it if needed.
    pub fn write_loose(&self, dir: impl AsRef<Path>) -> Result<PackageManifest, PackageError> {
        let dir = dir.as_ref();
        let asset_dir = dir.join(LOOSE_ASSET_DIR);
        fs::create_dir_all(&asset_dir).map_err(|e| PackageError::io(&asset_dir, e))?;

        let mut manifest = PackageManifest::new();
        for asset in self.assets.values() {
            let asset_path = Path::new(LOOSE_ASSET_DIR).join(asset.uuid.to_string());
            write_file(dir, &asset_path, &asset.data)?;

            let meta_path = match &asset.metadata {
                Some(metadata) => {
                    let meta_path = Path::new(LOOSE_ASSET_DIR)
                        .join(format!("{}.{META_EXTENSION}", asset.uuid));
                    write_file(dir, &meta_path, metadata)?;
                    meta_path
                }
                None => PathBuf::new(),
            };

            let record = asset.record(LooseLocator {
                asset_path,
                meta_path,
            });
            manifest
                .entries
                .push(ManifestEntry::from_record(asset.uuid, &record));
        }

        let manifest_path = dir.join(&self.manifest_name);
        let text = manifest
            .to_ron()
            .map_err(|e| PackageError::manifest(&manifest_path, e))?;
        fs::write(&manifest_path, text).map_err(|e| PackageError::io(&manifest_path, e))?;

        log::info!(
            "Wrote loose package '{}' ({} assets)",
            dir.display(),
            manifest.entries.len()
        );
        Ok(manifest)
    }

    /// Writes an archive package to `path`.
    ///
    /// Empty assets cannot be addressed inside an archive; they are skipped with a
    /// warning. Empty metadata is written as absent.
    pub fn write_archive(
        &self,
        path: impl AsRef<Path>,
        compression: ArchiveCompression,
    ) -> Result<PackageManifest, PackageError> {
        let path = path.as_ref();
        self.write_archive_inner(path, compression)
            .map_err(|e| match e {
                ArchiveWriteError::Io(e) => PackageError::io(path, e),
                ArchiveWriteError::Index(e) => PackageError::manifest(path, e),
            })
    }

    fn write_archive_inner(
        &self,
        path: &Path,
        compression: ArchiveCompression,
    ) -> Result<PackageManifest, ArchiveWriteError> {
        let mut writer = SectionWriter {
            out: BufWriter::new(File::create(path)?),
            offset: HEADER_SIZE,
            compression,
            frame_size: self.frame_size,
            level: self.compression_level,
        };
        writer.out.write_all(&[0u8; HEADER_SIZE as usize])?;

        let mut manifest = PackageManifest::new();
        for asset in self.assets.values() {
            if asset.data.is_empty() {
                log::warn!(
                    "Skipping empty asset {} ('{}'): it cannot be stored in an archive",
                    asset.uuid,
                    asset.name
                );
                continue;
            }

            let section = writer.write_section(&asset.data)?;
            let metadata = match asset.metadata.as_deref() {
                Some(metadata) if !metadata.is_empty() => writer.write_section(metadata)?,
                _ => ByteSlice::ABSENT,
            };

            let record = asset.record(ArchiveLocator {
                asset: section,
                metadata,
            });
            manifest
                .entries
                .push(ManifestEntry::from_record(asset.uuid, &record));
        }

        let index = manifest.to_bincode().map_err(ArchiveWriteError::Index)?;
        let header = ArchiveHeader {
            version: ARCHIVE_VERSION,
            compression,
            index_offset: writer.offset,
            index_size: index.len() as u64,
        };
        writer.out.write_all(&index)?;

        let mut file = writer.out.into_inner().map_err(|e| e.into_error())?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&header.encode())?;
        file.sync_all()?;

        log::info!(
            "Wrote {} archive '{}' ({} assets, {} bytes)",
            match compression {
                ArchiveCompression::None => "flat",
                ArchiveCompression::Zstd => "zstd",
            },
            path.display(),
            manifest.entries.len(),
            header.index_offset + header.index_size
        );
        Ok(manifest)
    }
}

enum ArchiveWriteError {
    Io(io::Error),
    Index(bincode::error::EncodeError),
}

impl From<io::Error> for ArchiveWriteError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Appends sections to an archive being written, tracking the write offset.
struct SectionWriter {
    out: BufWriter<File>,
    offset: u64,
    compression: ArchiveCompression,
    frame_size: usize,
    level: i32,
}

impl SectionWriter {
    fn write_section(&mut self, data: &[u8]) -> io::Result<ByteSlice> {
        let offset = self.offset;
        let slice = match self.compression {
            ArchiveCompression::None => {
                self.out.write_all(data)?;
                ByteSlice::raw(offset, data.len() as u64)
            }
            ArchiveCompression::Zstd => {
                let count = frame_count(data.len().div_ceil(self.frame_size))?;
                let level = self.level;
                let frames = data
                    .par_chunks(self.frame_size)
                    .map(|chunk| zstd::bulk::compress(chunk, level))
                    .collect::<io::Result<Vec<_>>>()?;

                let mut size = 0u64;
                for frame in &frames {
                    self.out.write_all(frame)?;
                    size += frame.len() as u64;
                }
                ByteSlice::compressed(offset, size, data.len() as u64, count)
            }
        };
        self.offset += slice.size;
        Ok(slice)
    }
}

/// Checks that a section's frame count fits the manifest's 32-bit field.
fn frame_count(frames: usize) -> io::Result<u32> {
    u32::try_from(frames).map_err(|_| invalid_argument("section has more than u32::MAX frames"))
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|ext| ext == extension)
}

fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(META_EXTENSION);
    path.with_file_name(name)
}

fn relative_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn write_file(root: &Path, relative: &Path, bytes: &[u8]) -> Result<(), PackageError> {
    let path = root.join(relative);
    fs::write(&path, bytes).map_err(|e| PackageError::io(path, e))
}
