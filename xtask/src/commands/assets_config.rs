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

use khora_io::package::builder::DEFAULT_FRAME_SIZE;
use serde::Deserialize;
use std::path::PathBuf;

/// The storage form of the package written by `pack`.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PackageFormat {
    /// A directory with one file per section and a RON manifest.
    Loose,
    /// A single archive with uncompressed sections.
    Flat,
    /// A single archive with zstd-compressed sections.
    Zstd,
}

/// Represents the structure of the `Assets.toml` manifest file.
///
/// Every field is optional; missing ones take their default value.
#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct AssetManifest {
    /// A list of directories to scan for source assets.
    pub source_directories: Vec<PathBuf>,
    /// Where the package is written: a directory for `loose`, a file otherwise.
    pub output: PathBuf,
    /// The package form.
    pub format: PackageFormat,
    /// Uncompressed bytes per zstd frame.
    pub frame_size: usize,
    /// The zstd compression level.
    pub compression_level: i32,
}

impl Default for AssetManifest {
    /// Provides a default configuration if `Assets.toml` is not found.
    ///
    /// The default configuration packs `resources/assets` into a zstd archive
    /// at `.dist/assets.kpak`.
    fn default() -> Self {
        Self {
            source_directories: vec![PathBuf::from("resources/assets")],
            output: PathBuf::from(".dist/assets.kpak"),
            format: PackageFormat::Zstd,
            frame_size: DEFAULT_FRAME_SIZE,
            compression_level: 3,
        }
    }
}
