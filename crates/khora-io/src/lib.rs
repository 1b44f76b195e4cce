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

//! # Khora IO
//!
//! Asset package storage: catalogs of assets addressed by UUID, stored either as
//! loose files in a directory or as sections of a single archive file, raw or
//! compressed as independent zstd frames.
//!
//! A [`Package`] is loaded through a [`StorageContext`], which carries the
//! [`StorageConfig`] and the shared [`DecodePool`]. Lookups return
//! [`AssetHandle`]s, and opening a handle yields an [`AssetSource`]: a bounded,
//! seekable window over the asset bytes.

#![warn(missing_docs)]

pub mod catalog;
pub mod config;
pub mod context;
pub mod decode;
mod error;
pub mod handle;
pub mod io;
pub mod package;

#[cfg(test)]
pub(crate) mod test_log;

pub use catalog::{ArchiveLocator, AssetRecord, AssetTable, Locator, LooseLocator};
pub use config::StorageConfig;
pub use context::StorageContext;
pub use decode::DecodePool;
pub use error::PackageError;
pub use handle::AssetHandle;
pub use io::{AssetBuffer, AssetSource, IoBackend};
pub use package::{
    builder::{PackageBuilder, PendingAsset},
    ArchiveCompression, Package, PackageBackend, PackageKind,
};

pub use khora_core::asset::{AssetUUID, ByteSlice};
