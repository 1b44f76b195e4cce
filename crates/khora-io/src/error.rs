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

//! Error types for the asset storage layer.

use khora_core::asset::AssetUUID;
use std::{io, path::PathBuf};
use thiserror::Error;

/// An error raised while loading a package or, at the public boundary, while
/// opening one of its assets.
#[derive(Debug, Error)]
pub enum PackageError {
    /// The package path could not be read from the filesystem.
    #[error("failed to access package at '{}': {source}", path.display())]
    Io {
        /// The package location.
        path: PathBuf,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },
    /// The path exists but holds neither a loose package nor an archive.
    #[error("'{}' is not an asset package: {reason}", path.display())]
    NotAPackage {
        /// The offending path.
        path: PathBuf,
        /// Why the path was rejected.
        reason: String,
    },
    /// The archive was written by an incompatible version of the packer.
    #[error("unsupported archive version {version} in '{}'", path.display())]
    UnsupportedVersion {
        /// The archive location.
        path: PathBuf,
        /// The version found in the header.
        version: u16,
    },
    /// The package manifest could not be decoded.
    #[error("malformed manifest in '{}': {reason}", path.display())]
    Manifest {
        /// The package location.
        path: PathBuf,
        /// The decoder's message.
        reason: String,
    },
    /// An asset exists but its bytes could not be opened.
    #[error("failed to open asset {uuid}: {source}")]
    Asset {
        /// The asset that failed to open.
        uuid: AssetUUID,
        /// The underlying I/O error, reported as-is.
        #[source]
        source: io::Error,
    },
}

impl PackageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn manifest(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Manifest {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns the I/O error kind behind this error, if there is one.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::Io { source, .. } | Self::Asset { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}

/// Builds the `invalid_argument` error returned for unusable locators.
pub(crate) fn invalid_argument(message: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, message)
}
