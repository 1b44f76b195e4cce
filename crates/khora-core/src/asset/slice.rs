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

use serde::{Deserialize, Serialize};

/// The location of one section (asset bytes or metadata bytes) inside an archive file.
///
/// An offset of zero never addresses real data, since every archive starts with a
/// header. A slice with `offset == 0` therefore means "this section does not exist".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ByteSlice {
    /// Absolute offset of the section in the archive file.
    pub offset: u64,
    /// Number of bytes the section occupies on disk.
    pub size: u64,
    /// Number of bytes once decoded. Equal to `size` for uncompressed sections.
    pub src_size: u64,
    /// Number of independent compressed frames. Zero for uncompressed sections.
    pub frames: u32,
}

impl ByteSlice {
    /// The slice of a section that does not exist.
    pub const ABSENT: Self = Self {
        offset: 0,
        size: 0,
        src_size: 0,
        frames: 0,
    };

    /// Describes an uncompressed section of `size` bytes at `offset`.
    pub const fn raw(offset: u64, size: u64) -> Self {
        Self {
            offset,
            size,
            src_size: size,
            frames: 0,
        }
    }

    /// Describes a compressed section made of `frames` independent frames.
    pub const fn compressed(offset: u64, size: u64, src_size: u64, frames: u32) -> Self {
        Self {
            offset,
            size,
            src_size,
            frames,
        }
    }

    /// Returns `true` if this slice does not refer to any section.
    pub const fn is_absent(&self) -> bool {
        self.offset == 0
    }

    /// Returns `true` if the slice can be opened: every positional field is non-zero.
    pub const fn is_valid(&self) -> bool {
        self.offset != 0 && self.size != 0 && self.src_size != 0
    }

    /// Returns `true` if the section is stored as compressed frames.
    pub const fn is_compressed(&self) -> bool {
        self.frames != 0
    }
}
