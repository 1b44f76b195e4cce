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

use super::AssetBuffer;
use crate::error::invalid_argument;
use std::{
    fs::File,
    io::{self, Read, Seek, SeekFrom},
};

/// The byte payload an [`AssetSource`](super::AssetSource) reads from.
///
/// The set of payloads is closed: a source either streams from its own OS file
/// handle or from an in-memory buffer (decoded archive sections). The variant is
/// chosen at construction and never changes.
#[derive(Debug)]
pub enum IoBackend {
    /// An open file, read in place.
    File(File),
    /// An in-memory buffer.
    Buffer(AssetBuffer),
}

impl IoBackend {
    /// Reads up to `dst.len()` bytes at the current position.
    pub fn read(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::File(file) => file.read(dst),
            Self::Buffer(buffer) => Ok(buffer.read(dst)),
        }
    }

    /// Moves the position relative to `pos`'s basis and returns the new absolute position.
    pub fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Self::File(file) => file.seek(pos),
            Self::Buffer(buffer) => seek_buffer(buffer, pos),
        }
    }

    /// Moves to an absolute position.
    pub fn setpos(&mut self, pos: u64) -> io::Result<u64> {
        self.seek(SeekFrom::Start(pos))
    }

    /// The total size of the payload in bytes.
    pub fn size(&self) -> io::Result<u64> {
        match self {
            Self::File(file) => Ok(file.metadata()?.len()),
            Self::Buffer(buffer) => Ok(buffer.len() as u64),
        }
    }

    /// The current absolute position.
    pub fn tell(&mut self) -> io::Result<u64> {
        match self {
            Self::File(file) => file.stream_position(),
            Self::Buffer(buffer) => Ok(buffer.position() as u64),
        }
    }
}

impl From<File> for IoBackend {
    fn from(file: File) -> Self {
        Self::File(file)
    }
}

impl From<AssetBuffer> for IoBackend {
    fn from(buffer: AssetBuffer) -> Self {
        Self::Buffer(buffer)
    }
}

fn seek_buffer(buffer: &mut AssetBuffer, pos: SeekFrom) -> io::Result<u64> {
    let target = match pos {
        SeekFrom::Start(offset) => Some(offset),
        SeekFrom::Current(delta) => (buffer.position() as u64).checked_add_signed(delta),
        SeekFrom::End(delta) => (buffer.len() as u64).checked_add_signed(delta),
    }
    .ok_or_else(|| invalid_argument("seek to a negative or overflowing position"))?;

    let position = usize::try_from(target)
        .map_err(|_| invalid_argument("seek position exceeds the address space"))?;
    buffer.set_position(position);
    Ok(target)
}
