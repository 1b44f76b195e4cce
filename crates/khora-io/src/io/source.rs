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

use super::{AssetBuffer, IoBackend};
use crate::error::invalid_argument;
use std::{
    fs::File,
    io::{self, Read, Seek, SeekFrom},
};

/// A read-only, seekable stream over one asset section.
///
/// A source is a window `[base_offset, base_offset + len)` over its own
/// [`IoBackend`]. Every `open` call produces a new backend, so two sources never
/// share a file handle or a cursor and can be read concurrently.
///
/// Positions handed to and returned from [`seek`](Self::seek) and
/// [`setpos`](Self::setpos) are relative to the window. Reads are clamped to the
/// window and never touch backend bytes past its end.
///
/// The fallible `read`/`seek`/`setpos` methods are the only implementation; the
/// [`Read`] and [`Seek`] impls forward to them so a source plugs into any
/// `std::io` consumer.
#[derive(Debug, Default)]
pub struct AssetSource {
    backend: Option<IoBackend>,
    base_offset: u64,
    window_size: u64,
    cursor: u64,
}

impl AssetSource {
    /// Creates a source over `size` bytes of `backend`, starting at `offset`.
    ///
    /// The backend is positioned at `offset` before the source is returned.
    pub fn new(mut backend: IoBackend, offset: u64, size: u64) -> io::Result<Self> {
        backend.setpos(offset)?;
        Ok(Self {
            backend: Some(backend),
            base_offset: offset,
            window_size: size,
            cursor: 0,
        })
    }

    /// Creates a source over a byte range of an open file.
    pub fn from_file(file: File, offset: u64, size: u64) -> io::Result<Self> {
        Self::new(IoBackend::File(file), offset, size)
    }

    /// Creates a source spanning a whole in-memory buffer.
    pub fn from_buffer(mut buffer: AssetBuffer) -> Self {
        buffer.set_position(0);
        Self {
            window_size: buffer.len() as u64,
            backend: Some(IoBackend::Buffer(buffer)),
            base_offset: 0,
            cursor: 0,
        }
    }

    /// Creates a source with no backend. Every operation on it fails.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns `true` if the window holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.window_size == 0
    }

    /// Returns `true` if the source has no backend.
    pub fn is_detached(&self) -> bool {
        self.backend.is_none()
    }

    /// The size of the window in bytes.
    pub fn len(&self) -> u64 {
        self.window_size
    }

    /// The cursor, relative to the window.
    pub fn position(&self) -> u64 {
        self.cursor
    }

    /// The number of bytes left before the end of the window.
    pub fn remaining(&self) -> u64 {
        self.window_size - self.cursor
    }

    /// Reads up to `dst.len()` bytes, never crossing the end of the window.
    ///
    /// Returns the number of bytes read, zero at the end of the window.
    pub fn read(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        self.read_window(dst)
    }

    /// Moves the cursor and returns its new window-relative position.
    ///
    /// Seeking before the start or past the end of the window is an
    /// `InvalidInput` error and leaves the cursor unchanged.
    pub fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.seek_window(pos)
    }

    /// Moves the cursor to a window-relative position.
    pub fn setpos(&mut self, pos: u64) -> io::Result<u64> {
        self.seek_window(SeekFrom::Start(pos))
    }

    /// Reads everything from the cursor to the end of the window.
    pub fn read_to_vec(&mut self) -> io::Result<Vec<u8>> {
        let remaining = usize::try_from(self.remaining())
            .map_err(|_| invalid_argument("asset section does not fit in memory"))?;
        let mut data = vec![0; remaining];
        let mut filled = 0;
        while filled < data.len() {
            match self.read_window(&mut data[filled..])? {
                0 => break,
                read => filled += read,
            }
        }
        data.truncate(filled);
        Ok(data)
    }

    fn backend(&mut self) -> io::Result<&mut IoBackend> {
        self.backend
            .as_mut()
            .ok_or_else(|| invalid_argument("asset source has no backend"))
    }

    fn read_window(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        let remaining = self.remaining();
        let backend = self.backend()?;
        let count = (dst.len() as u64).min(remaining) as usize;
        if count == 0 {
            return Ok(0);
        }
        let read = backend.read(&mut dst[..count])?;
        self.cursor += read as u64;
        Ok(read)
    }

    fn seek_window(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.cursor.checked_add_signed(delta),
            SeekFrom::End(delta) => self.window_size.checked_add_signed(delta),
        }
        .filter(|target| *target <= self.window_size)
        .ok_or_else(|| invalid_argument("seek outside of the asset window"))?;

        let absolute = self.base_offset + target;
        self.backend()?.setpos(absolute)?;
        self.cursor = target;
        Ok(target)
    }
}

impl Read for AssetSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_window(buf)
    }
}

impl Seek for AssetSource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.seek_window(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn twenty_bytes() -> AssetBuffer {
        AssetBuffer::from_vec((0..20).collect())
    }

    #[test]
    fn test_read_is_clamped_to_window() {
        let mut source = AssetSource::new(IoBackend::Buffer(twenty_bytes()), 5, 10).unwrap();
        let mut dst = [0xFFu8; 100];

        let read = source.read(&mut dst).unwrap();
        assert_eq!(read, 10);
        assert_eq!(&dst[..10], &[5, 6, 7, 8, 9, 10, 11, 12, 13, 14]);
        // Nothing beyond backend index 15 was copied.
        assert!(dst[10..].iter().all(|b| *b == 0xFF));
        assert_eq!(source.read(&mut dst).unwrap(), 0);
    }

    #[test]
    fn test_seek_is_window_relative() {
        let mut source = AssetSource::new(IoBackend::Buffer(twenty_bytes()), 5, 10).unwrap();
        assert_eq!(source.seek(SeekFrom::End(-2)).unwrap(), 8);

        let mut dst = [0u8; 4];
        assert_eq!(source.read(&mut dst).unwrap(), 2);
        assert_eq!(&dst[..2], &[13, 14]);

        assert_eq!(source.setpos(1).unwrap(), 1);
        assert_eq!(source.seek(SeekFrom::Current(2)).unwrap(), 3);
        assert_eq!(source.read(&mut dst).unwrap(), 4);
        assert_eq!(dst, [8, 9, 10, 11]);
    }

    #[test]
    fn test_seek_outside_window_fails() {
        let mut source = AssetSource::new(IoBackend::Buffer(twenty_bytes()), 5, 10).unwrap();
        source.setpos(4).unwrap();

        let err = source.setpos(11).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        let err = source.seek(SeekFrom::Current(-5)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert_eq!(source.position(), 4);
    }

    #[test]
    fn test_empty_source_is_invalid_argument() {
        let mut source = AssetSource::empty();
        assert!(source.is_detached());
        assert!(source.is_empty());
        let mut dst = [0u8; 1];
        assert_eq!(
            source.read(&mut dst).unwrap_err().kind(),
            io::ErrorKind::InvalidInput
        );
        assert_eq!(
            source.seek(SeekFrom::Start(0)).unwrap_err().kind(),
            io::ErrorKind::InvalidInput
        );
        assert_eq!(
            source.setpos(0).unwrap_err().kind(),
            io::ErrorKind::InvalidInput
        );
    }

    #[test]
    fn test_std_read_to_end_stops_at_window() {
        let mut source = AssetSource::new(IoBackend::Buffer(twenty_bytes()), 15, 3).unwrap();
        let mut out = Vec::new();
        Read::read_to_end(&mut source, &mut out).unwrap();
        assert_eq!(out, vec![15, 16, 17]);
    }

    #[test]
    fn test_read_to_vec_from_cursor() {
        let mut source = AssetSource::from_buffer(twenty_bytes());
        source.setpos(17).unwrap();
        assert_eq!(source.read_to_vec().unwrap(), vec![17, 18, 19]);
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn test_zero_length_window_is_empty_but_attached() {
        let mut source = AssetSource::from_buffer(AssetBuffer::new());
        assert!(source.is_empty());
        assert!(!source.is_detached());
        assert_eq!(source.read(&mut [0u8; 4]).unwrap(), 0);

        let source = AssetSource::new(IoBackend::Buffer(twenty_bytes()), 5, 10).unwrap();
        assert!(!source.is_empty());
        assert!(!source.is_detached());
    }
}
