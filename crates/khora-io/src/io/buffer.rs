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

use std::sync::Arc;

/// A byte buffer that either owns its allocation or views shared, immutable data.
///
/// Decoded archive sections land in an owned buffer; callers that already hold the
/// bytes (e.g. embedded data) can wrap them without a copy. Any mutation of a shared
/// buffer first takes a private copy.
///
/// Allocation failures abort the process, as with every other Rust allocation.
#[derive(Debug, Clone)]
pub struct AssetBuffer {
    owned: Vec<u8>,
    /// When set, the contents. `owned` is then empty.
    shared: Option<Arc<[u8]>>,
    cursor: usize,
}

impl AssetBuffer {
    /// Creates an empty, owning buffer.
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Creates an owning buffer of `len` zero bytes.
    pub fn zeroed(len: usize) -> Self {
        Self::from_vec(vec![0; len])
    }

    /// Takes ownership of `data`.
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self {
            owned: data,
            shared: None,
            cursor: 0,
        }
    }

    /// Views `data` without copying it.
    pub fn shared(data: Arc<[u8]>) -> Self {
        Self {
            owned: Vec::new(),
            shared: Some(data),
            cursor: 0,
        }
    }

    /// The number of bytes in the buffer.
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Returns `true` if the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the buffer owns its allocation.
    pub fn is_owned(&self) -> bool {
        self.shared.is_none()
    }

    /// The full contents, independent of the cursor.
    pub fn as_slice(&self) -> &[u8] {
        match &self.shared {
            Some(data) => data,
            None => &self.owned,
        }
    }

    /// Mutable access to the contents. Copies shared data first.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        self.owned_mut()
    }

    /// The current read position.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Moves the read position. Positions past the end are allowed and read nothing.
    pub fn set_position(&mut self, position: usize) {
        self.cursor = position;
    }

    /// The number of bytes between the cursor and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.cursor)
    }

    /// Copies up to `dst.len()` bytes from the cursor into `dst` and advances the cursor.
    ///
    /// Short reads are not errors: the returned count is the number of bytes
    /// actually copied, zero once the cursor reaches the end.
    pub fn read(&mut self, dst: &mut [u8]) -> usize {
        let count = dst.len().min(self.remaining());
        if count == 0 {
            return 0;
        }
        let start = self.cursor;
        dst[..count].copy_from_slice(&self.as_slice()[start..start + count]);
        self.cursor += count;
        count
    }

    /// Grows or shrinks the buffer to `len` bytes, zero-filling new bytes.
    pub fn resize(&mut self, len: usize) {
        self.owned_mut().resize(len, 0);
    }

    /// Copies shared data into an owned allocation. Does nothing if already owned.
    pub fn take_ownership(&mut self) {
        self.owned_mut();
    }

    /// Consumes the buffer and returns its bytes.
    pub fn into_vec(self) -> Vec<u8> {
        match self.shared {
            Some(data) => data.to_vec(),
            None => self.owned,
        }
    }

    fn owned_mut(&mut self) -> &mut Vec<u8> {
        if let Some(data) = self.shared.take() {
            self.owned = data.to_vec();
        }
        &mut self.owned
    }
}

impl Default for AssetBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<u8>> for AssetBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self::from_vec(data)
    }
}
