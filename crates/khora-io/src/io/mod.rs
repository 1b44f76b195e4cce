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

//! Byte-level I/O primitives: the file-or-buffer backend, the owned-or-shared
//! buffer that receives decoded bytes, and the windowed [`AssetSource`] stream
//! handed to callers.

mod backend;
mod buffer;
mod source;

pub use backend::*;
pub use buffer::*;
pub use source::*;
