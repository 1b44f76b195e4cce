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

//! Provides the primitive types for Khora's asset storage.
//!
//! This module defines the "common language" for all asset-related operations in the
//! engine. It has no knowledge of how packages are opened or how bytes are read.
//!
//! The key components are:
//! - [`AssetUUID`]: the stable, unique identifier used to reference assets.
//! - [`ByteSlice`]: the archive-relative byte range of an asset section, along with
//!   its compression metadata.
//!
//! Higher-level systems, such as the package catalog and the archive readers, are
//! built on these primitives in `khora-io`.

mod slice;
mod uuid;

pub use slice::*;
pub use uuid::*;
