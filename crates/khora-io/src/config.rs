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

//! Runtime configuration of the asset storage layer.

use serde::{Deserialize, Serialize};

/// Settings shared by every package loaded through one [`StorageContext`](crate::StorageContext).
///
/// Missing fields take their default value, so a partial configuration file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Worker threads used to decode compressed frames. Zero uses one per core.
    pub decode_threads: usize,
    /// File extension identifying archive packages in `Package::load_all`.
    pub archive_extension: String,
    /// Name of the manifest file at the root of a loose package directory.
    pub manifest_name: String,
}

impl StorageConfig {
    /// Parses a configuration from RON text.
    pub fn from_ron(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            decode_threads: 0,
            archive_extension: "kpak".to_string(),
            manifest_name: "package.ron".to_string(),
        }
    }
}
