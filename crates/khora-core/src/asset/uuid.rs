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
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Namespace used to derive name-based (version 5) asset identifiers.
const KHORA_ASSET_NAMESPACE: Uuid = Uuid::from_u128(0x6b68_6f72_615f_4173_9e74_5f6e_735f_7631);

/// A globally unique, persistent identifier for a logical asset.
///
/// This UUID represents the "idea" of an asset, completely decoupled from its
/// physical location. It is the primary key of every package catalog.
///
/// By using a stable UUID, assets can be moved between packages, renamed, or
/// repacked from a loose directory into an archive without breaking references
/// to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetUUID(Uuid);

impl AssetUUID {
    /// Creates a new, random (version 4) `AssetUUID`.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Derives a deterministic (version 5) `AssetUUID` from a name, typically the
    /// asset's source path. The same name always yields the same identifier.
    pub fn new_v5(name: &str) -> Self {
        Self(Uuid::new_v5(&KHORA_ASSET_NAMESPACE, name.as_bytes()))
    }

    /// Wraps an existing [`Uuid`].
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Builds an identifier from its 128-bit integer representation.
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    /// Returns the underlying [`Uuid`].
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AssetUUID {
    /// Creates a new, random (version 4) `AssetUUID`.
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AssetUUID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for AssetUUID {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for AssetUUID {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v5_is_deterministic() {
        let a = AssetUUID::new_v5("textures/stone.png");
        let b = AssetUUID::new_v5("textures/stone.png");
        let c = AssetUUID::new_v5("textures/grass.png");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_display_parses_back() {
        let uuid = AssetUUID::new();
        let parsed: AssetUUID = uuid.to_string().parse().unwrap();
        assert_eq!(uuid, parsed);
    }

    #[test]
    fn test_invalid_string_is_rejected() {
        assert!("not-a-uuid".parse::<AssetUUID>().is_err());
    }
}
