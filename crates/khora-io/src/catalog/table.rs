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

use super::AssetRecord;
use ahash::AHashMap;
use khora_core::asset::AssetUUID;

/// The per-package catalog: records indexed by UUID, plus a secondary name index.
///
/// The UUID index is authoritative and unique. The name index holds one UUID per
/// name even though several records may share a name; the most recent insert
/// claims it. A name entry always points at a record that currently bears that
/// name.
///
/// The table has no internal locking. Mutation must be serialized by the owner.
#[derive(Debug, Default)]
pub struct AssetTable {
    records: AHashMap<AssetUUID, AssetRecord>,
    names: AHashMap<String, AssetUUID>,
}

impl AssetTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the table holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Inserts `record` under `uuid`, replacing any record already stored there.
    ///
    /// A named record claims its name in the name index, superseding whichever
    /// UUID held it before. Returns the replaced record, if any.
    pub fn insert(&mut self, uuid: AssetUUID, record: AssetRecord) -> Option<AssetRecord> {
        let replaced = self.records.remove(&uuid);
        if let Some(old) = &replaced {
            log::trace!("Catalog: record {uuid} replaced");
            if old.name != record.name {
                self.release_name(&old.name, &uuid);
            }
        }

        if record.is_named() {
            if let Some(previous) = self.names.insert(record.name.clone(), uuid) {
                if previous != uuid {
                    log::trace!(
                        "Catalog: name '{}' moved from {previous} to {uuid}",
                        record.name
                    );
                }
            }
        }

        self.records.insert(uuid, record);
        replaced
    }

    /// Removes the record stored under `uuid` and returns it.
    ///
    /// The record's name is released only if the name index still points at
    /// `uuid`; a name since claimed by another record is left untouched.
    pub fn erase(&mut self, uuid: &AssetUUID) -> Option<AssetRecord> {
        let record = self.records.remove(uuid)?;
        self.release_name(&record.name, uuid);
        Some(record)
    }

    /// Removes every record.
    pub fn clear(&mut self) {
        self.records.clear();
        self.names.clear();
    }

    /// Returns the record stored under `uuid`.
    pub fn get(&self, uuid: &AssetUUID) -> Option<&AssetRecord> {
        self.records.get(uuid)
    }

    /// Returns `true` if a record is stored under `uuid`.
    pub fn contains(&self, uuid: &AssetUUID) -> bool {
        self.records.contains_key(uuid)
    }

    /// Resolves a name through the name index.
    pub fn find_by_name(&self, name: &str) -> Option<(AssetUUID, &AssetRecord)> {
        let uuid = *self.names.get(name)?;
        self.records.get(&uuid).map(|record| (uuid, record))
    }

    /// Returns every record bearing `name`, indexed or not.
    pub fn find_all<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = (AssetUUID, &'a AssetRecord)> + 'a {
        self.match_all(move |_, record| record.name == name)
    }

    /// Returns the first record satisfying `predicate`, in unspecified order.
    pub fn match_one<F>(&self, mut predicate: F) -> Option<(AssetUUID, &AssetRecord)>
    where
        F: FnMut(&AssetUUID, &AssetRecord) -> bool,
    {
        self.records
            .iter()
            .find(|(uuid, record)| predicate(uuid, record))
            .map(|(uuid, record)| (*uuid, record))
    }

    /// Returns every record satisfying `predicate`, in unspecified order.
    pub fn match_all<'a, F>(
        &'a self,
        mut predicate: F,
    ) -> impl Iterator<Item = (AssetUUID, &'a AssetRecord)> + 'a
    where
        F: FnMut(&AssetUUID, &AssetRecord) -> bool + 'a,
    {
        self.records
            .iter()
            .filter(move |(uuid, record)| predicate(uuid, record))
            .map(|(uuid, record)| (*uuid, record))
    }

    /// Iterates over every record.
    pub fn iter(&self) -> impl Iterator<Item = (AssetUUID, &AssetRecord)> {
        self.records.iter().map(|(uuid, record)| (*uuid, record))
    }

    fn release_name(&mut self, name: &str, uuid: &AssetUUID) {
        if name.is_empty() {
            return;
        }
        if self.names.get(name) == Some(uuid) {
            self.names.remove(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::LooseLocator;
    use std::path::PathBuf;

    fn record(name: &str, path: &str) -> AssetRecord {
        AssetRecord::new(LooseLocator {
            asset_path: PathBuf::from(path),
            meta_path: PathBuf::new(),
        })
        .with_name(name)
    }

    fn asset_path(record: &AssetRecord) -> &str {
        match &record.locator {
            crate::catalog::Locator::Loose(loose) => loose.asset_path.to_str().unwrap(),
            crate::catalog::Locator::Archive(_) => panic!("expected a loose locator"),
        }
    }

    #[test]
    fn test_insert_same_uuid_keeps_last() {
        let mut table = AssetTable::new();
        let uuid = AssetUUID::from_u128(1);

        assert!(table.insert(uuid, record("a", "first.bin")).is_none());
        let replaced = table.insert(uuid, record("a", "second.bin")).unwrap();

        assert_eq!(asset_path(&replaced), "first.bin");
        assert_eq!(table.len(), 1);
        assert_eq!(asset_path(table.get(&uuid).unwrap()), "second.bin");
    }

    #[test]
    fn test_erase_keeps_name_claimed_by_another_record() {
        let mut table = AssetTable::new();
        let a = AssetUUID::from_u128(1);
        let b = AssetUUID::from_u128(2);

        table.insert(a, record("x", "a.bin"));
        table.insert(b, record("x", "b.bin"));
        table.erase(&a);

        let (found, _) = table.find_by_name("x").unwrap();
        assert_eq!(found, b);
    }

    #[test]
    fn test_erase_releases_own_name() {
        let mut table = AssetTable::new();
        let a = AssetUUID::from_u128(1);

        table.insert(a, record("x", "a.bin"));
        assert!(table.erase(&a).is_some());

        assert!(table.find_by_name("x").is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn test_later_insert_supersedes_name() {
        let mut table = AssetTable::new();
        let a = AssetUUID::from_u128(1);
        let b = AssetUUID::from_u128(2);

        table.insert(a, record("x", "a.bin"));
        table.insert(b, record("x", "b.bin"));

        assert_eq!(table.find_by_name("x").unwrap().0, b);
        assert_eq!(table.find_all("x").count(), 2);
    }

    #[test]
    fn test_renaming_insert_drops_stale_name() {
        let mut table = AssetTable::new();
        let a = AssetUUID::from_u128(1);

        table.insert(a, record("old", "a.bin"));
        table.insert(a, record("new", "a.bin"));

        assert!(table.find_by_name("old").is_none());
        assert_eq!(table.find_by_name("new").unwrap().0, a);
    }

    #[test]
    fn test_unnamed_records_are_not_indexed() {
        let mut table = AssetTable::new();
        table.insert(AssetUUID::from_u128(1), record("", "a.bin"));
        assert!(table.find_by_name("").is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_match_by_tag() {
        let mut table = AssetTable::new();
        table.insert(
            AssetUUID::from_u128(1),
            record("grass", "grass.png").with_tags(["texture"]),
        );
        table.insert(
            AssetUUID::from_u128(2),
            record("step", "step.wav").with_tags(["audio"]),
        );
        table.insert(
            AssetUUID::from_u128(3),
            record("stone", "stone.png").with_tags(["texture"]),
        );

        let (uuid, _) = table.match_one(|_, r| r.has_tag("audio")).unwrap();
        assert_eq!(uuid, AssetUUID::from_u128(2));
        assert_eq!(table.match_all(|_, r| r.has_tag("texture")).count(), 2);
        assert!(table.match_one(|_, r| r.has_tag("mesh")).is_none());
    }

    #[test]
    fn test_clear_empties_both_indexes() {
        let mut table = AssetTable::new();
        table.insert(AssetUUID::from_u128(1), record("x", "a.bin"));
        table.clear();
        assert!(table.is_empty());
        assert!(table.find_by_name("x").is_none());
    }
}
