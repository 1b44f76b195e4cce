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

use anyhow::Result;
use khora_io::{
    ArchiveCompression, AssetRecord, AssetUUID, DecodePool, LooseLocator, Package, PackageBuilder,
    PackageError, PackageKind, PendingAsset, StorageConfig, StorageContext,
};
use std::{fs, io::SeekFrom, path::Path, sync::Arc, thread};
use tempfile::tempdir;

const MESH: AssetUUID = AssetUUID::from_u128(0x10);
const TEXTURE: AssetUUID = AssetUUID::from_u128(0x20);
const SHADER: AssetUUID = AssetUUID::from_u128(0x30);

fn texture_bytes() -> Vec<u8> {
    (0..300_000u32).map(|i| (i * 7 % 251) as u8).collect()
}

fn builder() -> PackageBuilder {
    let mut builder = PackageBuilder::new().with_frame_size(64 * 1024);
    builder.add(
        PendingAsset::new(MESH, b"vertices and indices".to_vec())
            .with_name("cube")
            .with_tags(["mesh"]),
    );
    builder.add(
        PendingAsset::new(TEXTURE, texture_bytes())
            .with_name("bricks")
            .with_tags(["texture", "tiling"])
            .with_metadata(b"format = rgba8".to_vec()),
    );
    builder.add(
        PendingAsset::new(SHADER, b"@vertex fn main() {}".to_vec())
            .with_name("cube")
            .with_tags(["shader"]),
    );
    builder
}

fn context() -> StorageContext {
    StorageContext::with_decode_pool(StorageConfig::default(), Arc::new(DecodePool::new(2)))
}

/// Writes the same three assets in every package form.
fn write_all_forms(dir: &Path) -> Result<()> {
    let builder = builder();
    builder.write_loose(dir.join("loose"))?;
    builder.write_archive(dir.join("flat.kpak"), ArchiveCompression::None)?;
    builder.write_archive(dir.join("packed.kpak"), ArchiveCompression::Zstd)?;
    Ok(())
}

fn check_contents(package: &Package) -> Result<()> {
    assert_eq!(package.len(), 3);

    let texture = package.find(&TEXTURE).expect("texture is cataloged");
    assert_eq!(texture.name().as_deref(), Some("bricks"));
    assert!(texture.tags().contains("tiling"));
    assert_eq!(texture.read_all()?, texture_bytes());
    assert!(texture.has_metadata());
    assert_eq!(texture.metadata()?.read_to_vec()?, b"format = rgba8");
    assert!(texture.verify()?);

    let mesh = package.find(&MESH).expect("mesh is cataloged");
    assert!(!mesh.has_metadata());
    assert_eq!(mesh.read_all()?, b"vertices and indices");
    Ok(())
}

#[test]
fn test_every_form_serves_the_same_assets() -> Result<()> {
    let dir = tempdir()?;
    write_all_forms(dir.path())?;
    let ctx = context();

    for (name, kind) in [
        ("loose", PackageKind::Loose),
        ("flat.kpak", PackageKind::FlatArchive),
        ("packed.kpak", PackageKind::ZstdArchive),
    ] {
        let package = Package::load(&ctx, dir.path().join(name))?;
        assert_eq!(package.kind(), kind);
        check_contents(&package)?;
    }
    Ok(())
}

#[test]
fn test_load_all_finds_every_package() -> Result<()> {
    let dir = tempdir()?;
    write_all_forms(dir.path())?;
    fs::write(dir.path().join("notes.txt"), "not a package")?;
    fs::create_dir(dir.path().join("empty"))?;

    let packages = Package::load_all(&context(), dir.path())?;
    let kinds: Vec<_> = packages.iter().map(Package::kind).collect();
    assert_eq!(
        kinds,
        [
            PackageKind::FlatArchive,
            PackageKind::Loose,
            PackageKind::ZstdArchive
        ]
    );
    Ok(())
}

#[test]
fn test_name_lookup_prefers_last_inserted() -> Result<()> {
    let dir = tempdir()?;
    write_all_forms(dir.path())?;
    let package = Package::load(&context(), dir.path().join("packed.kpak"))?;

    // Manifest entries are in UUID order, so the shader registered "cube" last.
    let cube = package.find_by_name("cube").expect("name is indexed");
    assert_eq!(cube.uuid(), SHADER);

    let mut all: Vec<_> = package.find_all("cube").iter().map(|h| h.uuid()).collect();
    all.sort();
    assert_eq!(all, [MESH, SHADER]);

    assert!(package.find_by_name("missing").is_none());
    Ok(())
}

#[test]
fn test_match_by_tag() -> Result<()> {
    let dir = tempdir()?;
    write_all_forms(dir.path())?;
    let package = Package::load(&context(), dir.path().join("flat.kpak"))?;

    let textures = package.match_all(|_, record| record.has_tag("texture"));
    assert_eq!(textures.len(), 1);
    assert_eq!(textures[0].uuid(), TEXTURE);

    assert!(package.match_one(|_, record| record.has_tag("audio")).is_none());
    Ok(())
}

#[test]
fn test_streams_are_independent_across_threads() -> Result<()> {
    let dir = tempdir()?;
    write_all_forms(dir.path())?;
    let package = Package::load(&context(), dir.path().join("packed.kpak"))?;
    let expected = texture_bytes();

    let workers: Vec<_> = (0..4)
        .map(|i| {
            let handle = package.find(&TEXTURE).expect("texture is cataloged");
            let expected = expected.clone();
            thread::spawn(move || {
                let mut source = handle.open().unwrap();
                let start = i * 1000;
                source.setpos(start as u64).unwrap();
                let mut buf = vec![0u8; 500];
                let read = source.read(&mut buf).unwrap();
                assert_eq!(&buf[..read], &expected[start..start + read]);
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker panicked");
    }
    Ok(())
}

#[test]
fn test_source_window_is_bounded() -> Result<()> {
    let dir = tempdir()?;
    write_all_forms(dir.path())?;
    let package = Package::load(&context(), dir.path().join("flat.kpak"))?;
    let mut source = package.find(&MESH).expect("mesh is cataloged").open()?;

    assert_eq!(source.len(), 20);
    source.seek(SeekFrom::End(-7))?;
    let mut buf = [0u8; 64];
    assert_eq!(source.read(&mut buf)?, 7);
    assert_eq!(&buf[..7], b"indices");
    assert_eq!(source.read(&mut buf)?, 0);
    assert!(source.seek(SeekFrom::Current(1)).is_err());
    Ok(())
}

#[test]
fn test_handles_keep_package_alive() -> Result<()> {
    let dir = tempdir()?;
    write_all_forms(dir.path())?;
    let package = Package::load(&context(), dir.path().join("loose"))?;
    let handle = package.find(&MESH).expect("mesh is cataloged");
    assert_eq!(package.ref_count(), 2);

    drop(package);
    assert_eq!(handle.package().ref_count(), 1);
    assert_eq!(handle.read_all()?, b"vertices and indices");
    Ok(())
}

#[test]
fn test_erased_asset_fails_to_open() -> Result<()> {
    let dir = tempdir()?;
    write_all_forms(dir.path())?;
    let package = Package::load(&context(), dir.path().join("packed.kpak"))?;
    let handle = package.find(&MESH).expect("mesh is cataloged");

    assert!(package.erase(&MESH).is_some());
    assert!(!handle.is_valid());
    assert!(package.find_by_name("cube").is_some());
    let err = handle.open().unwrap_err();
    assert!(matches!(err, PackageError::Asset { uuid, .. } if uuid == MESH));
    assert_eq!(err.io_kind(), Some(std::io::ErrorKind::NotFound));
    Ok(())
}

#[test]
fn test_runtime_insert_into_loose_package() -> Result<()> {
    let dir = tempdir()?;
    write_all_forms(dir.path())?;
    let root = dir.path().join("loose");
    fs::write(root.join("extra.bin"), b"hot reloaded")?;

    let package = Package::load(&context(), &root)?;
    let uuid = AssetUUID::new();
    package.insert(
        uuid,
        AssetRecord::new(LooseLocator {
            asset_path: "extra.bin".into(),
            meta_path: Default::default(),
        })
        .with_name("extra"),
    );

    let handle = package.find_by_name("extra").expect("inserted by name");
    assert_eq!(handle.uuid(), uuid);
    assert_eq!(handle.read_all()?, b"hot reloaded");
    assert!(handle.verify()?);
    Ok(())
}

#[test]
fn test_corrupted_asset_fails_verification() -> Result<()> {
    let dir = tempdir()?;
    write_all_forms(dir.path())?;
    let root = dir.path().join("loose");
    fs::write(root.join("assets").join(MESH.to_string()), b"tampered")?;

    let package = Package::load(&context(), &root)?;
    let mesh = package.find(&MESH).expect("mesh is cataloged");
    assert!(!mesh.verify()?);
    Ok(())
}

#[test]
fn test_load_errors() -> Result<()> {
    let dir = tempdir()?;
    let ctx = context();

    let err = Package::load(&ctx, dir.path().join("missing.kpak")).unwrap_err();
    assert_eq!(err.io_kind(), Some(std::io::ErrorKind::NotFound));

    let short = dir.path().join("short.kpak");
    fs::write(&short, b"KPAK")?;
    assert!(matches!(
        Package::load(&ctx, &short),
        Err(PackageError::NotAPackage { .. })
    ));

    fs::create_dir(dir.path().join("bare"))?;
    assert!(matches!(
        Package::load(&ctx, dir.path().join("bare")),
        Err(PackageError::NotAPackage { .. })
    ));

    let broken = dir.path().join("broken");
    fs::create_dir(&broken)?;
    fs::write(broken.join("package.ron"), "(version: 1, entries: [")?;
    assert!(matches!(
        Package::load(&ctx, &broken),
        Err(PackageError::Manifest { .. })
    ));
    Ok(())
}

#[test]
fn test_custom_archive_extension() -> Result<()> {
    let dir = tempdir()?;
    builder().write_archive(dir.path().join("level.pak"), ArchiveCompression::Zstd)?;

    let default = Package::load_all(&context(), dir.path())?;
    assert!(default.is_empty());

    let config = StorageConfig {
        archive_extension: "pak".to_string(),
        ..StorageConfig::default()
    };
    let packages = Package::load_all(&StorageContext::new(config), dir.path())?;
    assert_eq!(packages.len(), 1);
    check_contents(&packages[0])
}
