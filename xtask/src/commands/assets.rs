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

use crate::commands::assets_config::{AssetManifest, PackageFormat};
use crate::helpers::*;
use anyhow::{Context, Result};
use khora_io::{
    ArchiveCompression, Locator, Package, PackageBuilder, StorageConfig, StorageContext,
};
use std::fs;
use std::path::Path;

pub fn pack(config_path: &Path) -> Result<()> {
    print_task_start("Packing Assets", ROCKET, MAGENTA);

    let manifest = load_manifest(config_path)?;

    let valid_source_dirs: Vec<_> = manifest
        .source_directories
        .iter()
        .filter(|dir| dir.exists())
        .collect();

    if valid_source_dirs.is_empty() {
        print_error("No valid source directories found. Nothing to pack.");
        return Ok(());
    }

    let mut builder = PackageBuilder::new()
        .with_frame_size(manifest.frame_size)
        .with_compression_level(manifest.compression_level);
    for dir in valid_source_dirs {
        builder
            .add_directory(dir)
            .with_context(|| format!("Failed to collect assets from '{}'", dir.display()))?;
    }

    if builder.is_empty() {
        print_success("No asset files found to pack.");
        return Ok(());
    }

    println!(
        "{}🔎 Found:{} {} asset files to pack.",
        BOLD,
        RESET,
        builder.len()
    );

    if let Some(parent) = manifest.output.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create '{}'", parent.display()))?;
    }

    println!("{}📦 Writing {:?} package...", BOLD, manifest.format);
    let output = &manifest.output;
    let written = match manifest.format {
        PackageFormat::Loose => builder.write_loose(output),
        PackageFormat::Flat => builder.write_archive(output, ArchiveCompression::None),
        PackageFormat::Zstd => builder.write_archive(output, ArchiveCompression::Zstd),
    }
    .with_context(|| format!("Failed to write package to '{}'", output.display()))?;

    println!(
        "{}{} {} Wrote {} entries to '{}'",
        BOLD,
        GREEN,
        CHECK,
        written.entries.len(),
        output.display()
    );

    print_success("Asset pipeline finished successfully.");
    Ok(())
}

pub fn inspect(path: &Path, verify: bool) -> Result<()> {
    print_task_start("Inspecting Package", MAGNIFIER, CYAN);

    let ctx = StorageContext::new(StorageConfig::default());
    let package = Package::load(&ctx, path)
        .with_context(|| format!("Failed to load package '{}'", path.display()))?;

    println!(
        "{}💡 Info:{} {} '{}' with {} assets",
        BOLD,
        RESET,
        package.kind(),
        package.location().display(),
        package.len()
    );

    let mut damaged = 0;
    for uuid in package.uuids() {
        let Some(record) = package.record(&uuid) else {
            continue;
        };
        let size = match &record.locator {
            Locator::Archive(archive) => format!("{} B", archive.asset.src_size),
            Locator::Loose(loose) => loose.asset_path.display().to_string(),
        };
        let tags: Vec<_> = record.tags.iter().map(String::as_str).collect();
        println!(
            "  {uuid}  {:<32} [{}] {size}",
            record.name,
            tags.join(", ")
        );

        if verify {
            let handle = package
                .find(&uuid)
                .with_context(|| format!("Asset {uuid} vanished during inspection"))?;
            if !handle.verify()? {
                print_error(&format!("{uuid} does not match its checksum"));
                damaged += 1;
            }
        }
    }

    if damaged > 0 {
        anyhow::bail!("{damaged} assets failed verification");
    }
    print_success("Inspection finished.");
    Ok(())
}

/// Loads the `Assets.toml` manifest.
/// If the file does not exist, it returns the default configuration.
fn load_manifest(manifest_path: &Path) -> Result<AssetManifest> {
    let manifest: AssetManifest = if manifest_path.exists() {
        println!(
            "{}💡 Info:{} Found '{}'. Loading configuration.",
            BOLD,
            RESET,
            manifest_path.display()
        );
        let manifest_str = fs::read_to_string(manifest_path).with_context(|| {
            format!(
                "Failed to read manifest file at '{}'",
                manifest_path.display()
            )
        })?;
        toml::from_str(&manifest_str)
            .with_context(|| format!("Failed to parse TOML from '{}'", manifest_path.display()))?
    } else {
        println!(
            "{}💡 Info:{} No '{}' found. Using default configuration.",
            BOLD,
            RESET,
            manifest_path.display()
        );
        AssetManifest::default()
    };

    Ok(manifest)
}
