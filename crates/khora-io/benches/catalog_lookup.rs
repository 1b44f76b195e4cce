use criterion::{criterion_group, criterion_main, Criterion};
use khora_io::{
    ArchiveCompression, AssetUUID, Package, PackageBuilder, PendingAsset, StorageContext,
};
use std::hint::black_box;

fn bench_catalog(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench.kpak");

    // 10,000 small assets, one in ten tagged
    let mut builder = PackageBuilder::new();
    for i in 0..10_000u32 {
        let mut asset = PendingAsset::new(AssetUUID::from_u128(i as u128 + 1), i.to_le_bytes())
            .with_name(format!("asset_{i}"));
        if i % 10 == 0 {
            asset = asset.with_tags(["hot"]);
        }
        builder.add(asset);
    }
    builder
        .write_archive(&path, ArchiveCompression::None)
        .unwrap();
    let package = Package::load(&StorageContext::default(), &path).unwrap();

    let mut group = c.benchmark_group("Catalog Lookup");

    group.bench_function("find by uuid", |b| {
        let uuid = AssetUUID::from_u128(5_000);
        b.iter(|| black_box(package.find(black_box(&uuid))));
    });

    group.bench_function("find by name", |b| {
        b.iter(|| black_box(package.find_by_name(black_box("asset_4999"))));
    });

    group.bench_function("match all by tag", |b| {
        b.iter(|| black_box(package.match_all(|_, record| record.has_tag("hot")).len()));
    });

    group.bench_function("open and read (flat)", |b| {
        let handle = package.find_by_name("asset_42").unwrap();
        b.iter(|| black_box(handle.read_all().unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_catalog);
criterion_main!(benches);
