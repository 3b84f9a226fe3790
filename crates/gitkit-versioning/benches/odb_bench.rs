// Gitkit - Git-compatible object store
// Copyright (C) 2025 Gitkit Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! Object database performance benchmarks
//!
//! Covers loose writes, cold and cached reads, header reads and prefix
//! lookups on both the local and in-memory backends.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gitkit_storage::{LocalBackend, MockBackend, StorageBackend};
use gitkit_versioning::{ObjectDatabase, ObjectType, Oid};
use std::hint::black_box;
use std::sync::Arc;
use tempfile::TempDir;

const SIZES: [usize; 3] = [1024, 64 * 1024, 1024 * 1024];

/// Setup an ODB over a fresh temporary directory
fn setup_local_odb() -> (ObjectDatabase, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let storage: Arc<dyn StorageBackend> = Arc::new(LocalBackend::new(temp_dir.path()).unwrap());
    (ObjectDatabase::new(storage, 1000), temp_dir)
}

fn setup_mock_odb() -> ObjectDatabase {
    ObjectDatabase::new(Arc::new(MockBackend::new()), 1000)
}

/// Deterministic, mildly compressible payload
fn payload(size: usize) -> Vec<u8> {
    (0..size).map(|i| ((i * 31) % 251) as u8).collect()
}

fn bench_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("odb_write");
    for size in SIZES {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("local", size), &size, |b, &size| {
            let (odb, _temp) = setup_local_odb();
            let mut counter = 0u64;
            let mut data = payload(size);
            b.iter(|| {
                // A distinct tail forces a real write every iteration.
                counter += 1;
                let tail = data.len() - 8;
                data[tail..].copy_from_slice(&counter.to_le_bytes());
                black_box(odb.write(ObjectType::Blob, &data).unwrap())
            });
        });
        group.bench_with_input(BenchmarkId::new("mock", size), &size, |b, &size| {
            let odb = setup_mock_odb();
            let data = payload(size);
            b.iter(|| black_box(odb.write(ObjectType::Blob, &data).unwrap()));
        });
    }
    group.finish();
}

fn bench_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("odb_read");
    for size in SIZES {
        group.throughput(Throughput::Bytes(size as u64));

        let (odb, _temp) = setup_local_odb();
        let oid = odb.write(ObjectType::Blob, &payload(size)).unwrap();

        group.bench_with_input(BenchmarkId::new("cold", size), &oid, |b, oid| {
            b.iter(|| {
                odb.clear_cache();
                black_box(odb.read(oid).unwrap())
            });
        });
        group.bench_with_input(BenchmarkId::new("cached", size), &oid, |b, oid| {
            odb.read(oid).unwrap();
            b.iter(|| black_box(odb.read(oid).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("header", size), &oid, |b, oid| {
            b.iter(|| {
                odb.clear_cache();
                black_box(odb.read_header(oid).unwrap())
            });
        });
    }
    group.finish();
}

fn bench_prefix_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("odb_prefix");
    for count in [100usize, 1000] {
        let (odb, _temp) = setup_local_odb();
        let ids: Vec<Oid> = (0..count)
            .map(|i| odb.write(ObjectType::Blob, format!("object {}", i).as_bytes()).unwrap())
            .collect();
        let prefix = ids[count / 2].to_hex()[..7].to_string();

        group.bench_with_input(BenchmarkId::from_parameter(count), &prefix, |b, prefix| {
            b.iter(|| black_box(odb.find_by_prefix(prefix).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_write, bench_read, bench_prefix_lookup);
criterion_main!(benches);
