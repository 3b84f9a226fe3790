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

//! Property-based tests for the object database
//!
//! Uses proptest to verify ODB properties with random data:
//! - Store/retrieve roundtrip correctness
//! - Ids agree with an independent SHA-1 of the loose encoding
//! - Abbreviated ids resolve back to the full id

use gitkit_storage::MockBackend;
use gitkit_test_utils::fixtures::object_id;
use gitkit_versioning::{ObjectDatabase, ObjectType, Oid};
use proptest::prelude::*;
use std::sync::Arc;

/// Generate random binary data for testing
fn arb_binary_data() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..4096)
}

fn arb_kind() -> impl Strategy<Value = ObjectType> {
    prop::sample::select(ObjectType::ALL.to_vec())
}

proptest! {
    /// Property: Store then retrieve gives back the original bytes
    #[test]
    fn proptest_store_retrieve_roundtrip(data in arb_binary_data()) {
        let odb = ObjectDatabase::new(Arc::new(MockBackend::new()), 100);
        let oid = odb.write(ObjectType::Blob, &data).unwrap();
        prop_assert!(odb.exists(&oid));

        odb.clear_cache();
        let raw = odb.read(&oid).unwrap();
        prop_assert_eq!(raw.id(), oid);
        prop_assert_eq!(raw.data(), data.as_slice());
        prop_assert_eq!(odb.read_header(&oid).unwrap().length, data.len() as u64);
    }

    /// Property: ids are the SHA-1 of `"<type> <len>\0" + content`
    #[test]
    fn proptest_id_matches_git(kind in arb_kind(), data in arb_binary_data()) {
        let id = Oid::hash_object(kind, &data);
        prop_assert_eq!(id.to_hex(), object_id(kind.as_str(), &data));
    }

    /// Property: writing twice stores once
    #[test]
    fn proptest_deduplication(data in arb_binary_data()) {
        let storage = Arc::new(MockBackend::new());
        let odb = ObjectDatabase::new(storage.clone(), 100);
        let first = odb.write(ObjectType::Blob, &data).unwrap();
        let second = odb.write(ObjectType::Blob, &data).unwrap();
        prop_assert_eq!(first, second);
        prop_assert_eq!(storage.len(), 1);
        prop_assert_eq!(odb.metrics().unique_objects, 1);
    }

    /// Property: any prefix of 4+ digits of the only stored id finds it
    #[test]
    fn proptest_prefix_lookup(data in arb_binary_data(), len in 4usize..=40) {
        let odb = ObjectDatabase::new(Arc::new(MockBackend::new()), 100);
        let oid = odb.write(ObjectType::Blob, &data).unwrap();
        prop_assert_eq!(odb.find_by_prefix(&oid.to_hex()[..len]).unwrap(), oid);
    }
}
