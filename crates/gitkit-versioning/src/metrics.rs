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

//! Counters for object database activity

use serde::{Deserialize, Serialize};

/// Snapshot of object database counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OdbMetrics {
    /// Full reads served from the cache
    pub cache_hits: u64,

    /// Full reads that went to storage
    pub cache_misses: u64,

    /// Header-only reads
    pub header_reads: u64,

    /// Reads rejected by a hash, length or zlib check
    pub corrupt_reads: u64,

    /// Objects written that weren't already stored
    pub unique_objects: u64,

    /// All write calls, duplicates included
    pub total_writes: u64,

    /// Uncompressed bytes of newly stored objects
    pub bytes_stored: u64,

    /// Uncompressed bytes passed to write, duplicates included
    pub bytes_written: u64,

    /// Deflated bytes of newly stored objects, loose header included
    pub bytes_on_disk: u64,
}

impl OdbMetrics {
    /// Zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction of full reads served from the cache
    ///
    /// ```
    /// use gitkit_versioning::OdbMetrics;
    ///
    /// let mut metrics = OdbMetrics::new();
    /// metrics.cache_hits = 75;
    /// metrics.cache_misses = 25;
    /// assert_eq!(metrics.hit_rate(), 0.75);
    /// ```
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    /// Fraction of written bytes that were already stored
    pub fn dedup_ratio(&self) -> f64 {
        if self.bytes_written == 0 {
            0.0
        } else {
            self.bytes_saved() as f64 / self.bytes_written as f64
        }
    }

    /// Bytes not stored again thanks to content addressing
    pub fn bytes_saved(&self) -> u64 {
        self.bytes_written.saturating_sub(self.bytes_stored)
    }

    pub(crate) fn record_cache_hit(&mut self) {
        self.cache_hits += 1;
    }

    pub(crate) fn record_cache_miss(&mut self) {
        self.cache_misses += 1;
    }

    pub(crate) fn record_header_read(&mut self) {
        self.header_reads += 1;
    }

    pub(crate) fn record_corrupt(&mut self) {
        self.corrupt_reads += 1;
    }

    /// `stored` is the deflated size when the object was new
    pub(crate) fn record_write(&mut self, size: u64, stored: Option<u64>) {
        self.total_writes += 1;
        self.bytes_written += size;
        if let Some(on_disk) = stored {
            self.unique_objects += 1;
            self.bytes_stored += size;
            self.bytes_on_disk += on_disk;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_metrics() {
        let metrics = OdbMetrics::new();
        assert_eq!(metrics.hit_rate(), 0.0);
        assert_eq!(metrics.dedup_ratio(), 0.0);
        assert_eq!(metrics.corrupt_reads, 0);
    }

    #[test]
    fn test_record_write_duplicate() {
        let mut metrics = OdbMetrics::new();
        metrics.record_write(1000, Some(40));
        metrics.record_write(1000, None);
        assert_eq!(metrics.total_writes, 2);
        assert_eq!(metrics.unique_objects, 1);
        assert_eq!(metrics.bytes_stored, 1000);
        assert_eq!(metrics.bytes_on_disk, 40);
        assert_eq!(metrics.bytes_saved(), 1000);
        assert_eq!(metrics.dedup_ratio(), 0.5);
    }

    #[test]
    fn test_read_counters() {
        let mut metrics = OdbMetrics::new();
        metrics.record_cache_miss();
        metrics.record_cache_hit();
        metrics.record_cache_hit();
        metrics.record_cache_hit();
        metrics.record_header_read();
        metrics.record_corrupt();
        assert_eq!(metrics.hit_rate(), 0.75);
        assert_eq!(metrics.header_reads, 1);
        assert_eq!(metrics.corrupt_reads, 1);
    }
}
