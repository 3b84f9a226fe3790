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

//! Compression size statistics

use serde::{Deserialize, Serialize};

/// Size metrics for one compression operation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressionMetrics {
    /// Original data size in bytes
    pub original_size: usize,
    /// Compressed data size in bytes
    pub compressed_size: usize,
    /// Compression ratio (original/compressed)
    pub compression_ratio: f64,
    /// Space saved in bytes
    pub space_saved: usize,
}

impl CompressionMetrics {
    /// Create metrics from size information
    pub fn from_sizes(original_size: usize, compressed_size: usize) -> Self {
        let compression_ratio = if original_size == 0 || compressed_size == 0 {
            1.0
        } else {
            original_size as f64 / compressed_size as f64
        };

        CompressionMetrics {
            original_size,
            compressed_size,
            compression_ratio,
            space_saved: original_size.saturating_sub(compressed_size),
        }
    }

    /// Space saved as a percentage of the original size
    pub fn savings_percentage(&self) -> f64 {
        if self.original_size == 0 {
            0.0
        } else {
            self.space_saved as f64 / self.original_size as f64 * 100.0
        }
    }
}
