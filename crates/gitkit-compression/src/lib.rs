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

//! Compression for Git loose objects
//!
//! Every loose object is a zlib stream. The [`Compressor`] trait keeps the
//! object database independent of the codec; [`ZlibCompressor`] is the only
//! implementation Git repositories need.
//!
//! ```
//! use gitkit_compression::{Compressor, ZlibCompressor};
//!
//! let zlib = ZlibCompressor::default_level();
//! let packed = zlib.compress(b"blob 10\0hey there\n").unwrap();
//! assert_eq!(zlib.decompress(&packed).unwrap(), b"blob 10\0hey there\n");
//! ```

pub mod error;
pub mod metrics;
pub mod zlib_compressor;

use std::fmt::Debug;
use std::io::Read;

pub use error::{CompressionError, CompressionResult};
pub use metrics::CompressionMetrics;
pub use zlib_compressor::ZlibCompressor;

/// Compression level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionLevel {
    /// Level 1
    Fast,
    /// Level 6, Git's `core.compression` default
    Default,
    /// Level 9
    Best,
    /// Explicit zlib level (0-9)
    Custom(u32),
}

impl CompressionLevel {
    /// Build a level from a numeric zlib level
    ///
    /// # Errors
    ///
    /// Returns [`CompressionError::InvalidInput`] for levels above 9.
    pub fn from_level(level: u32) -> CompressionResult<Self> {
        match level {
            1 => Ok(CompressionLevel::Fast),
            6 => Ok(CompressionLevel::Default),
            9 => Ok(CompressionLevel::Best),
            0..=9 => Ok(CompressionLevel::Custom(level)),
            _ => Err(CompressionError::invalid_input(format!(
                "zlib level must be 0-9, got {}",
                level
            ))),
        }
    }

    /// Numeric zlib level
    pub fn to_zlib_level(self) -> u32 {
        match self {
            CompressionLevel::Fast => 1,
            CompressionLevel::Default => 6,
            CompressionLevel::Best => 9,
            CompressionLevel::Custom(level) => level.min(9),
        }
    }
}

/// Compressor trait for pluggable compression implementations
pub trait Compressor: Send + Sync + Debug {
    /// Compress data
    fn compress(&self, data: &[u8]) -> CompressionResult<Vec<u8>>;

    /// Decompress a complete buffer
    ///
    /// # Errors
    ///
    /// Returns [`CompressionError::DecompressionFailed`] when the input is
    /// not a well-formed stream for this codec.
    fn decompress(&self, data: &[u8]) -> CompressionResult<Vec<u8>>;

    /// Wrap a compressed stream in a decoding reader
    ///
    /// Read errors from the returned reader signal a corrupt stream.
    fn decoder<'a>(&self, reader: Box<dyn Read + Send + 'a>) -> Box<dyn Read + Send + 'a>;

    /// Get compression metrics for data
    fn metrics(&self, original: &[u8], compressed: &[u8]) -> CompressionMetrics {
        CompressionMetrics::from_sizes(original.len(), compressed.len())
    }
}
