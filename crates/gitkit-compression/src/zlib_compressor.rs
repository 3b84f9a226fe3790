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

//! Zlib compression implementation for Git compatibility
//!
//! Git stores every loose object as a zlib (RFC 1950) stream. Input that
//! doesn't carry a valid zlib header is rejected rather than passed through;
//! the object database reports that as corruption.

use crate::error::{CompressionError, CompressionResult};
use crate::{CompressionLevel, Compressor};
use flate2::bufread::ZlibDecoder;
use flate2::read::ZlibEncoder;
use flate2::Compression;
use std::fmt;
use std::io::{self, BufRead, BufReader, Read};
use tracing::trace;

/// Zlib compressor implementation
#[derive(Clone)]
pub struct ZlibCompressor {
    level: CompressionLevel,
}

impl ZlibCompressor {
    /// Create a new Zlib compressor with the given compression level
    pub fn new(level: CompressionLevel) -> Self {
        ZlibCompressor { level }
    }

    /// Create a Zlib compressor with fast compression
    pub fn fast() -> Self {
        ZlibCompressor::new(CompressionLevel::Fast)
    }

    /// Create a Zlib compressor with Git's default level 6
    pub fn default_level() -> Self {
        ZlibCompressor::new(CompressionLevel::Default)
    }

    /// Create a Zlib compressor with best compression
    pub fn best() -> Self {
        ZlibCompressor::new(CompressionLevel::Best)
    }

    fn get_compression(&self) -> Compression {
        Compression::new(self.level.to_zlib_level())
    }

    /// Zlib header check: CMF method 8 and `(CMF * 256 + FLG) % 31 == 0`
    pub fn looks_like_zlib(data: &[u8]) -> bool {
        data.len() >= 2 && data[0] & 0x0f == 8 && {
            let cmf = data[0] as u16;
            let flg = data[1] as u16;
            (cmf * 256 + flg).is_multiple_of(31)
        }
    }
}

impl Default for ZlibCompressor {
    fn default() -> Self {
        Self::default_level()
    }
}

impl fmt::Debug for ZlibCompressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZlibCompressor")
            .field("level", &self.level)
            .finish()
    }
}

impl Compressor for ZlibCompressor {
    fn compress(&self, data: &[u8]) -> CompressionResult<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(data, self.get_compression());
        let mut compressed = Vec::new();

        encoder.read_to_end(&mut compressed).map_err(|e| {
            CompressionError::compression_failed(format!("zlib compression failed: {}", e))
        })?;

        trace!(
            original = data.len(),
            compressed = compressed.len(),
            "zlib compressed"
        );
        Ok(compressed)
    }

    fn decompress(&self, data: &[u8]) -> CompressionResult<Vec<u8>> {
        if !Self::looks_like_zlib(data) {
            return Err(CompressionError::decompression_failed(
                "input does not start with a zlib header",
            ));
        }

        let mut decoder = ZlibDecoder::new(data);
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed).map_err(|e| {
            CompressionError::decompression_failed(format!("zlib decompression failed: {}", e))
        })?;

        let trailing = (data.len() as u64).saturating_sub(decoder.total_in());
        if trailing > 0 {
            return Err(CompressionError::decompression_failed(format!(
                "{} bytes of garbage after zlib stream",
                trailing
            )));
        }

        Ok(decompressed)
    }

    fn decoder<'a>(&self, reader: Box<dyn Read + Send + 'a>) -> Box<dyn Read + Send + 'a> {
        Box::new(StrictDecoder {
            inner: ZlibDecoder::new(BufReader::new(reader)),
        })
    }
}

/// Streaming decoder that fails on bytes after the end of the zlib stream
struct StrictDecoder<R: BufRead> {
    inner: ZlibDecoder<R>,
}

impl<R: BufRead> Read for StrictDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 && !buf.is_empty() && !self.inner.get_mut().fill_buf()?.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "garbage after zlib stream",
            ));
        }
        Ok(n)
    }
}
