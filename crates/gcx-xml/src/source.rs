//! Whole-file access with gzip auto-detection.
//!
//! Book files are read completely into memory before parsing. Compressed
//! files are recognised by the two gzip magic bytes, never by extension.

use std::io::{Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::debug;

use crate::error::XmlResult;

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// How a book file was (or should be) stored on disk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Encoding {
    #[default]
    Plain,
    Gzip,
}

pub fn is_gzip(data: &[u8]) -> bool {
    data.starts_with(&GZIP_MAGIC)
}

/// Decompress `data` if it carries the gzip magic, otherwise pass it through.
pub fn decode_source(data: Vec<u8>) -> XmlResult<(Vec<u8>, Encoding)> {
    if !is_gzip(&data) {
        return Ok((data, Encoding::Plain));
    }
    let mut out = Vec::with_capacity(data.len().saturating_mul(4));
    GzDecoder::new(data.as_slice()).read_to_end(&mut out)?;
    debug!(compressed = data.len(), plain = out.len(), "decompressed gzip source");
    Ok((out, Encoding::Gzip))
}

/// Read a whole file and decompress it when needed.
pub fn read_source(path: &Path) -> XmlResult<(Vec<u8>, Encoding)> {
    let raw = std::fs::read(path)?;
    decode_source(raw)
}

/// Apply the requested on-disk encoding to rendered document bytes.
pub fn encode_output(data: Vec<u8>, encoding: Encoding) -> XmlResult<Vec<u8>> {
    match encoding {
        Encoding::Plain => Ok(data),
        Encoding::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&data)?;
            Ok(encoder.finish()?)
        }
    }
}
