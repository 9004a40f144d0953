//! EXIF/TIFF metadata decoding in pure Rust, no codec dependencies.
//!
//! Only the APP1/Exif segment at the very start of a JPEG is read. Pixel data
//! is never touched and nothing is ever written back.
//!
//! ```text
//! 0000 FF D8                SOI (start of image)
//! 0002 FF E1                APP1 marker
//! 0004 SS SS                APP1 size, big-endian, includes these two bytes
//! 0006 45 78 69 66 00 00    "Exif\0\0"
//! 0012 4D 4D | 49 49        TIFF header: "MM" big-endian, "II" little-endian
//! 0014 00 2A                TIFF magic (42), not checked
//! 0016 00 00 00 08          main IFD offset, relative to 0012
//! ```
//!
//! Every offset found inside the TIFF structure is relative to byte 12 (the
//! TIFF header), never to the start of the file.
//!
//! The module is split into:
//! - **Cursor**: [`ByteCursor`], a forward-only stream materialized on demand
//!   into a buffer that every clone shares
//! - **Catalog**: static tag and format tables, keyed by `(TagGroup, number)`
//! - **Image**: [`ExifImage`], header validation and the recursive IFD walk

mod catalog;
mod cursor;
mod image;

pub use catalog::{
    Format, FormatKind, TagDescriptor, TagGroup, TagRef, lookup_format, lookup_tag,
};
pub use cursor::{ByteCursor, ByteOrder, DEFAULT_CHUNK, to_hex, zero_terminated};
pub use image::{ExifHeader, ExifImage, IfdEntry, MAX_DIRECTORY_ENTRIES};

use std::path::PathBuf;
use thiserror::Error;

/// Structural decode failures for a single image.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("{field} is missing (offset {offset}): expected {expected}, found {found}")]
    HeaderMismatch {
        offset: usize,
        field: &'static str,
        expected: &'static str,
        found: String,
    },
    #[error("TIFF byte order mark must be 'II' or 'MM', found '{0}'")]
    UnsupportedByteOrder(String),
    #[error("image directory at offset {address} holds {count} entries, expected 1..=200")]
    CorruptDirectory { address: usize, count: u16 },
    #[error("sub-directory at offset {address} is nested {depth} levels deep")]
    DirectoryTooDeep { address: usize, depth: usize },
    #[error("image directory chain revisits offset {address}")]
    DirectoryLoop { address: usize },
    #[error(
        "failed to extend buffer: required {required} more bytes at offset {position}, only able to read {available}"
    )]
    TruncatedStream {
        position: usize,
        required: usize,
        available: usize,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A [`DecodeError`] tagged with the file it came from.
///
/// This is the only error [`ExifImage`] constructors return, so callers
/// running a batch can log it and move on to the next file.
#[derive(Error, Debug)]
#[error("{}: {source}", .path.display())]
pub struct ExifError {
    pub path: PathBuf,
    #[source]
    pub source: DecodeError,
}

impl ExifError {
    pub fn kind(&self) -> &DecodeError {
        &self.source
    }
}
