//! Shared test utilities: a small EXIF writer for synthetic JPEG fixtures.
//!
//! Real camera files are large and carry pixel data we never look at, so the
//! tests build the APP1 segment from a field list instead. Values are laid out
//! the way cameras do it: inline when they fit in four bytes, otherwise in a
//! data area after the directory, with sub-directories appended last.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let jpeg = ExifBuilder::new(ByteOrder::BigEndian)
//!     .ifd(vec![
//!         ascii(MAKE, "LG Electronics"),
//!         sub_dir(EXIF_OFFSET, vec![ascii(DATE_TIME_ORIGINAL, "2016:11:06 11:29:18")]),
//!     ])
//!     .jpeg();
//! ```

use crate::exif::ByteOrder;
use std::path::{Path, PathBuf};

pub const MAKE: u16 = 0x010F;
pub const MODEL: u16 = 0x0110;
pub const ORIENTATION: u16 = 0x0112;
pub const X_RESOLUTION: u16 = 0x011A;
pub const DATE_TIME: u16 = 0x0132;
pub const EXIF_OFFSET: u16 = 0x8769;
pub const GPS_INFO: u16 = 0x8825;
pub const DATE_TIME_ORIGINAL: u16 = 0x9003;
pub const DATE_TIME_DIGITIZED: u16 = 0x9004;
pub const INTEROP_OFFSET: u16 = 0xA005;

/// Canonical capture time used across the fixtures.
pub const SHOT_AT: &str = "2016:11:06 11:29:18";

// =========================================================================
// Fields
// =========================================================================

#[derive(Debug, Clone)]
pub enum Payload {
    Ascii(String),
    Bytes(Vec<u8>),
    Shorts(Vec<u16>),
    Longs(Vec<u32>),
    URationals(Vec<(u32, u32)>),
    SRationals(Vec<(i32, i32)>),
    /// Written verbatim, whatever the byte order.
    Raw(Vec<u8>),
}

#[derive(Debug, Clone)]
pub enum Field {
    Value {
        tag: u16,
        format: u16,
        count: u32,
        payload: Payload,
    },
    SubDir {
        tag: u16,
        fields: Vec<Field>,
    },
}

pub fn ascii(tag: u16, s: &str) -> Field {
    Field::Value {
        tag,
        format: 2,
        count: s.len() as u32 + 1,
        payload: Payload::Ascii(s.to_string()),
    }
}

pub fn byte(tag: u16, v: u8) -> Field {
    Field::Value {
        tag,
        format: 1,
        count: 1,
        payload: Payload::Bytes(vec![v]),
    }
}

pub fn short(tag: u16, v: u16) -> Field {
    shorts(tag, &[v])
}

pub fn shorts(tag: u16, v: &[u16]) -> Field {
    Field::Value {
        tag,
        format: 3,
        count: v.len() as u32,
        payload: Payload::Shorts(v.to_vec()),
    }
}

pub fn long(tag: u16, v: u32) -> Field {
    Field::Value {
        tag,
        format: 4,
        count: 1,
        payload: Payload::Longs(vec![v]),
    }
}

pub fn rational(tag: u16, n: u32, d: u32) -> Field {
    Field::Value {
        tag,
        format: 5,
        count: 1,
        payload: Payload::URationals(vec![(n, d)]),
    }
}

pub fn srational(tag: u16, n: i32, d: i32) -> Field {
    Field::Value {
        tag,
        format: 10,
        count: 1,
        payload: Payload::SRationals(vec![(n, d)]),
    }
}

/// Format 7, the way cameras store version strings and configuration bytes.
pub fn undefined(tag: u16, bytes: &[u8]) -> Field {
    Field::Value {
        tag,
        format: 7,
        count: bytes.len() as u32,
        payload: Payload::Raw(bytes.to_vec()),
    }
}

/// Arbitrary entry header with verbatim value bytes.
pub fn raw(tag: u16, format: u16, count: u32, bytes: &[u8]) -> Field {
    Field::Value {
        tag,
        format,
        count,
        payload: Payload::Raw(bytes.to_vec()),
    }
}

pub fn sub_dir(tag: u16, fields: Vec<Field>) -> Field {
    Field::SubDir { tag, fields }
}

// =========================================================================
// Layout
// =========================================================================

fn put(order: ByteOrder, buf: &mut Vec<u8>, value: u64, width: usize) {
    let bytes = value.to_be_bytes();
    let be = &bytes[8 - width..];
    match order {
        ByteOrder::BigEndian => buf.extend_from_slice(be),
        ByteOrder::LittleEndian => buf.extend(be.iter().rev()),
    }
}

fn patch(order: ByteOrder, buf: &mut [u8], at: usize, value: u32) {
    let mut tmp = Vec::with_capacity(4);
    put(order, &mut tmp, u64::from(value), 4);
    buf[at..at + 4].copy_from_slice(&tmp);
}

fn encode(order: ByteOrder, payload: &Payload) -> Vec<u8> {
    let mut out = Vec::new();
    match payload {
        Payload::Ascii(s) => {
            out.extend_from_slice(s.as_bytes());
            out.push(0);
        }
        Payload::Bytes(b) | Payload::Raw(b) => out.extend_from_slice(b),
        Payload::Shorts(v) => v.iter().for_each(|&x| put(order, &mut out, x.into(), 2)),
        Payload::Longs(v) => v.iter().for_each(|&x| put(order, &mut out, x.into(), 4)),
        Payload::URationals(v) => v.iter().for_each(|&(n, d)| {
            put(order, &mut out, n.into(), 4);
            put(order, &mut out, d.into(), 4);
        }),
        Payload::SRationals(v) => v.iter().for_each(|&(n, d)| {
            put(order, &mut out, u64::from(n as u32), 4);
            put(order, &mut out, u64::from(d as u32), 4);
        }),
    }
    out
}

/// Builds the TIFF structure of an Exif APP1 segment.
pub struct ExifBuilder {
    order: ByteOrder,
    ifds: Vec<Vec<Field>>,
}

impl ExifBuilder {
    pub fn new(order: ByteOrder) -> Self {
        Self {
            order,
            ifds: Vec::new(),
        }
    }

    /// Append a top-level directory to the chain.
    pub fn ifd(mut self, fields: Vec<Field>) -> Self {
        self.ifds.push(fields);
        self
    }

    /// Writes one directory at the end of `tiff`, returns its next-IFD slot.
    fn write_ifd(&self, tiff: &mut Vec<u8>, fields: &[Field]) -> usize {
        let order = self.order;
        put(order, tiff, fields.len() as u64, 2);
        let mut slots = Vec::with_capacity(fields.len());
        for field in fields {
            let (tag, format, count) = match field {
                Field::Value {
                    tag, format, count, ..
                } => (*tag, *format, *count),
                Field::SubDir { tag, .. } => (*tag, 4, 1),
            };
            put(order, tiff, tag.into(), 2);
            put(order, tiff, format.into(), 2);
            put(order, tiff, count.into(), 4);
            slots.push(tiff.len());
            tiff.extend_from_slice(&[0; 4]);
        }
        let next_slot = tiff.len();
        tiff.extend_from_slice(&[0; 4]);

        for (field, slot) in fields.iter().zip(slots) {
            match field {
                Field::Value { payload, .. } => {
                    let data = encode(order, payload);
                    if data.len() <= 4 {
                        tiff[slot..slot + data.len()].copy_from_slice(&data);
                    } else {
                        let offset = tiff.len() as u32;
                        tiff.extend_from_slice(&data);
                        patch(order, tiff, slot, offset);
                    }
                }
                Field::SubDir { fields, .. } => {
                    let offset = tiff.len() as u32;
                    self.write_ifd(tiff, fields);
                    patch(order, tiff, slot, offset);
                }
            }
        }
        next_slot
    }

    /// TIFF header plus every directory; offsets are relative to byte 0.
    pub fn tiff(&self) -> Vec<u8> {
        let mut tiff = match self.order {
            ByteOrder::BigEndian => b"MM\0\x2A".to_vec(),
            ByteOrder::LittleEndian => b"II\x2A\0".to_vec(),
        };
        put(self.order, &mut tiff, 8, 4);
        let mut previous: Option<usize> = None;
        for fields in &self.ifds {
            let offset = tiff.len() as u32;
            if let Some(slot) = previous {
                patch(self.order, &mut tiff, slot, offset);
            }
            previous = Some(self.write_ifd(&mut tiff, fields));
        }
        tiff
    }

    /// Full file: SOI, APP1 with the Exif segment, then a bare EOI.
    pub fn jpeg(&self) -> Vec<u8> {
        let tiff = self.tiff();
        let mut out = vec![0xFF, 0xD8, 0xFF, 0xE1];
        let size = (2 + 6 + tiff.len()) as u16;
        out.extend_from_slice(&size.to_be_bytes());
        out.extend_from_slice(b"Exif\0\0");
        out.extend_from_slice(&tiff);
        out.extend_from_slice(&[0xFF, 0xD9]);
        out
    }
}

// =========================================================================
// Fixtures
// =========================================================================

/// A phone-camera style image: IFD0, Exif, GPS and interop directories, and
/// a chained thumbnail IFD1.
pub fn sample_jpeg(order: ByteOrder) -> Vec<u8> {
    ExifBuilder::new(order)
        .ifd(vec![
            ascii(MAKE, "LG Electronics"),
            ascii(MODEL, "LG-D855"),
            short(ORIENTATION, 6),
            rational(X_RESOLUTION, 72, 1),
            rational(0x011B, 72, 1),
            short(0x0128, 2),
            short(0x0213, 1),
            sub_dir(
                EXIF_OFFSET,
                vec![
                    undefined(0x9000, b"0220"),
                    ascii(DATE_TIME_ORIGINAL, SHOT_AT),
                    ascii(DATE_TIME_DIGITIZED, SHOT_AT),
                    rational(0x829D, 240, 100),
                    undefined(0x9101, &[1, 2, 3, 0]),
                    srational(0x9204, 0, 1),
                    long(0xA002, 4160),
                    short(0x9209, 0),
                    sub_dir(
                        INTEROP_OFFSET,
                        vec![ascii(0x0001, "R98"), undefined(0x0002, b"0100")],
                    ),
                ],
            ),
            sub_dir(GPS_INFO, vec![byte(0x0005, 0), rational(0x0006, 0, 1000)]),
        ])
        .ifd(vec![short(0x0103, 6), long(0x0201, 0), long(0x0202, 0)])
        .jpeg()
}

/// Minimal image carrying only the date tags that are `Some`.
pub fn jpeg_with_dates(
    original: Option<&str>,
    date_time: Option<&str>,
    digitized: Option<&str>,
) -> Vec<u8> {
    let mut main = vec![ascii(MAKE, "Test")];
    if let Some(dt) = date_time {
        main.push(ascii(DATE_TIME, dt));
    }
    let mut exif = Vec::new();
    if let Some(dto) = original {
        exif.push(ascii(DATE_TIME_ORIGINAL, dto));
    }
    if let Some(dtd) = digitized {
        exif.push(ascii(DATE_TIME_DIGITIZED, dtd));
    }
    if !exif.is_empty() {
        main.push(sub_dir(EXIF_OFFSET, exif));
    }
    ExifBuilder::new(ByteOrder::BigEndian).ifd(main).jpeg()
}

/// Write `bytes` to `dir/name`, creating `dir` as needed.
pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}
