//! Header validation and the IFD walk.
//!
//! ```text
//! IFD at address A:
//!   A+0   u16 entry count (1..=200)
//!   A+2   12-byte entries: tag u16, format u16, count u32, value-or-offset [u8; 4]
//!   A+2+12n  u32 next IFD offset (0 ends the top-level chain)
//! ```
//!
//! A value whose `count * width` fits in four bytes is stored in the entry
//! itself. Larger values live at `12 + offset`. Entries whose tag is a
//! sub-directory pointer (`ExifOffset`, `GPSInfo`, `InteroperabilityOffset`)
//! are followed recursively with the tag group switched, and never show up
//! in the result themselves.

use super::catalog::{Format, FormatKind, TagRef, lookup_format, undefined_format};
use super::cursor::{ByteCursor, ByteOrder, DEFAULT_CHUNK, to_hex, zero_terminated};
use super::{DecodeError, ExifError};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{Level, debug};

const OFS_SOI: usize = 0;
const OFS_APP1_MARKER: usize = 2;
const OFS_APP1_SIZE: usize = 4;
const OFS_EXIF_HEADER: usize = 6;
const OFS_TIFF_HEADER: usize = 12;
const OFS_MAIN_IFD: usize = 16;

/// Bytes 6..12 of every EXIF JPEG, matched exactly.
const EXIF_MARKER: &[u8; 6] = b"Exif\0\0";

/// Upper bound on entries in one directory. A corrupt offset usually lands on
/// data that reads as a huge count.
pub const MAX_DIRECTORY_ENTRIES: u16 = 200;

/// Sub-directory nesting limit. Cameras use two levels (IFD0 → Exif → Iop).
const MAX_DEPTH: usize = 4;

/// The four fixed fields in front of the TIFF structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExifHeader {
    /// Start of image marker as uppercase hex, `FFD8`.
    pub soi: String,
    /// APP1 marker as uppercase hex, `FFE1`.
    pub app1_marker: String,
    /// APP1 payload size, the stored value minus its own two bytes.
    pub app1_size: u32,
    pub exif: bool,
}

/// One decoded directory slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfdEntry {
    /// Absolute offset of the 12-byte entry.
    pub address: usize,
    pub tag: TagRef,
    pub format: &'static Format,
    pub item_count: u32,
    /// `item_count * format.width`.
    pub byte_count: u64,
    /// The value itself, or the offset to it when `byte_count > 4`.
    pub raw: [u8; 4],
    pub value: String,
}

impl IfdEntry {
    pub fn name(&self) -> &'static str {
        self.tag.name()
    }

    pub fn is_inline(&self) -> bool {
        self.byte_count <= 4
    }

    /// `Name=Value`, one line of [`ExifImage::output`].
    pub fn output(&self) -> String {
        format!("{}={}", self.name(), self.value)
    }

    /// Single-line dump of every field, prefixed with `label`.
    pub fn diagnostics(&self, label: &str) -> String {
        let location = if self.is_inline() {
            format!("VALUE[{}:{}]", to_hex(&self.raw, Some(',')), self.value)
        } else {
            format!(
                "OFFSET[{}] VALUE[{}]",
                to_hex(&self.raw, Some(',')),
                self.value
            )
        };
        format!(
            "IFD:{label} TAG[{}:{}:{}] ITEM_COUNT[{}*{}] FORMAT[{}] {location} TAG_DESC[{}]",
            self.tag.group,
            self.tag.number,
            self.name(),
            self.item_count,
            self.format.width,
            self.format,
            self.tag.description(),
        )
    }
}

/// Decoded EXIF metadata of one JPEG file.
///
/// Only exists when the header checks pass and every directory parses;
/// there is no partially decoded image.
#[derive(Debug)]
pub struct ExifImage {
    path: PathBuf,
    header: ExifHeader,
    byte_order: ByteOrder,
    entries: Vec<IfdEntry>,
    materialized: usize,
}

impl ExifImage {
    /// Decode every tag of the file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ExifError> {
        Self::open_with(path, |_, _| true)
    }

    /// Decode the file at `path`, keeping only entries `select` accepts.
    ///
    /// `select` sees each decoded entry together with a cursor positioned at
    /// the start of its 12-byte slot. Sub-directory pointers are never offered.
    pub fn open_with<F>(path: impl AsRef<Path>, select: F) -> Result<Self, ExifError>
    where
        F: FnMut(&IfdEntry, &ByteCursor) -> bool,
    {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ExifError {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        Self::from_reader(path, BufReader::new(file), DEFAULT_CHUNK, select)
    }

    /// Decode from any reader. `path` only labels errors and diagnostics.
    pub fn from_reader<R, F>(
        path: impl Into<PathBuf>,
        reader: R,
        chunk: usize,
        mut select: F,
    ) -> Result<Self, ExifError>
    where
        R: Read + 'static,
        F: FnMut(&IfdEntry, &ByteCursor) -> bool,
    {
        let path = path.into();
        match decode(&path, reader, chunk, &mut select) {
            Ok(image) => Ok(image),
            Err(source) => Err(ExifError { path, source }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &ExifHeader {
        &self.header
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Entries sorted by tag name, unknown tags last by number.
    pub fn entries(&self) -> &[IfdEntry] {
        &self.entries
    }

    /// First entry with the given tag name.
    pub fn find(&self, name: &str) -> Option<&IfdEntry> {
        self.entries.iter().find(|e| e.name() == name)
    }

    /// Every entry as `Name=Value\n`.
    pub fn output(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry.output());
            out.push('\n');
        }
        out
    }

    pub fn diagnostics(&self) -> String {
        format!(
            "SOI[{}] APP1 Mark[{}] APP1 Size[{}] Read[{}] Name[{}] Order[{}] EXIF[{}]",
            self.header.soi,
            self.header.app1_marker,
            self.header.app1_size,
            self.materialized,
            self.path.display(),
            self.byte_order,
            self.header.exif,
        )
    }
}

fn decode<R: Read + 'static>(
    path: &Path,
    reader: R,
    chunk: usize,
    select: &mut dyn FnMut(&IfdEntry, &ByteCursor) -> bool,
) -> Result<ExifImage, DecodeError> {
    let mut cursor = ByteCursor::new(reader, chunk)?;
    let header = read_header(&mut cursor)?;

    let mark = cursor.seek(OFS_TIFF_HEADER)?.read_fixed_string(2)?;
    let byte_order = match mark.as_str() {
        "II" => ByteOrder::LittleEndian,
        "MM" => ByteOrder::BigEndian,
        _ => return Err(DecodeError::UnsupportedByteOrder(mark)),
    };
    cursor.set_byte_order(byte_order);

    if tracing::enabled!(Level::DEBUG) {
        debug!(
            "{}: SOI[{}] APP1 Mark[{}] APP1 Size[{}] Order[{byte_order}]",
            path.display(),
            header.soi,
            header.app1_marker,
            header.app1_size
        );
        if let Ok(dump) = cursor.hex_dump(0, 12, 2) {
            debug!("\n{dump}");
        }
    }

    let mut address = OFS_TIFF_HEADER + cursor.seek(OFS_MAIN_IFD)?.read_u32()? as usize;
    let mut walk = DirectoryWalk {
        select,
        entries: Vec::new(),
    };
    let mut visited = HashSet::new();
    let mut label = String::from("Main IFD");
    for count in 1.. {
        if !visited.insert(address) {
            return Err(DecodeError::DirectoryLoop { address });
        }
        walk.read_directory(address, &mut cursor, &label, 0)?;
        let next = cursor.read_u32()?;
        if next == 0 {
            break;
        }
        address = OFS_TIFF_HEADER + next as usize;
        label = format!("Dir{count} IFD");
    }

    let mut entries = walk.entries;
    entries.sort_by(compare_entries);
    if tracing::enabled!(Level::DEBUG) {
        for entry in &entries {
            debug!("{}", entry.output());
        }
    }

    Ok(ExifImage {
        path: path.to_path_buf(),
        header,
        byte_order,
        entries,
        materialized: cursor.materialized(),
    })
}

/// Validate the big-endian JPEG/APP1 fields in file order.
fn read_header(cursor: &mut ByteCursor) -> Result<ExifHeader, DecodeError> {
    let soi = to_hex(&cursor.seek(OFS_SOI)?.read_bytes(2)?, None);
    if soi != "FFD8" {
        return Err(DecodeError::HeaderMismatch {
            offset: OFS_SOI,
            field: "jpeg marker",
            expected: "FFD8",
            found: soi,
        });
    }
    let app1_marker = to_hex(&cursor.seek(OFS_APP1_MARKER)?.read_bytes(2)?, None);
    if app1_marker != "FFE1" {
        return Err(DecodeError::HeaderMismatch {
            offset: OFS_APP1_MARKER,
            field: "jpeg APP1 marker",
            expected: "FFE1",
            found: app1_marker,
        });
    }
    let app1_size = (cursor.seek(OFS_APP1_SIZE)?.read_u16()? as u32).saturating_sub(2);
    let tag = cursor.seek(OFS_EXIF_HEADER)?.read_bytes(6)?;
    if tag != EXIF_MARKER {
        return Err(DecodeError::HeaderMismatch {
            offset: OFS_EXIF_HEADER,
            field: "jpeg 'Exif' data marker",
            expected: "Exif\\x00\\x00",
            found: tag.escape_ascii().to_string(),
        });
    }
    Ok(ExifHeader {
        soi,
        app1_marker,
        app1_size,
        exif: true,
    })
}

/// Named tags by name, then unknown tags by number. The sort is stable so
/// equal keys keep discovery order.
fn compare_entries(a: &IfdEntry, b: &IfdEntry) -> Ordering {
    match (a.tag.is_known(), b.tag.is_known()) {
        (true, true) => a.name().cmp(b.name()),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.tag.number.cmp(&b.tag.number),
    }
}

struct DirectoryWalk<'a> {
    select: &'a mut dyn FnMut(&IfdEntry, &ByteCursor) -> bool,
    entries: Vec<IfdEntry>,
}

impl DirectoryWalk<'_> {
    /// Walk the directory at `address`. Leaves `cursor` on its next-IFD field.
    fn read_directory(
        &mut self,
        address: usize,
        cursor: &mut ByteCursor,
        label: &str,
        depth: usize,
    ) -> Result<(), DecodeError> {
        let count = cursor.seek(address)?.read_u16()?;
        if count == 0 || count > MAX_DIRECTORY_ENTRIES {
            return Err(DecodeError::CorruptDirectory { address, count });
        }

        for i in 1..=count {
            let mut entry = read_entry(cursor)?;

            if let Some(group) = entry.tag.sub_dir() {
                let sub_address = OFS_TIFF_HEADER + cursor.uint(&entry.raw) as usize;
                if depth + 1 > MAX_DEPTH {
                    return Err(DecodeError::DirectoryTooDeep {
                        address: sub_address,
                        depth: depth + 1,
                    });
                }
                debug!(
                    "IFD:[{i:02} of {count:02} :{depth}] {label} DIR[{}] ABS[0x{sub_address:x} ({sub_address})]",
                    entry.name()
                );
                let mut sub = cursor.with_tag_group(group);
                self.read_directory(sub_address, &mut sub, entry.name(), depth + 1)?;
                continue;
            }

            entry.value = decode_value(&entry, cursor)?;
            let mut at_entry = cursor.clone();
            at_entry.seek(entry.address)?;
            if (self.select)(&entry, &at_entry) {
                if tracing::enabled!(Level::DEBUG) {
                    let prefix = format!("[{i:02} of {count:02} :{depth}] {label} ");
                    debug!("{}", entry.diagnostics(&prefix));
                }
                self.entries.push(entry);
            }
        }
        Ok(())
    }
}

/// Read the fixed 12 bytes of an entry; the value is decoded separately.
fn read_entry(cursor: &mut ByteCursor) -> Result<IfdEntry, DecodeError> {
    let address = cursor.position();
    let number = cursor.read_u16()?;
    let format_id = cursor.read_u16()?;
    let item_count = cursor.read_u32()?;
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&cursor.read_bytes(4)?);

    let tag = TagRef::resolve(cursor.tag_group(), number);
    let format = match lookup_format(format_id) {
        Some(f) if f.kind != FormatKind::Undefined => f,
        _ => tag.fallback_format().unwrap_or_else(undefined_format),
    };
    Ok(IfdEntry {
        address,
        tag,
        format,
        item_count,
        byte_count: u64::from(item_count) * u64::from(format.width),
        raw,
        value: String::new(),
    })
}

fn decode_value(entry: &IfdEntry, cursor: &ByteCursor) -> Result<String, DecodeError> {
    let bytes = if entry.is_inline() {
        entry.raw[..entry.byte_count as usize].to_vec()
    } else {
        let offset = cursor.uint(&entry.raw) as usize;
        let len = usize::try_from(entry.byte_count).unwrap_or(usize::MAX);
        let mut value = cursor.clone();
        value.seek(OFS_TIFF_HEADER + offset)?.read_bytes(len)?
    };
    Ok(render_value(&bytes, entry.format, cursor.byte_order()))
}

fn render_value(bytes: &[u8], format: &Format, order: ByteOrder) -> String {
    if format.kind == FormatKind::Ascii {
        return zero_terminated(bytes);
    }
    bytes
        .chunks_exact(format.width as usize)
        .map(|item| match format.kind {
            FormatKind::Unsigned => order.uint(item).to_string(),
            FormatKind::Signed => order.int(item).to_string(),
            FormatKind::URational => {
                format!("{}/{}", order.uint(&item[..4]), order.uint(&item[4..]))
            }
            FormatKind::Rational => {
                format!("{}/{}", order.int(&item[..4]), order.int(&item[4..]))
            }
            FormatKind::Ascii | FormatKind::Undefined | FormatKind::Float => {
                format!("0x{}", to_hex(item, None))
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}
