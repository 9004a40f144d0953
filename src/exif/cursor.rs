//! Byte cursor over a lazily materialized stream.
//!
//! The underlying reader is forward-only, but an IFD walk jumps around: value
//! offsets point backwards and forwards, sub-directories live anywhere in the
//! APP1 segment. [`ByteCursor`] hides this by appending everything it reads to
//! a single backing buffer, growing it in fixed-size chunks only when a seek or
//! read lands past the bytes already materialized.
//!
//! Clones share that buffer (`Rc<RefCell<..>>`) but carry their own position,
//! byte order and tag group. Cloning is how the parser dereferences a value
//! offset or peeks at a sub-directory without disturbing the walk in progress.
//! A clone that grows the buffer grows it for everyone; that is safe because
//! clones are only ever used for nested reads on the same call stack.

use super::DecodeError;
use super::catalog::TagGroup;
use std::cell::RefCell;
use std::fmt;
use std::io::Read;
use std::rc::Rc;

/// Growth chunk used when opening image files.
pub const DEFAULT_CHUNK: usize = 1024;

/// Interpretation of multi-byte fields, fixed by the TIFF `II`/`MM` mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// `MM` (Motorola). Also the order of the JPEG header fields.
    #[default]
    BigEndian,
    /// `II` (Intel).
    LittleEndian,
}

impl ByteOrder {
    /// Decode up to 8 bytes as an unsigned integer.
    pub fn uint(self, bytes: &[u8]) -> u64 {
        let fold = |acc: u64, b: &u8| (acc << 8) | u64::from(*b);
        match self {
            ByteOrder::BigEndian => bytes.iter().fold(0, fold),
            ByteOrder::LittleEndian => bytes.iter().rev().fold(0, fold),
        }
    }

    /// Decode up to 8 bytes as a two's complement integer of that width.
    pub fn int(self, bytes: &[u8]) -> i64 {
        let raw = self.uint(bytes);
        let bits = (bytes.len() * 8) as u32;
        if bits == 0 || bits >= 64 {
            return raw as i64;
        }
        let shift = 64 - bits;
        ((raw << shift) as i64) >> shift
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteOrder::BigEndian => write!(f, "MM"),
            ByteOrder::LittleEndian => write!(f, "II"),
        }
    }
}

/// Append-only store shared by every clone of a cursor.
struct StreamBuffer {
    reader: Box<dyn Read>,
    data: Vec<u8>,
    chunk: usize,
}

impl StreamBuffer {
    /// Read at least `required` bytes, rounded up to whole chunks.
    fn grow(&mut self, required: usize, position: usize) -> Result<(), DecodeError> {
        let target = required
            .div_ceil(self.chunk)
            .max(1)
            .saturating_mul(self.chunk);
        let before = self.data.len();
        self.reader
            .by_ref()
            .take(target as u64)
            .read_to_end(&mut self.data)?;
        let available = self.data.len() - before;
        if available < required {
            return Err(DecodeError::TruncatedStream {
                position,
                required,
                available,
            });
        }
        Ok(())
    }
}

/// Positioned view over a shared, lazily grown byte buffer.
#[derive(Clone)]
pub struct ByteCursor {
    buffer: Rc<RefCell<StreamBuffer>>,
    position: usize,
    order: ByteOrder,
    group: TagGroup,
}

impl ByteCursor {
    /// Wrap a reader, materializing the first `chunk` bytes.
    pub fn new(reader: impl Read + 'static, chunk: usize) -> Result<Self, DecodeError> {
        let mut buffer = StreamBuffer {
            reader: Box::new(reader),
            data: Vec::new(),
            chunk: chunk.max(1),
        };
        buffer.grow(0, 0)?;
        Ok(Self {
            buffer: Rc::new(RefCell::new(buffer)),
            position: 0,
            order: ByteOrder::default(),
            group: TagGroup::Image,
        })
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    pub fn set_byte_order(&mut self, order: ByteOrder) {
        self.order = order;
    }

    /// Tag group used to resolve tag numbers read through this cursor.
    pub fn tag_group(&self) -> TagGroup {
        self.group
    }

    /// Clone scoped to another tag group (entering a sub-directory).
    pub fn with_tag_group(&self, group: TagGroup) -> Self {
        let mut clone = self.clone();
        clone.group = group;
        clone
    }

    /// Number of bytes pulled from the stream so far.
    pub fn materialized(&self) -> usize {
        self.buffer.borrow().data.len()
    }

    fn ensure(&self, end: usize) -> Result<(), DecodeError> {
        let mut buffer = self.buffer.borrow_mut();
        let len = buffer.data.len();
        if end <= len {
            return Ok(());
        }
        buffer.grow(end - len, self.position)
    }

    /// Move to an absolute offset. The byte at `pos` must exist.
    ///
    /// On failure the position is unchanged.
    pub fn seek(&mut self, pos: usize) -> Result<&mut Self, DecodeError> {
        self.ensure(pos.saturating_add(1))?;
        self.position = pos;
        Ok(self)
    }

    /// Read `n` bytes and advance past them.
    ///
    /// A read that cannot be satisfied consumes whatever was available and
    /// fails; it never returns short data.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, DecodeError> {
        let Some(end) = self.position.checked_add(n) else {
            return Err(DecodeError::TruncatedStream {
                position: self.position,
                required: n,
                available: self.materialized().saturating_sub(self.position),
            });
        };
        if let Err(err) = self.ensure(end) {
            self.position = self.materialized().clamp(self.position, end);
            return Err(err);
        }
        let bytes = self.buffer.borrow().data[self.position..end].to_vec();
        self.position = end;
        Ok(bytes)
    }

    /// Read a 1/2/4/8 byte unsigned field in the current byte order.
    pub fn read_uint(&mut self, width: usize) -> Result<u64, DecodeError> {
        let bytes = self.read_bytes(width)?;
        Ok(self.order.uint(&bytes))
    }

    /// Read a 1/2/4/8 byte signed field in the current byte order.
    pub fn read_int(&mut self, width: usize) -> Result<i64, DecodeError> {
        let bytes = self.read_bytes(width)?;
        Ok(self.order.int(&bytes))
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(self.read_uint(2)? as u16)
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(self.read_uint(4)? as u32)
    }

    /// Read at most `max` bytes, stopping after the first zero byte.
    ///
    /// Only used for the fixed-width header markers. Tag values go through
    /// [`zero_terminated`] instead.
    pub fn read_fixed_string(&mut self, max: usize) -> Result<String, DecodeError> {
        let mut bytes = Vec::with_capacity(max);
        for _ in 0..max {
            let b = self.read_bytes(1)?[0];
            if b == 0 {
                break;
            }
            bytes.push(b);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Interpret raw bytes in this cursor's byte order.
    pub fn uint(&self, bytes: &[u8]) -> u64 {
        self.order.uint(bytes)
    }

    pub fn int(&self, bytes: &[u8]) -> i64 {
        self.order.int(bytes)
    }

    /// Diagnostic dump of `lines` rows of `count` bytes starting at `start`.
    ///
    /// ```text
    /// 0000: FF D8 FF E1 8E 1F 065496 065505 036383
    ///     : .  .  .  .  .  .  FFD8   FFE1   8E1F
    /// ```
    ///
    /// Reads through a clone, so the cursor itself does not move.
    pub fn hex_dump(&self, start: usize, count: usize, lines: usize) -> Result<String, DecodeError> {
        let mut clone = self.clone();
        clone.seek(start)?;
        let mut out = String::new();
        for _ in 0..lines {
            let row_start = clone.position();
            let row = clone.read_bytes(count)?;
            let words: Vec<&[u8]> = row.chunks_exact(2).collect();

            out.push_str(&format!("{:04}: ", row_start));
            for b in &row {
                out.push_str(&format!("{:02X} ", b));
            }
            for w in &words {
                out.push_str(&format!("{:06} ", clone.uint(w)));
            }
            out.push('\n');

            out.push_str("    : ");
            for &b in &row {
                let c = if b.is_ascii_graphic() { b as char } else { '.' };
                out.push(c);
                out.push_str("  ");
            }
            for w in &words {
                out.push_str(&to_hex(w, None));
                out.push_str("   ");
            }
            out.push('\n');
        }
        Ok(out)
    }
}

impl fmt::Debug for ByteCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteCursor")
            .field("position", &self.position)
            .field("order", &self.order)
            .field("group", &self.group)
            .field("materialized", &self.materialized())
            .finish()
    }
}

/// Uppercase hex, optionally with a delimiter between bytes.
pub fn to_hex(bytes: &[u8], delimiter: Option<char>) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0
            && let Some(d) = delimiter
        {
            out.push(d);
        }
        out.push_str(&format!("{:02X}", b));
    }
    out
}

/// Bytes up to (not including) the first zero, lossily decoded.
pub fn zero_terminated(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
