use crate::elf::{Endianness, FileClass};
use crate::error::{ElfError, Result};
use crate::output::Output;

/// Endian and width aware access to the bytes of an ELF file. All multi-byte reads go
/// through here so that bounds checking happens in exactly one place.
pub struct Reader<'a> {
    pub class: FileClass,
    pub endian: Endianness,
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8], class: FileClass, endian: Endianness) -> Self {
        Reader {
            class,
            endian,
            bytes,
        }
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn sixty_four_bit(&self) -> bool {
        self.class.is_64()
    }

    pub fn register_width(&self) -> u64 {
        self.class.register_width()
    }

    /// True if [offset, offset + size) lies within the buffer.
    pub fn contains(&self, offset: u64, size: u64) -> bool {
        offset
            .checked_add(size)
            .is_some_and(|end| end <= self.len())
    }

    pub fn slice(&self, offset: u64, size: u64) -> Result<&'a [u8]> {
        if !self.contains(offset, size) {
            return Err(ElfError::OutOfRange {
                offset,
                size,
                len: self.len(),
            });
        }
        let start = to_usize(offset)?;
        let end = to_usize(offset + size)?;
        Ok(&self.bytes[start..end])
    }

    pub fn read_byte(&self, offset: u64) -> Result<u8> {
        Ok(self.slice(offset, 1)?[0])
    }

    pub fn read_half(&self, offset: u64) -> Result<u16> {
        Ok(self.read_uint(offset, 2)? as u16)
    }

    pub fn read_word(&self, offset: u64) -> Result<u32> {
        Ok(self.read_uint(offset, 4)? as u32)
    }

    pub fn read_xword(&self, offset: u64) -> Result<u64> {
        self.read_uint(offset, 8)
    }

    /// Reads an unsigned 1, 2, 4, or 8 byte integer.
    pub fn read_uint(&self, offset: u64, width: u64) -> Result<u64> {
        debug_assert!(matches!(width, 1 | 2 | 4 | 8));
        let slice = self.slice(offset, width)?;
        let value = match self.endian {
            Endianness::Little => slice
                .iter()
                .rev()
                .fold(0u64, |acc, &b| (acc << 8) | b as u64),
            Endianness::Big => slice.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64),
        };
        Ok(value)
    }

    /// Reads a signed 1, 2, 4, or 8 byte integer.
    pub fn read_int(&self, offset: u64, width: u64) -> Result<i64> {
        let value = self.read_uint(offset, width)?;
        let unused = 64 - 8 * width as u32;
        Ok(((value << unused) as i64) >> unused)
    }

    /// Reads a NUL terminated string that must end before limit. If there is no
    /// terminator the string runs to limit.
    pub fn read_cstr(&self, offset: u64, limit: u64) -> Result<RawString> {
        let limit = limit.min(self.len());
        if offset >= limit {
            return Err(ElfError::OutOfRange {
                offset,
                size: 1,
                len: limit,
            });
        }
        let bytes = self.slice(offset, limit - offset)?;
        let (bytes, terminated) = match bytes.iter().position(|&b| b == 0) {
            Some(n) => (&bytes[..n], true),
            None => (bytes, false),
        };
        Ok(RawString {
            value: String::from_utf8_lossy(bytes).into_owned(),
            len: bytes.len() as u64,
            terminated,
        })
    }
}

/// A string read from the file. Invalid UTF-8 is replaced so value.len() may not match
/// the number of bytes in the file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawString {
    pub value: String,

    /// Bytes in the file, not counting the terminator.
    pub len: u64,

    pub terminated: bool,
}

impl RawString {
    /// Bytes in the file including the terminator (if present).
    pub fn consumed(&self) -> u64 {
        self.len + self.terminated as u64
    }
}

/// Widens a value from the file into a host size, failing instead of truncating.
pub fn to_usize(value: u64) -> Result<usize> {
    usize::try_from(value).map_err(|_| ElfError::Overflow(value))
}

/// Cursor over a Reader for fixed layout records.
pub struct Stream<'r, 'a> {
    pub reader: &'r Reader<'a>,
    pub offset: u64,
}

impl<'r, 'a> Stream<'r, 'a> {
    pub fn new(reader: &'r Reader<'a>, offset: u64) -> Self {
        Stream { reader, offset }
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        let byte = self.reader.read_byte(self.offset)?;
        self.offset += 1;
        Ok(byte)
    }

    pub fn read_half(&mut self) -> Result<u16> {
        let half = self.reader.read_half(self.offset)?;
        self.offset += 2;
        Ok(half)
    }

    pub fn read_word(&mut self) -> Result<u32> {
        let word = self.reader.read_word(self.offset)?;
        self.offset += 4;
        Ok(word)
    }

    pub fn read_xword(&mut self) -> Result<u64> {
        let xword = self.reader.read_xword(self.offset)?;
        self.offset += 8;
        Ok(xword)
    }

    pub fn read_uint(&mut self, width: u64) -> Result<u64> {
        let value = self.reader.read_uint(self.offset, width)?;
        self.offset += width;
        Ok(value)
    }

    pub fn read_int(&mut self, width: u64) -> Result<i64> {
        let value = self.reader.read_int(self.offset, width)?;
        self.offset += width;
        Ok(value)
    }

    pub fn read_addr(&mut self) -> Result<u64> {
        let width = self.reader.register_width();
        self.read_uint(width)
    }

    /// Same as read_addr: ELF offsets and addresses have the same width.
    pub fn read_offset(&mut self) -> Result<u64> {
        self.read_addr()
    }

    /// Reads a u32 in 32-bit files and a u64 in 64-bit files (e.g. sh_size).
    pub fn read_xword_or_word(&mut self) -> Result<u64> {
        self.read_addr()
    }

    /// Read a NUL terminated string that must end before limit.
    pub fn read_string(&mut self, limit: u64) -> Result<String> {
        let s = self.reader.read_cstr(self.offset, limit)?;
        if !s.terminated {
            return Err(ElfError::Structural(format!(
                "string at {:#x} is missing its terminator",
                self.offset
            )));
        }
        self.offset += s.consumed();
        Ok(s.value)
    }
}

/// Number of fixed size entries to read from a table, bounding the file's declared count
/// by the bytes that remain and by max_entries. Anything short of the declared count is
/// reported against the table.
pub fn capped_count(
    reader: &Reader,
    offset: u64,
    declared: u64,
    entry_size: u64,
    max_entries: usize,
    what: &str,
    out: &mut Output,
) -> u64 {
    if declared == 0 {
        return 0;
    }
    let remaining = reader.len().saturating_sub(offset);
    let fits = if entry_size == 0 { 0 } else { remaining / entry_size };
    let count = declared.min(fits).min(max_entries as u64);
    if count < declared {
        let reason = if count == max_entries as u64 {
            format!("limited to {max_entries} entries")
        } else {
            format!("only {fits} fit in the file")
        };
        out.warn(
            offset,
            remaining,
            format!("{what} declares {declared} entries but {reason}"),
        );
    }
    count
}
