use std::fmt;

/// Index into the section table.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct SectionIndex(pub u32);

/// Index into a string table.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct StringIndex(pub u32);

/// EI_CLASS. This sets the size of addresses and offsets for the rest of the file.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FileClass {
    ThirtyTwo,
    SixtyFour,

    /// Something other than 1 or 2. We treat these like 32-bit files.
    Unknown(u8),
}

impl FileClass {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => FileClass::ThirtyTwo,
            2 => FileClass::SixtyFour,
            _ => FileClass::Unknown(value),
        }
    }

    /// Number of bytes in an address or offset.
    pub fn register_width(self) -> u64 {
        match self {
            FileClass::SixtyFour => 8,
            _ => 4,
        }
    }

    pub fn is_64(self) -> bool {
        self == FileClass::SixtyFour
    }
}

impl fmt::Display for FileClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FileClass::ThirtyTwo => f.write_str("ELF32"),
            FileClass::SixtyFour => f.write_str("ELF64"),
            FileClass::Unknown(n) => write!(f, "unknown class {n}"),
        }
    }
}

/// EI_DATA. Applies to every multi-byte field after the identification bytes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Endianness {
    Little,
    Big,
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Endianness::Little => f.write_str("little endian"),
            Endianness::Big => f.write_str("big endian"),
        }
    }
}

/// A byte range that some structure in the file claims. These are collected during
/// the walk and handed to the layout analyzer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SegmentExtent {
    pub offset: u64,
    pub size: u64,
    pub label: String,
}

impl SegmentExtent {
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.size)
    }
}

/// Where some bytes live in the file, e.g. a section's contents.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FileRange {
    pub offset: u64,
    pub size: u64,
}

impl FileRange {
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.size)
    }
}
