use thiserror::Error;

/// Things that stop a decode (or the part of one that hit them).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ElfError {
    /// Bad magic or a buffer too small to hold a header. This is the only error that
    /// aborts before any output is produced.
    #[error("not an ELF file: {0}")]
    NotThisFormat(String),

    #[error("{size} bytes at offset {offset:#x} run past the end of the {len} byte buffer")]
    OutOfRange { offset: u64, size: u64, len: u64 },

    /// A file supplied value doesn't fit into a host integer.
    #[error("value {0:#x} overflows the host's address space")]
    Overflow(u64),

    #[error("LEB128 value at offset {0:#x} has too many continuation bytes")]
    Leb128Overflow(u64),

    /// A record that can't be right, e.g. a CIE that is too small.
    #[error("{0}")]
    Structural(String),
}

pub type Result<T> = std::result::Result<T, ElfError>;

pub fn require(predicate: bool, err: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        Err(ElfError::Structural(err.to_string()))
    }
}
