//! Generic ELF file support: the header, the two header tables, and the contents of the
//! sections that have a fixed structure (symbols, dynamic entries, and strings).
//! Quick ELF reference: https://gist.github.com/x0nu11byt3/bcb35c3de461e5fb66173071a2379779
//!
//! ELF files start with an ELF header which includes:
//! * A magic number to identify the file as an ELF file.
//! * The class (32 or 64-bit) and byte order used by everything after the header's
//!   identification bytes.
//! * The offset to and number of program headers.
//! * The offset to and number of section headers.
//!
//! Program headers identify segments. Segments are used by the OS to load an exe into
//! memory. A program header has type, vaddr, offset, etc.
//!
//! Section headers identify sections. Sections are used for static linking and don't
//! appear in core files. Section headers have name, type, vaddr, offset, size, etc.
//! There are a lot of types including for the symbol table, string table, etc.
//!
//! Nothing is trusted: every count and offset in here comes from the file so every read
//! is bounds checked and every table walk is capped.
pub mod dynamic;
pub mod header;
pub mod io;
pub mod primitives;
pub mod sections;
pub mod segments;
pub mod strings;
pub mod symbols;

#[cfg(test)]
pub mod synth;

pub use dynamic::*;
pub use header::*;
pub use io::*;
pub use primitives::*;
pub use sections::*;
pub use segments::*;
pub use strings::*;
pub use symbols::*;
