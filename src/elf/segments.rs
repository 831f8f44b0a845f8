//! Used by the run-time loader. Also see sections.
use super::{ElfHeader, Reader, Stream, capped_count};
use crate::error::Result;
use crate::output::Output;
use std::fmt;
use tracing::debug;

const EXECUTE_FLAG: u32 = 0x1;
const WRITE_FLAG: u32 = 0x2;
const READ_FLAG: u32 = 0x4;
const MASKOS_FLAG: u32 = 0x0ff00000;
const MASKPROC_FLAG: u32 = 0xf0000000;
const RESERVED_FLAGS: u32 = !(EXECUTE_FLAG | WRITE_FLAG | READ_FLAG | MASKOS_FLAG | MASKPROC_FLAG);

/// Describes a segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgramHeader {
    // Elf64_Phdr or Elf32_Phdr, see https://llvm.org/doxygen/BinaryFormat_2ELF_8h_source.html
    /// Offset of the program header itself.
    pub header_offset: u64,

    pub stype: SegmentType,

    /// Offset to the first byte of the segment.
    pub offset: u64,

    /// Virtual address of the first byte in the segment.
    pub vaddr: u64,

    /// Physical address of the first byte in the segment.
    pub paddr: u64,

    /// Number of bytes in the segment in the file. May be smaller than mem_size, e.g. for
    /// bss.
    pub file_size: u64,

    /// Number of bytes in the segment in memory.
    pub mem_size: u64,

    /// Read/Write/Execute flags.
    pub flags: u32,

    pub align: u64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SegmentType {
    /// Not to be used: either it's a segment that is intended to be not used or one
    /// that is not recognized.
    Null,

    /// A loadable segment, described by p_filesz and p_memsz.
    Load,

    /// Specifies dynamic linking information.
    Dynamic,

    /// Location and size of a null-terminated path name to invoke as an interpreter.
    Interpreter,

    /// The location and size of auxiliary information.
    Note,

    /// Reserved but has unspecified semantics.
    Shlib,

    /// The location and size of the program header table itself.
    Phdr,

    // The Thread-Local Storage template.
    Tls,

    /// Points at the .eh_frame_hdr section.
    GnuEhFrame,

    /// Flags say whether the stack should be executable.
    GnuStack,

    /// Read only after relocation.
    GnuRelro,

    GnuProperty,

    /// Reserved for OS-specific semantics.
    Os(u32),

    /// Reserved for processor-specific semantics.
    Processor(u32),

    Unknown(u32),
}

impl SegmentType {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => SegmentType::Null,
            1 => SegmentType::Load,
            2 => SegmentType::Dynamic,
            3 => SegmentType::Interpreter,
            4 => SegmentType::Note,
            5 => SegmentType::Shlib,
            6 => SegmentType::Phdr,
            7 => SegmentType::Tls,
            0x6474e550 => SegmentType::GnuEhFrame,
            0x6474e551 => SegmentType::GnuStack,
            0x6474e552 => SegmentType::GnuRelro,
            0x6474e553 => SegmentType::GnuProperty,
            0x60000000..=0x6fffffff => SegmentType::Os(value),
            0x70000000..=0x7fffffff => SegmentType::Processor(value),
            _ => SegmentType::Unknown(value),
        }
    }
}

impl fmt::Display for SegmentType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SegmentType::Null => f.write_str("NULL"),
            SegmentType::Load => f.write_str("LOAD"),
            SegmentType::Dynamic => f.write_str("DYNAMIC"),
            SegmentType::Interpreter => f.write_str("INTERP"),
            SegmentType::Note => f.write_str("NOTE"),
            SegmentType::Shlib => f.write_str("SHLIB"),
            SegmentType::Phdr => f.write_str("PHDR"),
            SegmentType::Tls => f.write_str("TLS"),
            SegmentType::GnuEhFrame => f.write_str("GNU_EH_FRAME"),
            SegmentType::GnuStack => f.write_str("GNU_STACK"),
            SegmentType::GnuRelro => f.write_str("GNU_RELRO"),
            SegmentType::GnuProperty => f.write_str("GNU_PROPERTY"),
            SegmentType::Os(n) => write!(f, "LOOS+{:#x}", n - 0x60000000),
            SegmentType::Processor(n) => write!(f, "LOPROC+{:#x}", n - 0x70000000),
            SegmentType::Unknown(n) => write!(f, "{n:#x}"),
        }
    }
}

impl ProgramHeader {
    /// Size of one entry for the class.
    pub fn layout_size(reader: &Reader) -> u64 {
        if reader.sixty_four_bit() { 56 } else { 32 }
    }

    pub fn new(reader: &Reader, offset: u64, out: &mut Output) -> Result<Self> {
        // Field sizes and order differ between 32-bit and 64-bit ELF files,
        // see https://llvm.org/doxygen/BinaryFormat_2ELF_8h_source.html.
        let w = reader.register_width();
        let mut s = Stream::new(reader, offset);
        let p_type = s.read_word()?;
        let stype = SegmentType::from_u32(p_type);
        out.named(offset, 4, "type", p_type as u64, stype.to_string());

        let mut p_flags = 0;
        if reader.sixty_four_bit() {
            p_flags = s.read_word()?;
            out.named(s.offset - 4, 4, "flags", p_flags as u64, ProgramHeader::flags(p_flags));
        }
        let p_offset = s.read_offset()?;
        out.unsigned(s.offset - w, w, "offset", p_offset);
        let p_vaddr = s.read_addr()?;
        out.unsigned(s.offset - w, w, "vaddr", p_vaddr);
        let p_paddr = s.read_addr()?;
        out.unsigned(s.offset - w, w, "paddr", p_paddr);
        let p_filesz = s.read_xword_or_word()?;
        out.unsigned(s.offset - w, w, "filesz", p_filesz);
        let p_memsz = s.read_xword_or_word()?;
        out.unsigned(s.offset - w, w, "memsz", p_memsz);
        if !reader.sixty_four_bit() {
            p_flags = s.read_word()?;
            out.named(s.offset - 4, 4, "flags", p_flags as u64, ProgramHeader::flags(p_flags));
        }
        let p_align = s.read_xword_or_word()?;
        out.unsigned(s.offset - w, w, "align", p_align);

        Ok(ProgramHeader {
            header_offset: offset,
            stype,
            flags: p_flags,
            offset: p_offset,
            vaddr: p_vaddr,
            paddr: p_paddr,
            file_size: p_filesz,
            mem_size: p_memsz,
            align: p_align,
        })
    }

    /// E.g. "r-x" or "rw- os".
    pub fn flags(flags: u32) -> String {
        let mut result = String::new();
        result.push(if flags & READ_FLAG != 0 { 'r' } else { '-' });
        result.push(if flags & WRITE_FLAG != 0 { 'w' } else { '-' });
        result.push(if flags & EXECUTE_FLAG != 0 { 'x' } else { '-' });
        if flags & RESERVED_FLAGS != 0 {
            result.push_str(" reserved");
        }
        if flags & MASKOS_FLAG != 0 {
            result.push_str(" os");
        }
        if flags & MASKPROC_FLAG != 0 {
            result.push_str(" proc");
        }
        result
    }
}

/// Reads the program header table, reporting every entry as a record and the extent of
/// every segment that has bytes in the file.
pub fn walk_segments(
    reader: &Reader,
    header: &ElfHeader,
    max_entries: usize,
    out: &mut Output,
) -> Vec<ProgramHeader> {
    let mut segments = Vec::new();
    if header.num_ph_entries == 0 {
        return segments;
    }

    let layout = ProgramHeader::layout_size(reader);
    let mut stride = header.ph_entry_size as u64;
    if stride < layout {
        out.warn(
            header.ph_offset,
            header.ph_table_size(),
            format!("phentsize is {stride} but a {} program header is {layout} bytes", reader.class),
        );
        stride = layout;
    }

    let count = capped_count(
        reader,
        header.ph_offset,
        header.num_ph_entries as u64,
        stride,
        max_entries,
        "program header table",
        out,
    );
    for i in 0..count {
        let offset = header.ph_offset + i * stride;
        let record = out.open(offset, "program header", format!("segment {i}"));
        let result = ProgramHeader::new(reader, offset, out);
        out.close(record, offset + stride);

        match result {
            Ok(ph) => {
                out.summarize(record, format!("segment {i} ({})", ph.stype));
                if ph.file_size != 0 {
                    out.extent(ph.offset, ph.file_size, format!("segment {i} ({})", ph.stype));
                    if !reader.contains(ph.offset, ph.file_size) {
                        out.warn(
                            offset,
                            stride,
                            format!(
                                "segment {i} claims {:#x} bytes at {:#x} which runs past the end of the file",
                                ph.file_size, ph.offset
                            ),
                        );
                    }
                }
                segments.push(ph);
            }
            Err(err) => {
                out.error(offset, stride, format!("bad program header: {err}"));
                break;
            }
        }
    }
    debug!(count = segments.len(), "walked program headers");
    segments
}
