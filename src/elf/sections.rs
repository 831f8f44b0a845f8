//! Used by the linker and debugger. Also see segments.
use super::dynamic::{DynamicEntry, walk_dynamic};
use super::strings::{StringEntry, scan_strings};
use super::symbols::{SymbolTable, walk_symbols};
use super::{ElfHeader, Endianness, FileRange, Reader, SectionIndex, Stream, StringIndex, capped_count};
use crate::dwarf::{self, EhFrame, EhFrameHdr};
use crate::error::{ElfError, Result};
use crate::output::{Output, Value};
use std::fmt;
use tracing::{debug, trace};

const WRITE_FLAG: u64 = 1 << 0; // Writable
const ALLOC_FLAG: u64 = 1 << 1; // Occupies memory during execution
const EXECINSTR_FLAG: u64 = 1 << 2; // Executable
const MERGE_FLAG: u64 = 1 << 4; // Might be merged
const STRINGS_FLAG: u64 = 1 << 5; // Contains nul-terminated strings
const INFO_LINK_FLAG: u64 = 1 << 6; // `sh_info' contains SHT index
const LINK_ORDER_FLAG: u64 = 1 << 7; // Preserve order after combining
const OS_NONCONFORMING_FLAG: u64 = 1 << 8; // Non-standard OS specific handling required
const GROUP_FLAG: u64 = 1 << 9; // Section is member of a group.
const TLS_FLAG: u64 = 1 << 10; // Section hold thread-local data.
const COMPRESSED_FLAG: u64 = 1 << 11; // Section with compressed data.
const MASKOS_FLAG: u64 = 0x0ff00000; // OS-specific.
const MASKPROC_FLAG: u64 = 0xf0000000; // Processor-specific

/// Describes a section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionHeader {
    // Elf32_Shdr or Elf64_Shdr, see https://gist.github.com/x0nu11byt3/bcb35c3de461e5fb66173071a2379779
    pub index: SectionIndex,

    /// Offset of the section header itself.
    pub header_offset: u64,

    /// Index into the section name string table. Zero means no name.
    pub name_index: StringIndex,

    /// Empty if the name couldn't be found.
    pub name: String,

    pub stype: SectionType,

    /// Write, alloc, and/or exec. Only the low 32 bits are read, even for ELF64.
    pub flags: u64,

    pub addr: u64,
    pub offset: u64,
    pub size: u64,

    /// Link to another section with related information, usually a string
    /// or symbol table.
    pub link: u32,

    /// Additional section info.
    pub info: u32,

    /// Section alignment.
    pub align: u64,

    /// Set if the section holds a table of entries.
    pub entry_size: u64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SectionType {
    /// Dynamic linking information.
    Dynamic,

    // Dynamic linker symbol table.
    DynamicSymbolTable,

    /// Array of pointers to termination functions.
    FiniArray,

    /// Section group.
    Group,

    /// GNU style hash table.
    Hash,

    /// Array of pointers to initialization functions.
    InitArray,

    /// Uninitialized data.
    NoBits,

    /// Arbitrary metadata.
    Note,

    /// Not to be used.
    Null,

    /// Array of pointers to functions to be called before the regular
    /// initialization functions.
    PreinitArray,

    /// CPU instructions or constant data.
    ProgBits,

    /// Relocation entries with addends.
    RelocationsWith,

    /// Relocation entries without addends.
    RelocationsWithout,

    /// Reserved with unspecified semantics.
    Shlib,

    /// Strings for use by the linker and debugger.
    StringTable,

    /// Symbol hash table.
    SymbolHashTable,

    /// Debugging info.
    SymbolTable,

    /// Extended section indexes for a symbol table.
    SymbolTableIndexes,

    /// GNU symbol versions that are provided.
    VerDef,

    /// GNU symbol versions that are required.
    VerNeed,

    /// GNU symbol version table.
    VerSym,

    Os(u32),
    Processor(u32),
    User(u32),
    Unknown(u32),
}

impl SectionType {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0x6 => SectionType::Dynamic, // see https://android.googlesource.com/platform/art/+/e34fa1d/runtime/elf.h
            0xb => SectionType::DynamicSymbolTable,
            0xf => SectionType::FiniArray,
            0x11 => SectionType::Group,
            0x5 => SectionType::SymbolHashTable,
            0xe => SectionType::InitArray,
            0x8 => SectionType::NoBits,
            0x7 => SectionType::Note,
            0x0 => SectionType::Null,
            0x10 => SectionType::PreinitArray,
            0x1 => SectionType::ProgBits,
            0x9 => SectionType::RelocationsWithout,
            0x4 => SectionType::RelocationsWith,
            0xa => SectionType::Shlib,
            0x3 => SectionType::StringTable,
            0x2 => SectionType::SymbolTable,
            0x12 => SectionType::SymbolTableIndexes,
            0x6ffffff6 => SectionType::Hash,
            0x6ffffffd => SectionType::VerDef,
            0x6ffffffe => SectionType::VerNeed,
            0x6fffffff => SectionType::VerSym,
            0x60000000..=0x6fffffff => SectionType::Os(value),
            0x70000000..=0x7fffffff => SectionType::Processor(value),
            0x80000000..=0xffffffff => SectionType::User(value),
            _ => SectionType::Unknown(value),
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            SectionType::Dynamic => "DYNAMIC",
            SectionType::DynamicSymbolTable => "DYNSYM",
            SectionType::FiniArray => "FINI_ARRAY",
            SectionType::Group => "GROUP",
            SectionType::Hash => "GNU_HASH",
            SectionType::InitArray => "INIT_ARRAY",
            SectionType::NoBits => "NOBITS",
            SectionType::Note => "NOTE",
            SectionType::Null => "NULL",
            SectionType::PreinitArray => "PREINIT_ARRAY",
            SectionType::ProgBits => "PROGBITS",
            SectionType::RelocationsWith => "RELA",
            SectionType::RelocationsWithout => "REL",
            SectionType::Shlib => "SHLIB",
            SectionType::StringTable => "STRTAB",
            SectionType::SymbolHashTable => "HASH",
            SectionType::SymbolTable => "SYMTAB",
            SectionType::SymbolTableIndexes => "SYMTAB_SHNDX",
            SectionType::VerDef => "VERDEF",
            SectionType::VerNeed => "VERNEED",
            SectionType::VerSym => "VERSYM",
            SectionType::Os(n) => return write!(f, "LOOS+{:#x}", n - 0x60000000),
            SectionType::Processor(n) => return write!(f, "LOPROC+{:#x}", n - 0x70000000),
            SectionType::User(n) => return write!(f, "LOUSER+{:#x}", n - 0x80000000),
            SectionType::Unknown(n) => return write!(f, "{n:#x}"),
        };
        f.write_str(name)
    }
}

/// How a section's contents get decoded. Resolved once per section.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SectionKind {
    EhFrame,
    EhFrameHdr,
    Dynamic,
    Symbols { dynamic: bool },
    Strings,

    /// Some other table of fixed size entries. These are located but not interpreted.
    Entries { entry_size: u64 },

    /// No bytes in the file.
    NoBits,

    Opaque,
}

impl SectionKind {
    /// The unwind sections are found by name: their type is just PROGBITS.
    pub fn resolve(name: &str, stype: SectionType, entry_size: u64) -> Self {
        match (name, stype) {
            (".eh_frame", _) => SectionKind::EhFrame,
            (".eh_frame_hdr", _) => SectionKind::EhFrameHdr,
            (_, SectionType::Dynamic) => SectionKind::Dynamic,
            (_, SectionType::SymbolTable) => SectionKind::Symbols { dynamic: false },
            (_, SectionType::DynamicSymbolTable) => SectionKind::Symbols { dynamic: true },
            (_, SectionType::StringTable) => SectionKind::Strings,
            (_, SectionType::NoBits) => SectionKind::NoBits,
            _ if entry_size != 0 => SectionKind::Entries { entry_size },
            _ => SectionKind::Opaque,
        }
    }
}

impl SectionHeader {
    pub fn flags(flags: u64) -> String {
        let mut result = Vec::new();
        if flags & WRITE_FLAG != 0 {
            result.push("WRITE");
        }
        if flags & ALLOC_FLAG != 0 {
            result.push("ALLOC");
        }
        if flags & EXECINSTR_FLAG != 0 {
            result.push("EXEC");
        }
        if flags & MERGE_FLAG != 0 {
            result.push("MERGE");
        }
        if flags & STRINGS_FLAG != 0 {
            result.push("STRINGS");
        }
        if flags & INFO_LINK_FLAG != 0 {
            result.push("INFO");
        }
        if flags & LINK_ORDER_FLAG != 0 {
            result.push("LINK");
        }
        if flags & OS_NONCONFORMING_FLAG != 0 {
            result.push("OS_NONCONFORMING");
        }
        if flags & GROUP_FLAG != 0 {
            result.push("GROUP");
        }
        if flags & TLS_FLAG != 0 {
            result.push("TLS");
        }
        if flags & COMPRESSED_FLAG != 0 {
            result.push("COMPRESSED");
        }
        if flags & MASKOS_FLAG != 0 {
            result.push("MASKOS");
        }
        if flags & MASKPROC_FLAG != 0 {
            result.push("MASKPROC");
        }
        if result.is_empty() {
            result.push("none");
        }
        result.join(" ")
    }

    pub fn kind(&self) -> SectionKind {
        SectionKind::resolve(&self.name, self.stype, self.entry_size)
    }

    /// Size of one entry for the class.
    pub fn layout_size(reader: &Reader) -> u64 {
        if reader.sixty_four_bit() { 64 } else { 40 }
    }

    pub fn new(reader: &Reader, table: &SectionTable, index: u32, out: &mut Output) -> Result<Self> {
        let header_offset = table.entry(index);
        let w = reader.register_width();
        let mut s = Stream::new(reader, header_offset);

        let name_index = StringIndex(s.read_word()?);
        let name = table.name(reader, name_index).unwrap_or_default();
        out.named(header_offset, 4, "name", name_index.0 as u64, name.clone());

        let raw_type = s.read_word()?;
        let stype = SectionType::from_u32(raw_type);
        out.named(s.offset - 4, 4, "type", raw_type as u64, stype.to_string());

        // ELF64 sh_flags is an xword but only the low word is meaningful, so the padding
        // comes after the flags for little endian and before them for big endian.
        let flags = match (reader.sixty_four_bit(), reader.endian) {
            (false, _) => read_flags(&mut s, out)?,
            (true, Endianness::Little) => {
                let flags = read_flags(&mut s, out)?;
                skip_padding(&mut s, out);
                flags
            }
            (true, Endianness::Big) => {
                skip_padding(&mut s, out);
                read_flags(&mut s, out)?
            }
        };

        let addr = s.read_addr()?;
        out.unsigned(s.offset - w, w, "addr", addr);
        let offset = s.read_offset()?;
        out.unsigned(s.offset - w, w, "offset", offset);
        let size = s.read_xword_or_word()?;
        out.unsigned(s.offset - w, w, "size", size);
        let link = s.read_word()?;
        out.unsigned(s.offset - 4, 4, "link", link as u64);
        let info = s.read_word()?;
        out.unsigned(s.offset - 4, 4, "info", info as u64);
        let align = s.read_xword_or_word()?;
        out.unsigned(s.offset - w, w, "addralign", align);
        let entry_size = s.read_xword_or_word()?;
        out.unsigned(s.offset - w, w, "entsize", entry_size);

        Ok(SectionHeader {
            index: SectionIndex(index),
            header_offset,
            name_index,
            name,
            stype,
            flags,
            addr,
            offset,
            size,
            link,
            info,
            align,
            entry_size,
        })
    }
}

fn read_flags(s: &mut Stream, out: &mut Output) -> Result<u64> {
    let flags = s.read_word()? as u64;
    out.named(s.offset - 4, 4, "flags", flags, SectionHeader::flags(flags));
    Ok(flags)
}

fn skip_padding(s: &mut Stream, out: &mut Output) {
    out.field(s.offset, 4, "flags padding", Value::Opaque);
    s.offset += 4;
}

/// Where the section header table is and how to get at names. Nothing here is cached:
/// every lookup goes back to the bytes.
pub struct SectionTable {
    pub offset: u64,
    pub stride: u64,
    pub count: u64,
    pub names_index: u16,
}

impl SectionTable {
    pub fn new(header: &ElfHeader, stride: u64, count: u64) -> Self {
        SectionTable {
            offset: header.section_offset,
            stride,
            count,
            names_index: header.string_table_index,
        }
    }

    pub fn entry(&self, index: u32) -> u64 {
        self.offset + index as u64 * self.stride
    }

    /// sh_offset and sh_size for a section. Fails unless the section is in the table and
    /// its contents are within the buffer.
    pub fn location(&self, reader: &Reader, index: u32) -> Result<FileRange> {
        if index as u64 >= self.count {
            return Err(ElfError::Structural(format!(
                "section {index} is past the end of the {} entry section header table",
                self.count
            )));
        }
        let base = self.entry(index);
        let w = reader.register_width();
        // name, type, flags, and addr come first
        let at = base + 8 + 2 * w;
        let offset = reader.read_uint(at, w)?;
        let size = reader.read_uint(at + w, w)?;
        if !reader.contains(offset, size) {
            return Err(ElfError::OutOfRange {
                offset,
                size,
                len: reader.len(),
            });
        }
        Ok(FileRange { offset, size })
    }

    /// Resolves a name using the section named by shstrndx.
    pub fn name(&self, reader: &Reader, name: StringIndex) -> Option<String> {
        let index = self.names_index as u32;
        if index == 0 || index as u64 >= self.count {
            return None;
        }
        let names = self.location(reader, index).ok()?;
        let start = names.offset.checked_add(name.0 as u64)?;
        if name.0 as u64 >= names.size {
            return None;
        }
        reader.read_cstr(start, names.end()).ok().map(|s| s.value)
    }

    /// Name of the section at index.
    pub fn section_name(&self, reader: &Reader, index: u32) -> Option<String> {
        if index as u64 >= self.count {
            return None;
        }
        let name = reader.read_word(self.entry(index)).ok()?;
        self.name(reader, StringIndex(name))
    }

    /// Finds the contents of the first section with the given name.
    pub fn find(&self, reader: &Reader, wanted: &str) -> Option<FileRange> {
        (0..self.count as u32)
            .find(|&i| self.section_name(reader, i).is_some_and(|n| n == wanted))
            .and_then(|i| self.location(reader, i).ok())
    }
}

/// Everything decoded from the section header table and the sections it describes.
#[derive(Default)]
pub struct Sections {
    pub headers: Vec<SectionHeader>,
    pub symbols: Vec<SymbolTable>,
    pub dynamic: Vec<DynamicEntry>,
    pub strings: Vec<(SectionIndex, Vec<StringEntry>)>,
    pub eh_frames: Vec<EhFrame>,
    pub eh_frame_hdrs: Vec<EhFrameHdr>,
}

struct StringTables {
    strtab: Option<FileRange>,
    dynstr: Option<FileRange>,
}

pub fn walk_sections(reader: &Reader, header: &ElfHeader, max_entries: usize, out: &mut Output) -> Sections {
    let mut sections = Sections::default();
    if header.num_section_entries == 0 {
        return sections;
    }

    let layout = SectionHeader::layout_size(reader);
    let mut stride = header.section_entry_size as u64;
    if stride < layout {
        out.warn(
            header.section_offset,
            header.section_table_size(),
            format!("shentsize is {stride} but a {} section header is {layout} bytes", reader.class),
        );
        stride = layout;
    }
    let count = capped_count(
        reader,
        header.section_offset,
        header.num_section_entries as u64,
        stride,
        max_entries,
        "section header table",
        out,
    );
    let table = SectionTable::new(header, stride, count);
    if header.string_table_index as u64 >= count && header.string_table_index != 0 {
        out.warn(
            header.section_offset,
            header.section_table_size(),
            format!("shstrndx {} is not a valid section", header.string_table_index),
        );
    }

    let strings = StringTables {
        strtab: table.find(reader, ".strtab"),
        dynstr: table.find(reader, ".dynstr"),
    };
    trace!(strtab = ?strings.strtab, dynstr = ?strings.dynstr, "pre-scan");

    for i in 0..count as u32 {
        let offset = table.entry(i);
        let record = out.open(offset, "section header", format!("section {i}"));
        let result = SectionHeader::new(reader, &table, i, out);
        out.close(record, offset + stride);

        let section = match result {
            Ok(section) => section,
            Err(err) => {
                out.error(offset, stride, format!("bad section header: {err}"));
                break;
            }
        };
        out.summarize(record, format!("section {i} {}", section.name));

        let kind = section.kind();
        if kind != SectionKind::NoBits && section.size != 0 {
            out.extent(section.offset, section.size, format!("section {i} ({})", section.name));
            if !reader.contains(section.offset, section.size) {
                out.error(
                    offset,
                    stride,
                    format!(
                        "contents of section {i} ({:#x} bytes at {:#x}) run past the end of the file",
                        section.size, section.offset
                    ),
                );
            } else {
                walk_contents(reader, &table, &section, kind, &strings, max_entries, &mut sections, out);
            }
        }
        sections.headers.push(section);
    }
    debug!(count = sections.headers.len(), "walked section headers");
    sections
}

#[allow(clippy::too_many_arguments)]
fn walk_contents(
    reader: &Reader,
    table: &SectionTable,
    section: &SectionHeader,
    kind: SectionKind,
    strings: &StringTables,
    max_entries: usize,
    sections: &mut Sections,
    out: &mut Output,
) {
    let (offset, size) = (section.offset, section.size);
    let record = out.open(offset, "section contents", format!("{} ({kind:?})", section.name));
    let end = match kind {
        SectionKind::EhFrame => {
            // reports its own trailing data
            let frame = dwarf::eh_frame::walk(reader, offset, size, max_entries, out);
            sections.eh_frames.push(frame);
            None
        }
        SectionKind::EhFrameHdr => {
            let hdr = dwarf::eh_frame_hdr::walk(reader, offset, size, max_entries, out);
            let end = hdr.end;
            sections.eh_frame_hdrs.push(hdr);
            Some(end)
        }
        SectionKind::Dynamic => {
            let (entries, end) = walk_dynamic(reader, offset, size, max_entries, out);
            sections.dynamic.extend(entries);
            Some(end)
        }
        SectionKind::Symbols { dynamic } => {
            let named = if dynamic { strings.dynstr } else { strings.strtab };
            let names = match named {
                Some(range) => Some(range),
                None if section.link == 0 => None,
                None => match table.location(reader, section.link) {
                    Ok(range) => Some(range),
                    Err(err) => {
                        out.warn(
                            section.header_offset,
                            table.stride,
                            format!("{} links to section {}: {err}", section.name, section.link),
                        );
                        None
                    }
                },
            };
            let (symbols, end) = walk_symbols(reader, table, section, dynamic, names, max_entries, out);
            sections.symbols.push(symbols);
            Some(end)
        }
        SectionKind::Strings => {
            let (entries, end) = scan_strings(reader, offset, size, max_entries, out);
            sections.strings.push((section.index, entries));
            Some(end)
        }
        SectionKind::Entries { entry_size } => Some(walk_entries(reader, offset, size, entry_size, max_entries, out)),
        SectionKind::NoBits | SectionKind::Opaque => None,
    };
    out.close(record, offset + size);

    if let Some(end) = end
        && end != offset + size
    {
        out.warn(
            offset,
            size,
            format!(
                "section {} ({}) is {size:#x} bytes but {:#x} bytes were decoded",
                section.index.0,
                section.name,
                end.saturating_sub(offset)
            ),
        );
    }
}

fn walk_entries(reader: &Reader, offset: u64, size: u64, entry_size: u64, max_entries: usize, out: &mut Output) -> u64 {
    let declared = size / entry_size;
    let count = capped_count(reader, offset, declared, entry_size, max_entries, "section", out);
    for i in 0..count {
        out.field(offset + i * entry_size, entry_size, format!("entry {i}"), Value::Opaque);
    }
    offset + count * entry_size
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::synth::{ElfBuilder, SynthSection};
    use crate::elf::{FileClass, identify};
    use crate::output::Severity;

    fn walk(bytes: &[u8]) -> (Sections, Output) {
        let (class, endian) = identify(bytes).unwrap();
        let reader = Reader::new(bytes, class, endian);
        let mut out = Output::new();
        let header = ElfHeader::new(&reader, &mut out).unwrap();
        let sections = walk_sections(&reader, &header, 1000, &mut out);
        (sections, out)
    }

    fn builder(class: FileClass, endian: Endianness) -> ElfBuilder {
        let mut b = ElfBuilder::new(class, endian);
        let mut text = SynthSection::new(".text", 1, vec![0x90; 16]);
        text.flags = ALLOC_FLAG | EXECINSTR_FLAG;
        b.sections.push(text);
        b.sections.push(SynthSection::new(".bss", 8, Vec::new()));
        b
    }

    #[test]
    fn names_and_flags() {
        for class in [FileClass::ThirtyTwo, FileClass::SixtyFour] {
            for endian in [Endianness::Little, Endianness::Big] {
                let bytes = builder(class, endian).build();
                let (sections, out) = walk(&bytes);

                let names: Vec<&str> = sections.headers.iter().map(|s| s.name.as_str()).collect();
                assert_eq!(names, vec!["", ".text", ".bss", ".shstrtab"]);
                assert_eq!(SectionHeader::flags(sections.headers[1].flags), "ALLOC EXEC");
                assert_eq!(sections.headers[1].stype, SectionType::ProgBits);
                assert_eq!(sections.headers[2].kind(), SectionKind::NoBits);
                assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
            }
        }
    }

    #[test]
    fn flags_padding_position() {
        // the flags field (within .text's header) moves with the byte order for ELF64
        let cases = [
            (FileClass::ThirtyTwo, Endianness::Little, 8),
            (FileClass::ThirtyTwo, Endianness::Big, 8),
            (FileClass::SixtyFour, Endianness::Little, 8),
            (FileClass::SixtyFour, Endianness::Big, 12),
        ];
        for (class, endian, delta) in cases {
            let bytes = builder(class, endian).build();
            let (sections, out) = walk(&bytes);
            let text = &sections.headers[1];
            let field = out
                .fields
                .iter()
                .find(|f| f.label == "flags" && f.offset >= text.header_offset && f.offset < text.header_offset + 16)
                .unwrap();
            assert_eq!(field.offset - text.header_offset, delta, "{class} {endian}");
            assert_eq!(field.size, 4);
        }
    }

    #[test]
    fn extents() {
        let b = builder(FileClass::SixtyFour, Endianness::Little);
        let bytes = b.build();
        let (_, out) = walk(&bytes);

        // .bss has no bytes and the null section has no size
        let labels: Vec<&str> = out.extents.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["ELF header", "section header table", "section 1 (.text)", "section 3 (.shstrtab)"]
        );
        assert_eq!(out.extents[2].offset, b.data_offset(0));
    }

    #[test]
    fn dispatch_by_name_first() {
        assert_eq!(SectionKind::resolve(".eh_frame", SectionType::ProgBits, 0), SectionKind::EhFrame);
        assert_eq!(SectionKind::resolve(".eh_frame", SectionType::StringTable, 0), SectionKind::EhFrame);
        assert_eq!(SectionKind::resolve(".eh_frame_hdr", SectionType::Dynamic, 16), SectionKind::EhFrameHdr);
        assert_eq!(SectionKind::resolve(".dynamic", SectionType::Dynamic, 16), SectionKind::Dynamic);
        assert_eq!(
            SectionKind::resolve(".dynsym", SectionType::DynamicSymbolTable, 24),
            SectionKind::Symbols { dynamic: true }
        );
        assert_eq!(
            SectionKind::resolve(".rela.dyn", SectionType::RelocationsWith, 24),
            SectionKind::Entries { entry_size: 24 }
        );
        assert_eq!(SectionKind::resolve(".text", SectionType::ProgBits, 0), SectionKind::Opaque);
    }

    #[test]
    fn type_bands() {
        assert_eq!(SectionType::from_u32(0x6ffffff6).to_string(), "GNU_HASH");
        assert_eq!(SectionType::from_u32(0x60000010).to_string(), "LOOS+0x10");
        assert_eq!(SectionType::from_u32(0x70000001).to_string(), "LOPROC+0x1");
        assert_eq!(SectionType::from_u32(0x80000002).to_string(), "LOUSER+0x2");
        assert_eq!(SectionType::from_u32(0x20).to_string(), "0x20");
    }

    #[test]
    fn entries_that_dont_fit() {
        let mut b = builder(FileClass::SixtyFour, Endianness::Little);
        let mut rela = SynthSection::new(".rela.dyn", 4, vec![0; 50]);
        rela.entsize = 24;
        b.sections.push(rela);
        let bytes = b.build();
        let (_, out) = walk(&bytes);

        assert_eq!(out.fields.iter().filter(|f| f.label.starts_with("entry ")).count(), 2);
        assert_eq!(out.count(Severity::Warning), 1);
    }

    #[test]
    fn contents_past_end() {
        let b = builder(FileClass::ThirtyTwo, Endianness::Big);
        let mut bytes = b.build();

        // bump .text's sh_size way up
        let shoff = u32::from_be_bytes(bytes[32..36].try_into().unwrap()) as usize;
        let size_at = shoff + 40 + 20;
        bytes[size_at..size_at + 4].copy_from_slice(&0x10000u32.to_be_bytes());
        let (sections, out) = walk(&bytes);

        assert_eq!(sections.headers.len(), 4);
        assert_eq!(out.count(Severity::Error), 1);
    }
}
