use super::{FileRange, Reader, SectionHeader, SectionIndex, SectionTable, Stream, StringIndex, capped_count};
use crate::output::Output;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolTable {
    pub section: SectionIndex,
    pub dynamic: bool,
    pub entries: Vec<SymbolTableEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolTableEntry {
    // see https://refspecs.linuxbase.org/elf/gabi4+/ch4.symtab.html
    pub offset: u64,

    /// Index into the symbol string table.
    pub name_index: StringIndex,

    /// None if name_index is outside the string table.
    pub name: Option<String>,

    /// Can be an address, absolute value, etc.
    pub value: u64,

    /// Size of the symbol. Zero if the symbol has no or unknown size.
    pub size: u64,

    pub stype: SymbolType,

    pub binding: SymbolBinding,

    pub visibility: SymbolVisibility,

    /// The whole st_other byte. Visibility is only the low two bits.
    pub other: u8,

    pub index: SymbolIndex,

    /// Name of the section index refers to, if it refers to one.
    pub section_name: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SymbolIndex {
    /// Symbol has an absolute value that will not change with relocation.
    Abs,

    /// A common block that has not yet been allocated. Value has alignment.
    Common,

    /// Symbol value refers to another section at this index.
    Index(SectionIndex),

    /// Value is undefined. Linker will fix these up.
    Undef,

    /// Used when Index overflows. Related section will be of type SHT_SYMTAB_SHNDX.
    XIndex,

    Processor(u16),
    Os(u16),

    /// Some other value in the reserved range.
    Reserved(u16),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SymbolVisibility {
    /// Visibility is per binding.
    Default,

    /// Visible only within its object file. CPU may special case this.
    Internal,

    /// Visible only within its object file.
    Hidden,

    /// Visible to other object files but cannot be prempted.
    Protected,
}

/// Linkage visibility and behavior
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SymbolBinding {
    /// Symbol is not visible outside the object file containing its definition. These
    /// will appear before global and weak symbols in the table.
    Local,

    /// Visible to all object files.
    Global,

    /// Similar to Global but has lower precedence. These can be preempted by a Global.
    Weak,

    Os(u8),
    Processor(u8),
    Unknown(u8),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SymbolType {
    None,

    /// A data object, variable, array, etc.
    Object,

    /// Function or other executable code.
    Func,

    /// Another section. Used for relocation.
    Section,

    /// Source file associated with the symbol table.
    File,

    /// Uninitialized common blocks. Used by the linker.
    Common,

    /// Thread Local Storage data. Value is an offset to the data.
    Tls,

    Os(u8),
    Processor(u8),
    Unknown(u8),
}

impl SymbolTableEntry {
    /// Size of one entry for the class.
    pub fn layout_size(reader: &Reader) -> u64 {
        if reader.sixty_four_bit() { 24 } else { 16 }
    }

    /// Names are left unresolved.
    pub fn new(reader: &Reader, offset: u64) -> crate::error::Result<Self> {
        // Field order is different so we need both cases.
        let mut s = Stream::new(reader, offset);
        let (name, value, size, info, other, index) = if reader.sixty_four_bit() {
            let name = s.read_word()?; // 4
            let info = s.read_byte()?; // 1
            let other = s.read_byte()?; // 1
            let index = s.read_half()?; // 2
            let value = s.read_addr()?; // 8
            let size = s.read_xword()?; // 8
            (name, value, size, info, other, index)
        } else {
            let name = s.read_word()?;
            let value = s.read_addr()?;
            let size = s.read_word()? as u64;
            let info = s.read_byte()?;
            let other = s.read_byte()?;
            let index = s.read_half()?;
            (name, value, size, info, other, index)
        };
        Ok(SymbolTableEntry {
            offset,
            name_index: StringIndex(name),
            name: None,
            value,
            size,
            stype: SymbolType::from_u8(info),
            binding: SymbolBinding::from_u8(info),
            visibility: SymbolVisibility::from_u8(other),
            other,
            index: SymbolIndex::from_u16(index),
            section_name: None,
        })
    }

    /// Reports the entry's fields in file order.
    fn report(&self, reader: &Reader, out: &mut Output) {
        let w = reader.register_width();
        let name = self.name.clone().unwrap_or_else(|| "?".to_string());
        let info = (self.binding.to_u8() << 4) | self.stype.to_u8();
        let other = self.other as u64;
        let shndx = match &self.section_name {
            Some(name) => name.clone(),
            None => self.index.to_string(),
        };
        let mut at = self.offset;
        let mut next = |size: u64| {
            let here = at;
            at += size;
            here
        };
        out.named(next(4), 4, "name", self.name_index.0 as u64, name);
        if reader.sixty_four_bit() {
            out.named(next(1), 1, "info", info as u64, format!("{} {}", self.binding, self.stype));
            out.named(next(1), 1, "other", other, self.visibility.to_string());
            out.named(next(2), 2, "shndx", self.index.to_u16() as u64, shndx);
            out.unsigned(next(8), 8, "value", self.value);
            out.unsigned(next(8), 8, "size", self.size);
        } else {
            out.unsigned(next(w), w, "value", self.value);
            out.unsigned(next(4), 4, "size", self.size);
            out.named(next(1), 1, "info", info as u64, format!("{} {}", self.binding, self.stype));
            out.named(next(1), 1, "other", other, self.visibility.to_string());
            out.named(next(2), 2, "shndx", self.index.to_u16() as u64, shndx);
        }
    }
}

/// Decodes a SYMTAB or DYNSYM section. Names come from strings (.strtab or .dynstr) and
/// section indexes are resolved through the section header table. Returns the table and
/// the offset just past the last entry read.
pub fn walk_symbols(
    reader: &Reader,
    table: &SectionTable,
    section: &SectionHeader,
    dynamic: bool,
    strings: Option<FileRange>,
    max_entries: usize,
    out: &mut Output,
) -> (SymbolTable, u64) {
    let stride = SymbolTableEntry::layout_size(reader);
    if section.entry_size != 0 && section.entry_size != stride {
        out.note(
            section.header_offset,
            0,
            format!(
                "{} has entsize {} but symbols are {stride} bytes",
                section.name, section.entry_size
            ),
        );
    }
    if strings.is_none() {
        out.warn(section.offset, section.size, format!("no string table for {}", section.name));
    }

    let mut symbols = SymbolTable {
        section: section.index,
        dynamic,
        entries: Vec::new(),
    };
    let count = capped_count(
        reader,
        section.offset,
        section.size / stride,
        stride,
        max_entries,
        &section.name,
        out,
    );
    let mut end = section.offset;
    for i in 0..count {
        let offset = section.offset + i * stride;
        let mut entry = match SymbolTableEntry::new(reader, offset) {
            Ok(entry) => entry,
            Err(err) => {
                out.error(offset, stride, format!("bad symbol: {err}"));
                break;
            }
        };
        entry.name = strings.and_then(|strings| symbol_name(reader, strings, entry.name_index));
        if entry.name.is_none() && strings.is_some() {
            out.warn(
                offset,
                4,
                format!("symbol {i} name index {:#x} is outside the string table", entry.name_index.0),
            );
        }
        if let SymbolIndex::Index(index) = entry.index {
            entry.section_name = table.section_name(reader, index.0);
        }

        let summary = match (&entry.name, &entry.section_name) {
            (Some(name), _) if !name.is_empty() => format!("symbol {i} {name}"),
            (_, Some(section)) if entry.stype == SymbolType::Section => format!("symbol {i} {section}"),
            _ => format!("symbol {i}"),
        };
        let record = out.open(offset, "symbol", summary);
        entry.report(reader, out);
        out.close(record, offset + stride);

        end = offset + stride;
        symbols.entries.push(entry);
    }
    (symbols, end)
}

fn symbol_name(reader: &Reader, strings: FileRange, name: StringIndex) -> Option<String> {
    if name.0 as u64 >= strings.size {
        return None;
    }
    let start = strings.offset.checked_add(name.0 as u64)?;
    reader
        .read_cstr(start, strings.end())
        .ok()
        .map(|s| s.value)
}

impl SymbolIndex {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => SymbolIndex::Undef,
            0xff00..=0xff1f => SymbolIndex::Processor(value),
            0xff20..=0xff3f => SymbolIndex::Os(value),
            0xfff1 => SymbolIndex::Abs,
            0xfff2 => SymbolIndex::Common,
            0xffff => SymbolIndex::XIndex,
            0xff40.. => SymbolIndex::Reserved(value),
            _ => SymbolIndex::Index(SectionIndex(value as u32)),
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            SymbolIndex::Undef => 0,
            SymbolIndex::Abs => 0xfff1,
            SymbolIndex::Common => 0xfff2,
            SymbolIndex::XIndex => 0xffff,
            SymbolIndex::Index(index) => index.0 as u16,
            SymbolIndex::Processor(n) | SymbolIndex::Os(n) | SymbolIndex::Reserved(n) => n,
        }
    }
}

impl fmt::Display for SymbolIndex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SymbolIndex::Undef => f.write_str("UNDEF"),
            SymbolIndex::Abs => f.write_str("ABS"),
            SymbolIndex::Common => f.write_str("COMMON"),
            SymbolIndex::XIndex => f.write_str("XINDEX"),
            SymbolIndex::Index(index) => write!(f, "{}", index.0),
            SymbolIndex::Processor(n) => write!(f, "LOPROC+{}", n - 0xff00),
            SymbolIndex::Os(n) => write!(f, "LOOS+{}", n - 0xff20),
            SymbolIndex::Reserved(n) => write!(f, "reserved {n:#x}"),
        }
    }
}

impl SymbolVisibility {
    /// Only the low two bits of st_other are used.
    pub fn from_u8(value: u8) -> Self {
        match value & 0x3 {
            0 => SymbolVisibility::Default,
            1 => SymbolVisibility::Internal,
            2 => SymbolVisibility::Hidden,
            _ => SymbolVisibility::Protected,
        }
    }
}

impl fmt::Display for SymbolVisibility {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SymbolVisibility::Default => f.write_str("DEFAULT"),
            SymbolVisibility::Internal => f.write_str("INTERNAL"),
            SymbolVisibility::Hidden => f.write_str("HIDDEN"),
            SymbolVisibility::Protected => f.write_str("PROTECTED"),
        }
    }
}

impl SymbolBinding {
    pub fn from_u8(value: u8) -> Self {
        match value >> 4 {
            0 => SymbolBinding::Local,
            1 => SymbolBinding::Global,
            2 => SymbolBinding::Weak,
            n @ 10..=12 => SymbolBinding::Os(n),
            n @ 13..=15 => SymbolBinding::Processor(n),
            n => SymbolBinding::Unknown(n),
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            SymbolBinding::Local => 0,
            SymbolBinding::Global => 1,
            SymbolBinding::Weak => 2,
            SymbolBinding::Os(n) | SymbolBinding::Processor(n) | SymbolBinding::Unknown(n) => n,
        }
    }
}

impl fmt::Display for SymbolBinding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SymbolBinding::Local => f.write_str("LOCAL"),
            SymbolBinding::Global => f.write_str("GLOBAL"),
            SymbolBinding::Weak => f.write_str("WEAK"),
            SymbolBinding::Os(n) => write!(f, "LOOS+{}", n - 10),
            SymbolBinding::Processor(n) => write!(f, "LOPROC+{}", n - 13),
            SymbolBinding::Unknown(n) => write!(f, "bind {n}"),
        }
    }
}

impl SymbolType {
    pub fn from_u8(value: u8) -> Self {
        match value & 0xf {
            0 => SymbolType::None,
            1 => SymbolType::Object,
            2 => SymbolType::Func,
            3 => SymbolType::Section,
            4 => SymbolType::File,
            5 => SymbolType::Common,
            6 => SymbolType::Tls,
            n @ 10..=12 => SymbolType::Os(n),
            n @ 13..=15 => SymbolType::Processor(n),
            n => SymbolType::Unknown(n),
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            SymbolType::None => 0,
            SymbolType::Object => 1,
            SymbolType::Func => 2,
            SymbolType::Section => 3,
            SymbolType::File => 4,
            SymbolType::Common => 5,
            SymbolType::Tls => 6,
            SymbolType::Os(n) | SymbolType::Processor(n) | SymbolType::Unknown(n) => n,
        }
    }
}

impl fmt::Display for SymbolType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SymbolType::None => f.write_str("NOTYPE"),
            SymbolType::Object => f.write_str("OBJECT"),
            SymbolType::Func => f.write_str("FUNC"),
            SymbolType::Section => f.write_str("SECTION"),
            SymbolType::File => f.write_str("FILE"),
            SymbolType::Common => f.write_str("COMMON"),
            SymbolType::Tls => f.write_str("TLS"),
            SymbolType::Os(n) => write!(f, "LOOS+{}", n - 10),
            SymbolType::Processor(n) => write!(f, "LOPROC+{}", n - 13),
            SymbolType::Unknown(n) => write!(f, "type {n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::synth::{ElfBuilder, SynthSection};
    use crate::elf::{ElfHeader, Endianness, FileClass, identify, walk_sections};
    use crate::output::Severity;

    /// .text, .strtab, and .symtab with a null symbol, a function in .text, and a
    /// section symbol for .text.
    fn builder(class: FileClass, endian: Endianness) -> ElfBuilder {
        let mut b = ElfBuilder::new(class, endian);
        b.sections.push(SynthSection::new(".text", 1, vec![0xc3; 8]));
        b.sections.push(SynthSection::new(".strtab", 3, b"\0main\0".to_vec()));

        let mut data = b.symbol(0, 0, 0, 0, 0, 0);
        data.extend(b.symbol(1, 0x1000, 8, 0x12, 2, 1)); // GLOBAL FUNC, hidden
        data.extend(b.symbol(0, 0, 0, 0x03, 0, 1)); // LOCAL SECTION
        let mut symtab = SynthSection::new(".symtab", 2, data);
        symtab.link = 2;
        symtab.entsize = b.symbol_size();
        b.sections.push(symtab);
        b
    }

    fn walk(bytes: &[u8]) -> (Vec<SymbolTable>, Output) {
        let (class, endian) = identify(bytes).unwrap();
        let reader = Reader::new(bytes, class, endian);
        let mut out = Output::new();
        let header = ElfHeader::new(&reader, &mut out).unwrap();
        let sections = walk_sections(&reader, &header, 1000, &mut out);
        (sections.symbols, out)
    }

    #[test]
    fn both_layouts() {
        for class in [FileClass::ThirtyTwo, FileClass::SixtyFour] {
            for endian in [Endianness::Little, Endianness::Big] {
                let bytes = builder(class, endian).build();
                let (tables, out) = walk(&bytes);

                assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
                assert_eq!(tables.len(), 1);
                let table = &tables[0];
                assert!(!table.dynamic);
                assert_eq!(table.entries.len(), 3);

                let main = &table.entries[1];
                assert_eq!(main.name.as_deref(), Some("main"));
                assert_eq!(main.value, 0x1000);
                assert_eq!(main.size, 8);
                assert_eq!(main.binding, SymbolBinding::Global);
                assert_eq!(main.stype, SymbolType::Func);
                assert_eq!(main.visibility, SymbolVisibility::Hidden);
                assert_eq!(main.index, SymbolIndex::Index(SectionIndex(1)));
                assert_eq!(main.section_name.as_deref(), Some(".text"));

                let section = &table.entries[2];
                assert_eq!(section.stype, SymbolType::Section);
                assert_eq!(section.section_name.as_deref(), Some(".text"));
            }
        }
    }

    #[test]
    fn records() {
        let bytes = builder(FileClass::SixtyFour, Endianness::Little).build();
        let (_, out) = walk(&bytes);
        let summaries: Vec<String> = out
            .fields
            .iter()
            .filter(|f| f.label == "symbol")
            .map(|f| f.value.to_string())
            .collect();
        insta::assert_snapshot!(summaries.join("\n"), @r"
        symbol 0
        symbol 1 main
        symbol 2 .text
        ");
    }

    #[test]
    fn link_fallback() {
        // without a section named .strtab names come from sh_link
        let mut b = builder(FileClass::ThirtyTwo, Endianness::Little);
        b.sections[1].name = ".names".to_string();
        let bytes = b.build();
        let (tables, out) = walk(&bytes);

        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        assert_eq!(tables[0].entries[1].name.as_deref(), Some("main"));
    }

    #[test]
    fn bad_name_index() {
        let mut b = builder(FileClass::SixtyFour, Endianness::Big);
        let mut data = b.symbol(0, 0, 0, 0, 0, 0);
        data.extend(b.symbol(100, 0, 0, 0x10, 0, 0xfff1));
        b.sections[2].data = data;
        let bytes = b.build();
        let (tables, out) = walk(&bytes);

        let entry = &tables[0].entries[1];
        assert_eq!(entry.name, None);
        assert_eq!(entry.index, SymbolIndex::Abs);
        assert_eq!(out.count(Severity::Warning), 1);
    }

    #[test]
    fn link_outside_table() {
        let mut b = builder(FileClass::SixtyFour, Endianness::Little);
        b.sections[1].name = ".names".to_string();
        b.sections[2].link = 50;
        let bytes = b.build();
        let (tables, out) = walk(&bytes);

        assert!(tables[0].entries.iter().all(|e| e.name.is_none()));
        let messages: Vec<&str> = out.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert!(messages.iter().any(|m| m.starts_with(".symtab links to section 50: ")), "{messages:?}");
    }

    #[test]
    fn string_table_past_end() {
        // .strtab's sh_offset is u64::MAX
        let b = builder(FileClass::SixtyFour, Endianness::Little);
        let mut bytes = b.build();
        let shoff = u64::from_le_bytes(bytes[40..48].try_into().unwrap()) as usize;
        let at = shoff + 2 * 64 + 24;
        bytes[at..at + 8].copy_from_slice(&u64::MAX.to_le_bytes());
        let decoded = crate::decoder::decode(&bytes, &crate::decoder::Limits::default()).unwrap();

        assert_eq!(decoded.symbols.len(), 1);
        assert!(decoded.symbols[0].entries.iter().all(|e| e.name.is_none()));
        assert!(decoded.count(Severity::Error) > 0);
    }

    #[test]
    fn name_offset_overflow() {
        let bytes = builder(FileClass::SixtyFour, Endianness::Little).build();
        let (class, endian) = identify(&bytes).unwrap();
        let reader = Reader::new(&bytes, class, endian);
        let strings = FileRange {
            offset: u64::MAX - 2,
            size: 16,
        };
        assert_eq!(symbol_name(&reader, strings, StringIndex(5)), None);
    }

    #[test]
    fn other_byte_kept() {
        let mut b = builder(FileClass::ThirtyTwo, Endianness::Big);
        let mut data = b.symbol(0, 0, 0, 0, 0, 0);
        data.extend(b.symbol(1, 0x1000, 8, 0x12, 0x82, 1)); // hidden plus a processor bit
        b.sections[2].data = data;
        let bytes = b.build();
        let (tables, out) = walk(&bytes);

        let main = &tables[0].entries[1];
        assert_eq!(main.visibility, SymbolVisibility::Hidden);
        assert_eq!(main.other, 0x82);
        let other = out.fields.iter().filter(|f| f.label == "other").nth(1).unwrap();
        assert_eq!(
            other.value,
            crate::output::Value::Named {
                raw: 0x82,
                name: "HIDDEN".to_string()
            }
        );
    }

    #[test]
    fn special_indexes() {
        assert_eq!(SymbolIndex::from_u16(0).to_string(), "UNDEF");
        assert_eq!(SymbolIndex::from_u16(0xfff2).to_string(), "COMMON");
        assert_eq!(SymbolIndex::from_u16(0xff01).to_string(), "LOPROC+1");
        assert_eq!(SymbolIndex::from_u16(0xff20).to_string(), "LOOS+0");
        assert_eq!(SymbolIndex::from_u16(0xffff), SymbolIndex::XIndex);
        assert_eq!(SymbolBinding::from_u8(0xa0).to_string(), "LOOS+0");
        assert_eq!(SymbolType::from_u8(0x0d).to_string(), "LOPROC+0");
    }
}
