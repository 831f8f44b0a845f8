//! Builds small synthetic ELF images for unit tests.
use super::header::{MAGIC, header_layout_size};
use super::{Endianness, FileClass};

pub struct SynthSegment {
    pub ptype: u32,
    pub flags: u32,
    pub offset: u64,
    pub filesz: u64,
    pub memsz: u64,
}

pub struct SynthSection {
    pub name: String,
    pub stype: u32,
    pub flags: u64,
    pub link: u32,
    pub entsize: u64,
    pub data: Vec<u8>,
}

impl SynthSection {
    pub fn new(name: &str, stype: u32, data: Vec<u8>) -> Self {
        SynthSection {
            name: name.to_string(),
            stype,
            flags: 0,
            link: 0,
            entsize: 0,
            data,
        }
    }
}

/// Lays the file out as: header, program headers, section contents (in order, unaligned),
/// .shstrtab, section headers. Section 0 is the null section and .shstrtab comes last.
pub struct ElfBuilder {
    pub class: FileClass,
    pub endian: Endianness,
    pub etype: u16,
    pub machine: u16,
    pub entry: u64,
    pub segments: Vec<SynthSegment>,
    pub sections: Vec<SynthSection>,
}

impl ElfBuilder {
    pub fn new(class: FileClass, endian: Endianness) -> Self {
        ElfBuilder {
            class,
            endian,
            etype: 2,
            machine: 62,
            entry: 0,
            segments: Vec::new(),
            sections: Vec::new(),
        }
    }

    fn width(&self) -> u64 {
        self.class.register_width()
    }

    pub fn ph_entry_size(&self) -> u64 {
        if self.class.is_64() { 56 } else { 32 }
    }

    pub fn section_entry_size(&self) -> u64 {
        if self.class.is_64() { 64 } else { 40 }
    }

    /// File offset of the contents of sections[index].
    pub fn data_offset(&self, index: usize) -> u64 {
        let start = header_layout_size(self.class) + self.segments.len() as u64 * self.ph_entry_size();
        start
            + self.sections[..index]
                .iter()
                .map(|s| s.data.len() as u64)
                .sum::<u64>()
    }

    fn names(&self) -> (Vec<u8>, Vec<u32>) {
        let mut table = vec![0u8];
        let mut indexes = Vec::new();
        for name in self.sections.iter().map(|s| s.name.as_str()).chain([".shstrtab"]) {
            indexes.push(table.len() as u32);
            table.extend(name.as_bytes());
            table.push(0);
        }
        (table, indexes)
    }

    pub fn build(&self) -> Vec<u8> {
        let ehsize = header_layout_size(self.class);
        let phoff = if self.segments.is_empty() { 0 } else { ehsize };
        let (names, name_indexes) = self.names();
        let names_offset = self.data_offset(self.sections.len());
        let shoff = names_offset + names.len() as u64;
        let shnum = if self.sections.is_empty() { 0 } else { self.sections.len() as u64 + 2 };

        let mut bytes = Vec::new();
        bytes.extend(MAGIC);
        bytes.push(if self.class.is_64() { 2 } else { 1 });
        bytes.push(if self.endian == Endianness::Big { 2 } else { 1 });
        bytes.push(1);
        bytes.resize(16, 0);
        self.put(&mut bytes, self.etype as u64, 2);
        self.put(&mut bytes, self.machine as u64, 2);
        self.put(&mut bytes, 1, 4);
        self.put(&mut bytes, self.entry, self.width());
        self.put(&mut bytes, phoff, self.width());
        self.put(&mut bytes, if shnum == 0 { 0 } else { shoff }, self.width());
        self.put(&mut bytes, 0, 4);
        self.put(&mut bytes, ehsize, 2);
        self.put(&mut bytes, self.ph_entry_size(), 2);
        self.put(&mut bytes, self.segments.len() as u64, 2);
        self.put(&mut bytes, self.section_entry_size(), 2);
        self.put(&mut bytes, shnum, 2);
        self.put(&mut bytes, shnum.saturating_sub(1), 2);

        for segment in &self.segments {
            self.put_segment(&mut bytes, segment);
        }
        for section in &self.sections {
            bytes.extend(&section.data);
        }
        if shnum == 0 {
            return bytes;
        }
        bytes.extend(&names);

        bytes.resize(bytes.len() + self.section_entry_size() as usize, 0);
        for (i, section) in self.sections.iter().enumerate() {
            let offset = self.data_offset(i);
            self.put_section(&mut bytes, name_indexes[i], section, offset);
        }
        let shstrtab = SynthSection::new(".shstrtab", 3, names);
        self.put_section(&mut bytes, name_indexes[self.sections.len()], &shstrtab, names_offset);
        bytes
    }

    fn put_segment(&self, bytes: &mut Vec<u8>, segment: &SynthSegment) {
        let w = self.width();
        self.put(bytes, segment.ptype as u64, 4);
        if self.class.is_64() {
            self.put(bytes, segment.flags as u64, 4);
        }
        self.put(bytes, segment.offset, w);
        self.put(bytes, 0x1000 + segment.offset, w);
        self.put(bytes, 0, w);
        self.put(bytes, segment.filesz, w);
        self.put(bytes, segment.memsz, w);
        if !self.class.is_64() {
            self.put(bytes, segment.flags as u64, 4);
        }
        self.put(bytes, 0x1000, w);
    }

    fn put_section(&self, bytes: &mut Vec<u8>, name: u32, section: &SynthSection, offset: u64) {
        let w = self.width();
        self.put(bytes, name as u64, 4);
        self.put(bytes, section.stype as u64, 4);
        self.put(bytes, section.flags, w);
        self.put(bytes, 0, w);
        self.put(bytes, offset, w);
        self.put(bytes, section.data.len() as u64, w);
        self.put(bytes, section.link as u64, 4);
        self.put(bytes, 0, 4);
        self.put(bytes, 1, w);
        self.put(bytes, section.entsize, w);
    }

    pub fn put(&self, bytes: &mut Vec<u8>, value: u64, width: u64) {
        let le = value.to_le_bytes();
        let le = &le[..width as usize];
        match self.endian {
            Endianness::Little => bytes.extend(le),
            Endianness::Big => bytes.extend(le.iter().rev()),
        }
    }

    pub fn symbol(&self, name: u32, value: u64, size: u64, info: u8, other: u8, shndx: u16) -> Vec<u8> {
        let mut bytes = Vec::new();
        self.put(&mut bytes, name as u64, 4);
        if self.class.is_64() {
            bytes.push(info);
            bytes.push(other);
            self.put(&mut bytes, shndx as u64, 2);
            self.put(&mut bytes, value, 8);
            self.put(&mut bytes, size, 8);
        } else {
            self.put(&mut bytes, value, 4);
            self.put(&mut bytes, size, 4);
            bytes.push(info);
            bytes.push(other);
            self.put(&mut bytes, shndx as u64, 2);
        }
        bytes
    }

    pub fn dynamic(&self, tag: u64, value: u64) -> Vec<u8> {
        let mut bytes = Vec::new();
        self.put(&mut bytes, tag, self.width());
        self.put(&mut bytes, value, self.width());
        bytes
    }

    pub fn symbol_size(&self) -> u64 {
        if self.class.is_64() { 24 } else { 16 }
    }
}
