//! The ELF header. This is the only part of the file that is read before we know the
//! class and endianness.
use super::{Endianness, FileClass, Reader, Stream};
use crate::error::{ElfError, Result};
use crate::output::{Output, Value};

pub const MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

const EI_CLASS: usize = 4;
const EI_DATA: usize = 5;
const EI_NIDENT: u64 = 16;

pub struct ElfHeader {
    // Elf32_Ehdr or Elf64_Ehdr, see https://refspecs.linuxbase.org/elf/gabi4+/ch4.eheader.html
    pub class: FileClass,
    pub endian: Endianness,

    /// EI_DATA as it appeared in the file.
    pub data: u8,

    pub ident_version: u8,
    pub osabi: u8,
    pub abiversion: u8,

    /// Relocatable, executable, shared object, core, etc.
    pub etype: u16,
    pub machine: u16,
    pub version: u32,

    /// Virtual address of the entry point.
    pub entry: u64,

    pub ph_offset: u64,
    pub section_offset: u64,
    pub flags: u32,

    /// Size of this header. This is what we record as the header's extent.
    pub header_size: u16,

    pub ph_entry_size: u16,
    pub num_ph_entries: u16,
    pub section_entry_size: u16,
    pub num_section_entries: u16,

    /// Index of the section containing section names.
    pub string_table_index: u16,
}

/// Checks the magic and returns the class and endianness the rest of the file uses.
pub fn identify(bytes: &[u8]) -> Result<(FileClass, Endianness)> {
    if bytes.len() < MAGIC.len() || bytes[..MAGIC.len()] != MAGIC {
        return Err(ElfError::NotThisFormat("bad magic".to_string()));
    }
    if (bytes.len() as u64) < EI_NIDENT {
        return Err(ElfError::NotThisFormat("truncated identification bytes".to_string()));
    }
    let class = FileClass::from_u8(bytes[EI_CLASS]);
    let endian = match bytes[EI_DATA] {
        2 => Endianness::Big,
        _ => Endianness::Little,
    };
    let min = header_layout_size(class);
    if (bytes.len() as u64) < min {
        return Err(ElfError::NotThisFormat(format!(
            "{} bytes is too small for a {min} byte {class} header",
            bytes.len()
        )));
    }
    Ok((class, endian))
}

/// Size of the fixed header for a class.
pub fn header_layout_size(class: FileClass) -> u64 {
    EI_NIDENT + 24 + 3 * class.register_width()
}

impl ElfHeader {
    /// Reads the header, reporting each field along with the extents of the header and
    /// the two header tables.
    pub fn new(reader: &Reader, out: &mut Output) -> Result<Self> {
        let record = out.open(0, "ELF header", format!("{} {}", reader.class, reader.endian));
        let result = ElfHeader::read(reader, out);
        out.close(record, header_layout_size(reader.class));

        let header = result?;
        header.check(reader, out);
        header.record_extents(out);
        Ok(header)
    }

    fn read(reader: &Reader, out: &mut Output) -> Result<Self> {
        let mut s = Stream::new(reader, 0);
        out.field(0, 4, "magic", Value::Opaque);
        s.offset += 4;

        let class_byte = s.read_byte()?;
        out.named(4, 1, "class", class_byte as u64, reader.class.to_string());
        let data = s.read_byte()?;
        out.named(5, 1, "data", data as u64, reader.endian.to_string());
        let ident_version = s.read_byte()?;
        out.unsigned(6, 1, "ident version", ident_version as u64);
        let osabi = s.read_byte()?;
        out.named(7, 1, "osabi", osabi as u64, abi_name(osabi));
        let abiversion = s.read_byte()?;
        out.unsigned(8, 1, "abiversion", abiversion as u64);
        out.field(9, EI_NIDENT - 9, "padding", Value::Opaque);
        s.offset = EI_NIDENT;

        let etype = s.read_half()?;
        out.named(s.offset - 2, 2, "type", etype as u64, type_name(etype));
        let machine = s.read_half()?;
        out.named(s.offset - 2, 2, "machine", machine as u64, machine_name(machine));
        let version = s.read_word()?;
        out.unsigned(s.offset - 4, 4, "version", version as u64);

        let width = reader.register_width();
        let entry = s.read_addr()?;
        out.unsigned(s.offset - width, width, "entry", entry);
        let ph_offset = s.read_offset()?;
        out.unsigned(s.offset - width, width, "phoff", ph_offset);
        let section_offset = s.read_offset()?;
        out.unsigned(s.offset - width, width, "shoff", section_offset);

        let flags = s.read_word()?;
        out.unsigned(s.offset - 4, 4, "flags", flags as u64);
        let mut half = |label: &str, out: &mut Output| -> Result<u16> {
            let value = s.read_half()?;
            out.unsigned(s.offset - 2, 2, label, value as u64);
            Ok(value)
        };
        let header_size = half("ehsize", out)?;
        let ph_entry_size = half("phentsize", out)?;
        let num_ph_entries = half("phnum", out)?;
        let section_entry_size = half("shentsize", out)?;
        let num_section_entries = half("shnum", out)?;
        let string_table_index = half("shstrndx", out)?;

        Ok(ElfHeader {
            class: reader.class,
            endian: reader.endian,
            data,
            ident_version,
            osabi,
            abiversion,
            etype,
            machine,
            version,
            entry,
            ph_offset,
            section_offset,
            flags,
            header_size,
            ph_entry_size,
            num_ph_entries,
            section_entry_size,
            num_section_entries,
            string_table_index,
        })
    }

    fn check(&self, reader: &Reader, out: &mut Output) {
        if let FileClass::Unknown(n) = self.class {
            out.warn(4, 1, format!("unknown class {n}, assuming 32-bit fields"));
        }
        if !matches!(self.data, 1 | 2) {
            out.warn(5, 1, format!("unknown data encoding {}, assuming little endian", self.data));
        }
        let expected = header_layout_size(self.class);
        if self.header_size as u64 != expected {
            out.note(
                0,
                expected,
                format!("ehsize is {} but a {} header is {expected} bytes", self.header_size, self.class),
            );
        }

        let claimed = self.header_size as u64 + self.ph_table_size() + self.section_table_size();
        if claimed > reader.len() {
            out.warn(
                0,
                reader.len(),
                format!(
                    "header and header tables need {claimed} bytes but the file has {}",
                    reader.len()
                ),
            );
        }
    }

    fn record_extents(&self, out: &mut Output) {
        out.extent(0, self.header_size as u64, "ELF header");
        if self.num_ph_entries != 0 {
            out.extent(self.ph_offset, self.ph_table_size(), "program header table");
        }
        if self.num_section_entries != 0 {
            out.extent(self.section_offset, self.section_table_size(), "section header table");
        }
    }

    pub fn ph_table_size(&self) -> u64 {
        self.num_ph_entries as u64 * self.ph_entry_size as u64
    }

    pub fn section_table_size(&self) -> u64 {
        self.num_section_entries as u64 * self.section_entry_size as u64
    }

    pub fn stype(&self) -> String {
        type_name(self.etype)
    }

    pub fn machine(&self) -> &'static str {
        machine_name(self.machine)
    }

    pub fn abi(&self) -> &'static str {
        abi_name(self.osabi)
    }
}

fn type_name(etype: u16) -> String {
    match etype {
        0 => "NONE".to_string(),
        1 => "REL".to_string(),
        2 => "EXEC".to_string(),
        3 => "DYN".to_string(),
        4 => "CORE".to_string(),
        0xfe00..=0xfeff => format!("OS specific {etype:#x}"),
        0xff00..=0xffff => format!("processor specific {etype:#x}"),
        _ => format!("unknown {etype:#x}"),
    }
}

fn machine_name(machine: u16) -> &'static str {
    match machine {
        0 => "none",
        2 => "SPARC",
        3 => "x86",
        8 => "MIPS",
        20 => "PowerPC",
        21 => "PowerPC64",
        22 => "S390",
        40 => "ARM",
        42 => "SuperH",
        43 => "SPARC V9",
        50 => "IA-64",
        62 => "x86-64",
        183 => "AArch64",
        243 => "RISC-V",
        247 => "BPF",
        258 => "LoongArch",
        _ => "unknown",
    }
}

fn abi_name(abi: u8) -> &'static str {
    match abi {
        0 => "System V",
        1 => "HP-UX",
        2 => "NetBSD",
        3 => "Linux",
        4 => "GNU Hurd",
        6 => "Solaris",
        7 => "AIX",
        8 => "IRIX",
        9 => "FreeBSD",
        10 => "Tru64",
        12 => "OpenBSD",
        97 => "ARM",
        255 => "standalone",
        _ => "unknown",
    }
}
