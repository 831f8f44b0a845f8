//! The .dynamic section: tag/value pairs used by the run-time linker.
use super::{Reader, Stream, capped_count};
use crate::output::Output;
use std::fmt;

/// How d_un should be interpreted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DynamicValueKind {
    /// d_val: a plain integer.
    Value,

    /// d_ptr: a virtual address.
    Pointer,

    Ignored,
    Unspecified,
}

impl fmt::Display for DynamicValueKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DynamicValueKind::Value => f.write_str("value"),
            DynamicValueKind::Pointer => f.write_str("pointer"),
            DynamicValueKind::Ignored => f.write_str("ignored"),
            DynamicValueKind::Unspecified => f.write_str("unspecified"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DynamicEntry {
    pub offset: u64,
    pub tag: u64,
    pub value: u64,
    pub kind: DynamicValueKind,
    pub label: String,
}

/// Classifies the value for the tags in the gABI's table. DT_ENCODING shares its value
/// with DT_PREINIT_ARRAY and is the one entry the table leaves unspecified.
pub fn value_kind(tag: u64) -> DynamicValueKind {
    use DynamicValueKind::*;
    match tag {
        0 => Ignored,                    // NULL
        1 | 2 => Value,                  // NEEDED, PLTRELSZ
        3..=7 => Pointer,                // PLTGOT, HASH, STRTAB, SYMTAB, RELA
        8..=11 => Value,                 // RELASZ, RELAENT, STRSZ, SYMENT
        12 | 13 => Pointer,              // INIT, FINI
        14 | 15 => Value,                // SONAME, RPATH
        16 => Ignored,                   // SYMBOLIC
        17 => Pointer,                   // REL
        18..=20 => Value,                // RELSZ, RELENT, PLTREL
        21 => Pointer,                   // DEBUG
        22 => Ignored,                   // TEXTREL
        23 => Pointer,                   // JMPREL
        24 => Ignored,                   // BIND_NOW
        25 | 26 => Pointer,              // INIT_ARRAY, FINI_ARRAY
        27..=30 => Value,                // INIT_ARRAYSZ, FINI_ARRAYSZ, RUNPATH, FLAGS
        32 => Unspecified,               // ENCODING
        33 => Value,                     // PREINIT_ARRAYSZ
        _ => Unspecified,
    }
}

pub fn tag_label(tag: u64) -> String {
    let name = match tag {
        0 => "NULL",
        1 => "NEEDED",
        2 => "PLTRELSZ",
        3 => "PLTGOT",
        4 => "HASH",
        5 => "STRTAB",
        6 => "SYMTAB",
        7 => "RELA",
        8 => "RELASZ",
        9 => "RELAENT",
        10 => "STRSZ",
        11 => "SYMENT",
        12 => "INIT",
        13 => "FINI",
        14 => "SONAME",
        15 => "RPATH",
        16 => "SYMBOLIC",
        17 => "REL",
        18 => "RELSZ",
        19 => "RELENT",
        20 => "PLTREL",
        21 => "DEBUG",
        22 => "TEXTREL",
        23 => "JMPREL",
        24 => "BIND_NOW",
        25 => "INIT_ARRAY",
        26 => "FINI_ARRAY",
        27 => "INIT_ARRAYSZ",
        28 => "FINI_ARRAYSZ",
        29 => "RUNPATH",
        30 => "FLAGS",
        32 => "ENCODING",
        33 => "PREINIT_ARRAYSZ",
        34 => "SYMTAB_SHNDX",
        35 => "RELRSZ",
        36 => "RELR",
        37 => "RELRENT",
        0x6ffffdf5 => "GNU_PRELINKED",
        0x6ffffdf6 => "GNU_CONFLICTSZ",
        0x6ffffdf7 => "GNU_LIBLISTSZ",
        0x6ffffdf8 => "CHECKSUM",
        0x6ffffdf9 => "PLTPADSZ",
        0x6ffffdfa => "MOVEENT",
        0x6ffffdfb => "MOVESZ",
        0x6ffffef5 => "GNU_HASH",
        0x6ffffef6 => "TLSDESC_PLT",
        0x6ffffef7 => "TLSDESC_GOT",
        0x6ffffef8 => "GNU_CONFLICT",
        0x6ffffef9 => "GNU_LIBLIST",
        0x6ffffefa => "CONFIG",
        0x6ffffefb => "DEPAUDIT",
        0x6ffffefc => "AUDIT",
        0x6ffffefd => "PLTPAD",
        0x6ffffefe => "MOVETAB",
        0x6ffffeff => "SYMINFO",
        0x6ffffff0 => "VERSYM",
        0x6ffffff9 => "RELACOUNT",
        0x6ffffffa => "RELCOUNT",
        0x6ffffffb => "FLAGS_1",
        0x6ffffffc => "VERDEF",
        0x6ffffffd => "VERDEFNUM",
        0x6ffffffe => "VERNEED",
        0x6fffffff => "VERNEEDNUM",
        0x6000000d..=0x6ffff000 => return format!("OS specific {tag:#x}"),
        0x6ffffd00..=0x6ffffdff => return format!("value range {tag:#x}"),
        0x6ffffe00..=0x6ffffeff => return format!("address range {tag:#x}"),
        0x70000000..=0x7fffffff => return format!("processor specific {tag:#x}"),
        _ => return format!("unknown {tag:#x}"),
    };
    name.to_string()
}

/// Decodes every tag/value pair in the section. Returns the entries and the offset just
/// past the last one read.
pub fn walk_dynamic(
    reader: &Reader,
    offset: u64,
    size: u64,
    max_entries: usize,
    out: &mut Output,
) -> (Vec<DynamicEntry>, u64) {
    let w = reader.register_width();
    let stride = 2 * w;
    let count = capped_count(reader, offset, size / stride, stride, max_entries, ".dynamic", out);

    let mut entries = Vec::new();
    let mut s = Stream::new(reader, offset);
    for i in 0..count {
        let start = s.offset;
        let (tag, value) = match (s.read_addr(), s.read_addr()) {
            (Ok(tag), Ok(value)) => (tag, value),
            (Err(err), _) | (_, Err(err)) => {
                out.error(start, stride, format!("bad dynamic entry: {err}"));
                s.offset = start;
                break;
            }
        };
        let kind = value_kind(tag);
        let label = tag_label(tag);

        let record = out.open(start, "dynamic entry", format!("{i} {label}"));
        out.named(start, w, "tag", tag, label.clone());
        out.unsigned(start + w, w, kind.to_string(), value);
        out.close(record, s.offset);

        entries.push(DynamicEntry {
            offset: start,
            tag,
            value,
            kind,
            label,
        });
    }
    (entries, s.offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::{Endianness, FileClass};
    use crate::elf::synth::ElfBuilder;

    #[test]
    fn needed_is_a_value() {
        assert_eq!(value_kind(1), DynamicValueKind::Value);
        assert_eq!(tag_label(1), "NEEDED");
    }

    #[test]
    fn kinds() {
        let known: Vec<u64> = (0..=40).filter(|&t| value_kind(t) != DynamicValueKind::Unspecified).collect();
        assert_eq!(known.len(), 32);
        assert_eq!(value_kind(32), DynamicValueKind::Unspecified);
        assert_eq!(value_kind(5), DynamicValueKind::Pointer);
        assert_eq!(value_kind(24), DynamicValueKind::Ignored);
        assert_eq!(value_kind(0x6ffffef5), DynamicValueKind::Unspecified);
    }

    #[test]
    fn labels() {
        assert_eq!(tag_label(0x6ffffef5), "GNU_HASH");
        assert_eq!(tag_label(0x6000000d), "OS specific 0x6000000d");
        assert_eq!(tag_label(0x6ffffd00), "value range 0x6ffffd00");
        assert_eq!(tag_label(0x6ffffe00), "address range 0x6ffffe00");
        assert_eq!(tag_label(0x70000001), "processor specific 0x70000001");
        assert_eq!(tag_label(0x50), "unknown 0x50");
    }

    #[test]
    fn walk() {
        for class in [FileClass::ThirtyTwo, FileClass::SixtyFour] {
            let b = ElfBuilder::new(class, Endianness::Big);
            let mut bytes = b.dynamic(1, 0x20);
            bytes.extend(b.dynamic(5, 0x4000));
            bytes.extend(b.dynamic(0, 0));
            let reader = Reader::new(&bytes, class, Endianness::Big);
            let mut out = Output::new();
            let (entries, end) = walk_dynamic(&reader, 0, bytes.len() as u64, 1000, &mut out);

            assert_eq!(end, bytes.len() as u64);
            assert!(out.diagnostics.is_empty());
            let got: Vec<(String, DynamicValueKind, u64)> =
                entries.into_iter().map(|e| (e.label, e.kind, e.value)).collect();
            assert_eq!(
                got,
                vec![
                    ("NEEDED".to_string(), DynamicValueKind::Value, 0x20),
                    ("STRTAB".to_string(), DynamicValueKind::Pointer, 0x4000),
                    ("NULL".to_string(), DynamicValueKind::Ignored, 0),
                ]
            );
        }
    }
}
