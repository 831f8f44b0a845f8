use super::tables::{add_field, add_simple};
use crate::cli::{ExplainArgs, ListArgs, StringsArgs, TableArgs, limit};
use crate::commands::tables::{SimpleTableBuilder, TableBuilder};
use crate::decoder::Decoded;
use crate::elf::{ProgramHeader, SectionHeader, SectionKind, SectionType, SymbolIndex, SymbolType};
use crate::utils::Styling;
use crate::utils::uwriteln;
use std::io::Write;

pub fn elf_header(out: impl Write, decoded: &Decoded, args: &ExplainArgs) {
    let header = &decoded.header;
    let mut b = SimpleTableBuilder::new();

    add_simple!(b, "class", header.class, "32 or 64-bit, this sets the size of addresses and offsets");
    add_simple!(
        b,
        "data",
        header.endian,
        "byte order used by every field after the identification bytes"
    );
    add_simple!(b, "ident version", header.ident_version, "version of the identification bytes, should be 1");
    add_simple!(b, "osabi", header.abi(), "the OS the binary was compiled for");
    add_simple!(b, "abiversion", header.abiversion, "zero for Linux");
    add_simple!(b, "type", header.stype(), "type of ELF file");
    add_simple!(b, "machine", header.machine(), "CPU architecture");
    add_simple!(b, "version", header.version, "should always be 1");
    add_simple!(b, "entry", "{:#x}", header.entry, "virtual address of the entry point");
    add_simple!(b, "flags", "{:#x}", header.flags, "processor specific flags");
    add_simple!(b, "header size", header.header_size, "size of this header in bytes");
    add_simple!(
        b,
        "ph_offset",
        "{:#x}",
        header.ph_offset,
        "offset in the ELF file to the program header table"
    );
    add_simple!(b, "ph_entry_size", header.ph_entry_size, "size of each program header");
    add_simple!(
        b,
        "num_ph_entries",
        header.num_ph_entries,
        "number of entries in the program header table"
    );
    add_simple!(
        b,
        "section_offset",
        "{:#x}",
        header.section_offset,
        "offset in the ELF file to the section header table"
    );
    add_simple!(b, "section_entry_size", header.section_entry_size, "size of each section header");
    add_simple!(
        b,
        "num_section_entries",
        header.num_section_entries,
        "number of entries in the section header table"
    );
    add_simple!(
        b,
        "string_table_index",
        header.string_table_index,
        "section index containing the section names"
    );
    b.writeln(out, args.explain);
}

pub fn elf_segments(mut out: impl Write, decoded: &Decoded, args: &TableArgs) {
    let mut builder = TableBuilder::new();
    builder.add_col_r("index", "program header index");
    builder.add_col_l("type", "the segment type");
    builder.add_col_r("offset", "the offset into the ELF file at which the segment appears");
    builder.add_col_r("vaddr", "the virtual address the segment starts at");
    builder.add_col_r("file size", "the size of the segment on disk");
    builder.add_col_r("memory size", "the size of the segment in memory");
    builder.add_col_r("align", "required alignment");
    builder.add_col_l("flags", "readable, writeable, and/or executable");

    for (i, segment) in decoded.segments.iter().enumerate() {
        add_field!(builder, "index", i);
        add_field!(builder, "type", segment.stype);
        add_field!(builder, "offset", "{:x}", segment.offset);
        add_field!(builder, "vaddr", "{:x}", segment.vaddr);
        add_field!(builder, "file size", "{:x}", segment.file_size);
        add_field!(builder, "memory size", "{:x}", segment.mem_size);
        add_field!(builder, "align", "{:x}", segment.align);
        add_field!(builder, "flags", ProgramHeader::flags(segment.flags));
    }

    builder.writeln(&mut out, args.titles, args.explain);
    if args.explain {
        uwriteln!(out);
        uwriteln!(out, "Numeric fields are all in hex.");
    }
}

pub fn elf_sections(out: impl Write, decoded: &Decoded, args: &TableArgs) {
    let mut builder = TableBuilder::new();
    builder.add_col_r("index", "index into sections.");
    builder.add_col_l("name", "name from the section name string table.");
    builder.add_col_l("type", "type of the section.");
    builder.add_col_r("vaddr", "virtual address at execution.");
    builder.add_col_r("offset", "offset into the ELF file for the start of the section.");
    builder.add_col_r("size", "section size in bytes.");
    builder.add_col_r("entry_size", "set if the section holds a table of entries.");
    builder.add_col_r("align", "section alignment.");
    builder.add_col_r(
        "link",
        "link to another section with related information, usually a string or symbol table.",
    );
    builder.add_col_r("info", "additional section info");
    builder.add_col_l("flags", "write, alloc, exec, etc.");
    builder.add_col_l("decoded as", "how the contents were walked.");

    // Sections are referenced by index so they aren't sorted.
    for section in decoded.sections.iter() {
        add_field!(builder, "index", section.index.0);
        add_field!(builder, "name", section.name);
        add_field!(builder, "type", section.stype);
        add_field!(builder, "vaddr", "{:x}", section.addr);
        add_field!(builder, "offset", "{:x}", section.offset);
        add_field!(builder, "size", section.size);
        add_field!(builder, "entry_size", section.entry_size);
        add_field!(builder, "align", section.align);
        add_field!(builder, "link", section.link);
        add_field!(builder, "info", section.info);
        add_field!(builder, "flags", SectionHeader::flags(section.flags));
        add_field!(builder, "decoded as", kind_str(section.kind()));
    }

    builder.writeln(out, args.titles, args.explain);
}

fn kind_str(kind: SectionKind) -> String {
    match kind {
        SectionKind::EhFrame => "call frames".to_string(),
        SectionKind::EhFrameHdr => "frame index".to_string(),
        SectionKind::Dynamic => "dynamic".to_string(),
        SectionKind::Symbols { dynamic: true } => "dynamic symbols".to_string(),
        SectionKind::Symbols { dynamic: false } => "symbols".to_string(),
        SectionKind::Strings => "strings".to_string(),
        SectionKind::Entries { entry_size } => format!("{entry_size} byte entries"),
        SectionKind::NoBits => "no bits".to_string(),
        SectionKind::Opaque => "opaque".to_string(),
    }
}

pub fn elf_symbols(mut out: impl Write, decoded: &Decoded, args: &ListArgs) {
    let max_results = limit(args.max_results);
    for (i, table) in decoded.symbols.iter().enumerate() {
        if i > 0 {
            uwriteln!(out);
        }
        let name = decoded.section(table.section).map(|s| s.name.as_str()).unwrap_or("");
        uwriteln!(out, "section {} {name}", table.section.0);

        let mut builder = TableBuilder::new();
        builder.add_col_r("index", "symbol index");
        builder.add_col_l("name", "the symbol name");
        builder.add_col_l("type", "the symbol type");
        builder.add_col_r("value", "address, absolute value, etc (in hex)");
        builder.add_col_r("size", "size of the value, 0 for unknown or undefined");
        builder.add_col_l("binding", "linkage visibility and behavior");
        builder.add_col_l("visibility", "whether the symbol is visible outside its component");
        builder.add_col_l(
            "related",
            "indicates a related section or marks the entry as an absolute value",
        );

        for (j, e) in table.entries.iter().take(max_results).enumerate() {
            let name = match (&e.name, e.stype) {
                (_, SymbolType::Section) => e.section_name.clone().unwrap_or_default(),
                (Some(name), _) => name.clone(),
                (None, _) => format!("? ({})", e.name_index.0),
            };
            add_field!(builder, "index", j);
            add_field!(builder, "name", name);
            add_field!(builder, "type", e.stype);
            add_field!(builder, "value", "{:x}", e.value);
            add_field!(builder, "size", e.size);
            add_field!(builder, "binding", e.binding);
            add_field!(builder, "visibility", e.visibility);
            add_field!(builder, "related", related_str(decoded, e.index));
        }
        builder.elided(table.entries.len() > max_results);
        builder.writeln(&mut out, args.titles, args.explain && i == 0);
    }
}

fn related_str(decoded: &Decoded, index: SymbolIndex) -> String {
    match index {
        SymbolIndex::Index(index) => match decoded.section(index) {
            Some(section) if !section.name.is_empty() => section.name.clone(),
            _ => format!("section {}", index.0),
        },
        _ => index.to_string(),
    }
}

pub fn elf_dynamic(out: impl Write, decoded: &Decoded, args: &ListArgs) {
    let mut builder = TableBuilder::new();
    builder.add_col_r("offset", "offset of the entry in the ELF file");
    builder.add_col_l("tag", "what the entry is for");
    builder.add_col_l("kind", "whether the value is an integer, an address, or unused");
    builder.add_col_r("value", "the value (in hex)");

    let max_results = limit(args.max_results);
    for entry in decoded.dynamic.iter().take(max_results) {
        add_field!(builder, "offset", "{:x}", entry.offset);
        add_field!(builder, "tag", entry.label);
        add_field!(builder, "kind", entry.kind);
        add_field!(builder, "value", "{:x}", entry.value);
    }

    builder.elided(decoded.dynamic.len() > max_results);
    builder.writeln(out, args.titles, args.explain);
}

pub fn elf_strings(mut out: impl Write, decoded: &Decoded, args: &StringsArgs) {
    let max_results = limit(args.max_results);
    let mut found = false;
    for (index, strings) in decoded.strings.iter() {
        if args.index.is_some_and(|i| i != index.0) {
            continue;
        }
        let Some(section) = decoded.section(*index) else {
            continue;
        };
        debug_assert!(section.stype == SectionType::StringTable);
        if found {
            uwriteln!(out);
        }
        uwriteln!(out, "section {} {}", index.0, section.name);
        for s in strings.iter().take(max_results) {
            uwriteln!(out, "{}: {}", s.index, s.value);
        }
        if strings.len() > max_results {
            uwriteln!(out, "...");
        }
        found = true;
    }
    if !found {
        uwriteln!(out, "none");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_decoded;
    use crate::utils::strip_escapes;

    fn render(f: impl FnOnce(&mut Vec<u8>, &Decoded)) -> String {
        let decoded = test_decoded();
        let mut v: Vec<u8> = Vec::new();
        f(&mut v, &decoded);
        strip_escapes(&String::from_utf8(v).unwrap())
    }

    #[test]
    fn header() {
        let s = render(|v, d| elf_header(v, d, &ExplainArgs { explain: true }));
        assert!(s.contains("ELF64"));
        assert!(s.contains("little endian"));
        assert!(s.contains("x86-64"));
        assert!(s.contains("machine: CPU architecture"));
        assert!(s.contains("ident version: version of the identification bytes"));
    }

    #[test]
    fn segments() {
        let args = TableArgs {
            explain: false,
            titles: true,
        };
        let s = render(|v, d| elf_segments(v, d, &args));
        let lines: Vec<&str> = s.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("memory size"));
        assert!(lines[2].contains("LOAD"));
        assert!(lines[2].contains("r-x"));
    }

    #[test]
    fn sections() {
        let args = TableArgs {
            explain: false,
            titles: false,
        };
        let s = render(|v, d| elf_sections(v, d, &args));
        assert_eq!(s.lines().count(), 8);
        assert!(s.contains(".eh_frame"));
        assert!(s.contains("call frames"));
        assert!(s.contains("dynamic symbols"));
    }

    #[test]
    fn symbols() {
        let args = ListArgs {
            explain: false,
            titles: false,
            max_results: 1,
        };
        let s = render(|v, d| elf_symbols(v, d, &args));
        let lines: Vec<&str> = s.lines().collect();
        assert!(lines[0].starts_with("section 4 .dynsym"));
        assert!(lines[1].contains("NOTYPE"));
        assert_eq!(lines[2], "...");
    }

    #[test]
    fn dynamic() {
        let args = ListArgs {
            explain: false,
            titles: false,
            max_results: 0,
        };
        let s = render(|v, d| elf_dynamic(v, d, &args));
        assert!(s.contains("NEEDED"));
        assert!(s.contains("NULL"));

        let args = ListArgs {
            max_results: 1,
            ..args
        };
        let s = render(|v, d| elf_dynamic(v, d, &args));
        let lines: Vec<&str> = s.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("NEEDED"));
        assert_eq!(lines[1], "...");
    }

    #[test]
    fn strings() {
        let args = StringsArgs {
            index: Some(3),
            max_results: 10,
        };
        let s = render(|v, d| elf_strings(v, d, &args));
        assert_eq!(s, "section 3 .dynstr\n0: \n1: libc.so.6\n2: puts\n");

        let args = StringsArgs {
            index: Some(1),
            max_results: 10,
        };
        let s = render(|v, d| elf_strings(v, d, &args));
        assert_eq!(s, "none\n");
    }
}
