use super::tables::{add_field, add_simple};
use crate::cli::{ListArgs, limit};
use crate::commands::tables::{SimpleTableBuilder, TableBuilder};
use crate::decoder::Decoded;
use crate::dwarf::{CieGroup, EhFrameHdr};
use crate::utils::Styling;
use crate::utils::uwriteln;
use std::io::Write;

pub fn frames(mut out: impl Write, decoded: &Decoded, args: &ListArgs) {
    if decoded.eh_frames.is_empty() && decoded.eh_frame_hdrs.is_empty() {
        uwriteln!(out, "no call frame information");
        return;
    }

    let mut explained = false;
    for frame in decoded.eh_frames.iter() {
        for group in frame.groups.iter() {
            cie_group(&mut out, group, args, !explained);
            explained = explained || args.explain;
            uwriteln!(out);
        }
        match frame.terminator {
            Some(offset) => uwriteln!(out, "terminator at {offset:x}"),
            None => uwriteln!(out, "no terminator, walk stopped at {:x}", frame.end),
        }
    }

    for hdr in decoded.eh_frame_hdrs.iter() {
        uwriteln!(out);
        frame_hdr(&mut out, hdr, args);
    }
}

fn cie_group(mut out: impl Write, group: &CieGroup, args: &ListArgs, explain: bool) {
    let cie = &group.cie;
    uwriteln!(
        out,
        "CIE at {:x}: version {} augmentation \"{}\" code align {} data align {} return register {}",
        cie.offset,
        cie.version,
        cie.augmentation,
        cie.code_alignment,
        cie.data_alignment,
        cie.return_register
    );
    match group.fdes.len() {
        0 => {
            uwriteln!(out, "no FDEs");
            return;
        }
        1 => uwriteln!(out, "1 FDE, {} bytes in all", group.size()),
        n => uwriteln!(out, "{n} FDEs, {} bytes in all", group.size()),
    }

    let mut builder = TableBuilder::new();
    builder.add_col_r("offset", "offset of the FDE in the ELF file");
    builder.add_col_r("length", "size of the FDE after its length field");
    builder.add_col_r("pc begin", "encoded address of the first instruction covered");
    builder.add_col_r("pc range", "number of bytes of code covered");
    builder.add_col_r("instructions", "size of the call frame instructions");

    let max_results = limit(args.max_results);
    for fde in group.fdes.iter().take(max_results) {
        add_field!(builder, "offset", "{:x}", fde.offset);
        add_field!(builder, "length", "{:x}", fde.length);
        add_field!(builder, "pc begin", "{:x}", fde.pc_begin);
        add_field!(builder, "pc range", "{:x}", fde.pc_range);
        add_field!(builder, "instructions", fde.instructions);
    }
    builder.elided(group.fdes.len() > max_results);
    builder.writeln(&mut out, args.titles, explain && args.explain);
}

fn frame_hdr(mut out: impl Write, hdr: &EhFrameHdr, args: &ListArgs) {
    let mut b = SimpleTableBuilder::new();
    add_simple!(b, "version", hdr.version, "should be 1");
    add_simple!(
        b,
        "eh_frame_ptr",
        value_str(hdr.eh_frame_ptr, hdr.eh_frame_ptr_enc.name()),
        "encoded pointer to the start of .eh_frame"
    );
    add_simple!(
        b,
        "fde_count",
        value_str(hdr.fde_count, hdr.fde_count_enc.name()),
        "number of rows in the search table"
    );
    add_simple!(b, "table encoding", hdr.table_enc.name(), "how each search table value is stored");
    b.writeln(&mut out, args.explain);

    if hdr.table.is_empty() {
        return;
    }
    uwriteln!(out);
    let mut builder = TableBuilder::new();
    builder.add_col_r("initial location", "encoded address of the first instruction an FDE covers");
    builder.add_col_r("address", "encoded address of the FDE");
    let max_results = limit(args.max_results);
    for row in hdr.table.iter().take(max_results) {
        add_field!(builder, "initial location", "{:x}", row.initial_location);
        add_field!(builder, "address", "{:x}", row.address);
    }
    builder.elided(hdr.table.len() > max_results);
    builder.writeln(&mut out, args.titles, args.explain);
}

fn value_str(value: Option<u64>, encoding: String) -> String {
    match value {
        Some(value) => format!("{value:#x} ({encoding})"),
        None => format!("omitted ({encoding})"),
    }
}
