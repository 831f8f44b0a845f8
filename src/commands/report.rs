use super::tables::{add_field, add_simple};
use crate::cli::{DiagnosticsArgs, FieldsArgs, TableArgs, limit};
use crate::commands::tables::{SimpleTableBuilder, TableBuilder};
use crate::decoder::Decoded;
use crate::output::{Diagnostic, Severity, Value};
use crate::utils::Styling;
use crate::utils::uwriteln;
use std::io::Write;

pub fn layout(mut out: impl Write, decoded: &Decoded, args: &TableArgs) {
    let report = &decoded.layout;

    uwriteln!(out, "blackholes:");
    let mut builder = TableBuilder::new();
    builder.add_col_r("offset", "where the unclaimed bytes start");
    builder.add_col_r("size", "number of unclaimed bytes");
    builder.add_col_l("after", "the structure just before the hole");
    builder.add_col_l("before", "the structure just after the hole, empty at the end of the file");
    for hole in report.blackholes.iter() {
        add_field!(builder, "offset", "{:x}", hole.offset);
        add_field!(builder, "size", hole.size);
        add_field!(builder, "after", hole.after);
        add_field!(builder, "before", hole.before.clone().unwrap_or_default());
    }
    builder.writeln(&mut out, args.titles, args.explain);

    uwriteln!(out);
    uwriteln!(out, "overlaps:");
    let mut builder = TableBuilder::new();
    builder.add_col_r("offset", "where the second structure starts");
    builder.add_col_r("size", "number of bytes both claim");
    builder.add_col_l("first", "the structure that starts first");
    builder.add_col_l("second", "the structure that starts inside the first");
    for overlap in report.overlaps.iter() {
        add_field!(builder, "offset", "{:x}", overlap.offset);
        add_field!(builder, "size", overlap.size);
        add_field!(builder, "first", overlap.first);
        add_field!(builder, "second", overlap.second);
    }
    builder.writeln(&mut out, args.titles, args.explain);

    uwriteln!(out);
    totals(&mut out, decoded, args.explain);
}

fn totals(out: impl Write, decoded: &Decoded, explain: bool) {
    let report = &decoded.layout;
    let mut b = SimpleTableBuilder::new();
    add_simple!(b, "captured", report.captured, "size of the file");
    add_simple!(
        b,
        "accounted",
        report.accounted,
        "sum of the structure sizes less the overlaps between neighbors"
    );
    add_simple!(b, "difference", report.difference, "captured less accounted");
    add_simple!(b, "covered", report.covered, "bytes within the file claimed by something");
    let consumed = if decoded.consumed == report.captured {
        format!("{} (all)", decoded.consumed)
    } else {
        decoded.consumed.to_string()
    };
    add_simple!(b, "consumed", consumed, "end of the furthest structure");
    b.writeln(out, explain);
}

pub fn fields(mut out: impl Write, decoded: &Decoded, args: &FieldsArgs) {
    let max_depth = args.depth.unwrap_or(u8::MAX);
    let fields = decoded.fields.iter().filter(|f| f.depth <= max_depth);
    let mut count = 0;
    for field in fields {
        if count == limit(args.max_results) {
            uwriteln!(out, "...");
            break;
        }
        let indent = "  ".repeat(field.depth as usize);
        let value = match &field.value {
            Value::Record(summary) => summary.clone().table_header().to_string(),
            value => value.to_string(),
        };
        uwriteln!(
            out,
            "{:>8x} {:>6x}  {indent}{}: {value}",
            field.offset,
            field.size,
            field.label
        );
        count += 1;
    }
}

pub fn diagnostics(mut out: impl Write, decoded: &Decoded, args: &DiagnosticsArgs) {
    let mut found = false;
    for d in decoded.diagnostics.iter() {
        if args.quiet && d.severity == Severity::Note {
            continue;
        }
        uwriteln!(out, "{}", styled(d));
        found = true;
    }
    if !found {
        uwriteln!(out, "no diagnostics");
    }
}

fn styled(d: &Diagnostic) -> String {
    let s = d.to_string();
    match d.severity {
        Severity::Note => s.note().to_string(),
        Severity::Warning => s.warn().to_string(),
        Severity::Error => s.error().to_string(),
    }
}

/// What's printed when no command is given.
pub fn summary(mut out: impl Write, decoded: &Decoded) {
    let header = &decoded.header;
    uwriteln!(
        out,
        "{} {} {} for {} ({})",
        header.class,
        header.endian,
        header.stype(),
        header.machine(),
        header.abi()
    );
    let symbols: usize = decoded.symbols.iter().map(|t| t.entries.len()).sum();
    let fdes: usize = decoded
        .eh_frames
        .iter()
        .flat_map(|f| f.groups.iter())
        .map(|g| g.fdes.len())
        .sum();
    uwriteln!(
        out,
        "{} segments, {} sections, {} symbols, {} dynamic entries, {} FDEs",
        decoded.segments.len(),
        decoded.sections.len(),
        symbols,
        decoded.dynamic.len(),
        fdes
    );
    uwriteln!(out);
    totals(&mut out, decoded, false);

    let counts = [Severity::Error, Severity::Warning, Severity::Note].map(|s| decoded.count(s));
    uwriteln!(out);
    uwriteln!(
        out,
        "{} errors, {} warnings, {} notes",
        counts[0],
        counts[1],
        counts[2]
    );
    for d in decoded.diagnostics.iter().filter(|d| d.severity != Severity::Note) {
        uwriteln!(out, "{}", styled(d));
    }
}
