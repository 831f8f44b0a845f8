//! The .eh_frame_hdr section: a pointer to .eh_frame and an optional binary search
//! table of (initial location, FDE address) pairs.
use super::encoding::{DW_EH_PE_OMIT, EncodedValue, FieldLength, PointerEncoding, read_encoded};
use crate::elf::{Reader, Stream};
use crate::error::Result;
use crate::output::{Output, Value};
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EhFrameHdr {
    pub version: u8,
    pub eh_frame_ptr_enc: PointerEncoding,
    pub fde_count_enc: PointerEncoding,
    pub table_enc: PointerEncoding,
    pub eh_frame_ptr: Option<u64>,
    pub fde_count: Option<u64>,
    pub table: Vec<TableRow>,
    pub end: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableRow {
    pub initial_location: u64,
    pub address: u64,
}

/// Always returns what could be read. Once a field can't be read an error diagnostic is
/// reported and the remaining fields keep their defaults (omitted encodings, no pointer,
/// no count, and only the complete table rows).
pub fn walk(reader: &Reader, offset: u64, size: u64, max_entries: usize, out: &mut Output) -> EhFrameHdr {
    let end = offset.saturating_add(size).min(reader.len());
    let mut s = Stream::new(reader, offset);
    let mut hdr = EhFrameHdr {
        version: 0,
        eh_frame_ptr_enc: PointerEncoding(DW_EH_PE_OMIT),
        fde_count_enc: PointerEncoding(DW_EH_PE_OMIT),
        table_enc: PointerEncoding(DW_EH_PE_OMIT),
        eh_frame_ptr: None,
        fde_count: None,
        table: Vec::new(),
        end: offset,
    };
    let result = walk_header(&mut s, end, max_entries, &mut hdr, out);
    hdr.end = s.offset;
    match result {
        Ok(()) => debug!(rows = hdr.table.len(), "walked .eh_frame_hdr"),
        Err(err) => out.error(s.offset, end.saturating_sub(s.offset), format!("bad .eh_frame_hdr: {err}")),
    }
    hdr
}

fn walk_header(s: &mut Stream, end: u64, max_entries: usize, hdr: &mut EhFrameHdr, out: &mut Output) -> Result<()> {
    hdr.version = s.read_byte()?;
    out.unsigned(s.offset - 1, 1, "version", hdr.version as u64);
    hdr.eh_frame_ptr_enc = read_encoding(s, "eh_frame_ptr encoding", out)?;
    hdr.fde_count_enc = read_encoding(s, "fde_count encoding", out)?;
    hdr.table_enc = read_encoding(s, "table encoding", out)?;

    hdr.eh_frame_ptr = read_field(s, hdr.eh_frame_ptr_enc, "eh_frame_ptr", out)?.map(|v| v.value);
    hdr.fde_count = read_field(s, hdr.fde_count_enc, "fde_count", out)?.map(|v| v.value);

    let table_enc = hdr.table_enc;
    let Some(count) = hdr.fde_count else {
        return Ok(());
    };
    if table_enc.is_omitted() {
        return Ok(());
    }

    // Each row is at least two bytes (two one byte LEB128s) so a damaged count can't
    // make us spin.
    let remaining = end.saturating_sub(s.offset);
    let row_size = match table_enc.length(s.reader.register_width()) {
        FieldLength::Fixed(n) => 2 * n,
        _ => 2,
    };
    let fits = remaining / row_size;
    let rows = count.min(fits).min(max_entries as u64);
    if rows < count {
        out.warn(
            s.offset,
            remaining,
            format!("fde_count is {count} but only {rows} table rows were read"),
        );
    }

    for i in 0..rows {
        let start = s.offset;
        let record = out.open(start, "table row", format!("row {i}"));
        let row = read_row(s, table_enc, out);
        out.close(record, s.offset);
        if let Some(row) = row? {
            hdr.table.push(row);
        }
    }
    Ok(())
}

fn read_row(s: &mut Stream, enc: PointerEncoding, out: &mut Output) -> Result<Option<TableRow>> {
    let initial_location = read_field(s, enc, "initial location", out)?;
    let address = read_field(s, enc, "address", out)?;
    Ok(initial_location.zip(address).map(|(initial_location, address)| TableRow {
        initial_location: initial_location.value,
        address: address.value,
    }))
}

fn read_encoding(s: &mut Stream, label: &str, out: &mut Output) -> Result<PointerEncoding> {
    let enc = PointerEncoding(s.read_byte()?);
    out.named(s.offset - 1, 1, label, enc.0 as u64, enc.name());
    Ok(enc)
}

fn read_field(
    s: &mut Stream,
    enc: PointerEncoding,
    label: &str,
    out: &mut Output,
) -> Result<Option<EncodedValue>> {
    let value = read_encoded(s, enc)?;
    if let Some(v) = value {
        let field = if enc.is_signed() {
            Value::Signed(v.value as i64)
        } else {
            Value::Unsigned(v.value)
        };
        out.field(v.offset, v.size, label, field);
    }
    Ok(value)
}
