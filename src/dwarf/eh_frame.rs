//! Walks the call frame information in a .eh_frame section. The section is a sequence
//! of CIEs, each followed by the FDEs that use it, ending with a zero length terminator.
//! We locate and size everything but never execute the call frame instructions.
use super::leb128;
use crate::elf::{Reader, Stream};
use crate::error::{ElfError, Result, require};
use crate::output::{Output, RecordId, Value};
use tracing::debug;

const EXTENDED_LENGTH: u32 = 0xffff_ffff;

/// Common Information Entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cie {
    pub offset: u64,

    /// Bytes following the length field(s).
    pub length: u64,

    /// Set if the length used the 0xffffffff escape and a 64-bit length.
    pub extended: bool,

    pub version: u8,

    /// E.g. "zR" or "zPLR". A leading 'z' means augmentation data is present.
    pub augmentation: String,

    pub code_alignment: u64,
    pub data_alignment: i64,
    pub return_register: u64,
    pub augmentation_data: Option<u64>,

    /// Size of the call frame instructions.
    pub instructions: u64,
}

/// Frame Description Entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fde {
    pub offset: u64,
    pub length: u64,
    pub extended: bool,

    /// Distance back from this field to the owning CIE. Never zero.
    pub cie_pointer: u32,

    pub pc_begin: u32,
    pub pc_range: u32,
    pub augmentation_data: Option<u64>,
    pub instructions: u64,
}

impl Cie {
    pub fn end(&self) -> u64 {
        self.offset + header_len(self.extended) + self.length
    }
}

impl Fde {
    pub fn end(&self) -> u64 {
        self.offset + header_len(self.extended) + self.length
    }

    /// Offset of the CIE this FDE claims to belong to.
    pub fn referenced_cie(&self) -> Option<u64> {
        (self.offset + header_len(self.extended)).checked_sub(self.cie_pointer as u64)
    }
}

/// A CIE along with the FDEs that follow it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CieGroup {
    pub cie: Cie,
    pub fdes: Vec<Fde>,
}

impl CieGroup {
    pub fn offset(&self) -> u64 {
        self.cie.offset
    }

    /// Cumulative size of the CIE and all its FDEs.
    pub fn size(&self) -> u64 {
        let end = self.fdes.last().map(|f| f.end()).unwrap_or(self.cie.end());
        end - self.cie.offset
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EhFrame {
    pub groups: Vec<CieGroup>,

    /// Offset of the zero length terminator, if we got that far.
    pub terminator: Option<u64>,

    /// Offset just past the last entry we were able to walk.
    pub end: u64,
}

/// Which entry we expect next. FDEs are attributed to the most recent CIE.
enum WalkState {
    ExpectCie,
    InCieGroup { record: RecordId },
}

fn header_len(extended: bool) -> u64 {
    if extended { 12 } else { 4 }
}

/// Walks [offset, offset + size). Problems with an entry are reported as diagnostics and
/// stop the walk: there's no reliable way to find the next entry.
pub fn walk(reader: &Reader, offset: u64, size: u64, max_entries: usize, out: &mut Output) -> EhFrame {
    let end = offset.saturating_add(size).min(reader.len());
    let mut frame = EhFrame::default();
    let mut state = WalkState::ExpectCie;
    let mut pos = offset;
    let mut count = 0;

    while end.saturating_sub(pos) >= 4 {
        if count == max_entries {
            out.warn(pos, end - pos, format!("stopped after {max_entries} CFI entries"));
            break;
        }
        count += 1;

        match walk_entry(reader, pos, end, &mut state, &mut frame, out) {
            Ok(Some(next)) => pos = next,
            Ok(None) => {
                pos += 4;
                break;
            }
            Err(err) => {
                out.error(pos, end - pos, format!("bad CFI entry: {err}"));
                break;
            }
        }
    }

    if let WalkState::InCieGroup { record } = state {
        close_group(record, &frame, out);
    }
    frame.end = pos;
    if pos < end {
        out.warn(pos, end - pos, format!("{} bytes of extraneous data", end - pos));
    }
    debug!(groups = frame.groups.len(), end = frame.end, "walked .eh_frame");
    frame
}

/// Returns the offset of the next entry or None for the terminator.
fn walk_entry(
    reader: &Reader,
    pos: u64,
    end: u64,
    state: &mut WalkState,
    frame: &mut EhFrame,
    out: &mut Output,
) -> Result<Option<u64>> {
    let length = reader.read_word(pos)?;
    if length == 0 {
        if let WalkState::InCieGroup { record } = *state {
            close_group(record, frame, out);
        }
        *state = WalkState::ExpectCie;
        out.unsigned(pos, 4, "terminator", 0);
        frame.terminator = Some(pos);
        return Ok(None);
    }

    let extended = length == EXTENDED_LENGTH;
    let length = if extended {
        reader.read_xword(pos + 4)?
    } else {
        length as u64
    };
    let body = pos + header_len(extended);
    let entry_end = body
        .checked_add(length)
        .ok_or(ElfError::Overflow(length))?;
    require(
        header_len(extended) + length >= 12,
        &format!("entry is only {} bytes", header_len(extended) + length),
    )?;
    require(
        entry_end <= end,
        &format!("entry ends at {entry_end:#x}, past the section end {end:#x}"),
    )?;

    let id = reader.read_word(body)?;
    let is_cie = id == 0 || matches!(state, WalkState::ExpectCie);
    if is_cie {
        if let WalkState::InCieGroup { record } = *state {
            close_group(record, frame, out);
        }
        *state = WalkState::ExpectCie;

        let record = out.open(pos, "CIE group", format!("CIE group at {pos:#x}"));
        match walk_cie(reader, pos, length, extended, out) {
            Ok(cie) => {
                frame.groups.push(CieGroup {
                    cie,
                    fdes: Vec::new(),
                });
                *state = WalkState::InCieGroup { record };
            }
            Err(err) => {
                out.close(record, entry_end);
                return Err(err);
            }
        }
    } else {
        let Some(group) = frame.groups.last_mut() else {
            return Err(ElfError::Structural("FDE without a CIE".to_string()));
        };
        let fde = walk_fde(reader, pos, length, extended, &group.cie, out)?;
        group.fdes.push(fde);
    }
    Ok(Some(entry_end))
}

/// Only called while in a group so there is always a last group.
fn close_group(record: RecordId, frame: &EhFrame, out: &mut Output) {
    if let Some(group) = frame.groups.last() {
        out.summarize(
            record,
            format!("CIE \"{}\" with {} FDEs", group.cie.augmentation, group.fdes.len()),
        );
        out.close(record, group.offset() + group.size());
    }
}

fn report_length(pos: u64, length: u64, extended: bool, out: &mut Output) {
    if extended {
        out.unsigned(pos, 4, "length", EXTENDED_LENGTH as u64);
        out.unsigned(pos + 4, 8, "extended length", length);
    } else {
        out.unsigned(pos, 4, "length", length);
    }
}

fn walk_cie(reader: &Reader, pos: u64, length: u64, extended: bool, out: &mut Output) -> Result<Cie> {
    let entry_end = pos + header_len(extended) + length;
    let record = out.open(pos, "CIE", format!("CIE at {pos:#x}"));
    let result = parse_cie(reader, pos, length, extended, entry_end, out);
    out.close(record, entry_end);
    result
}

fn parse_cie(
    reader: &Reader,
    pos: u64,
    length: u64,
    extended: bool,
    entry_end: u64,
    out: &mut Output,
) -> Result<Cie> {
    report_length(pos, length, extended, out);

    let mut s = Stream::new(reader, pos + header_len(extended));
    out.unsigned(s.offset, 4, "CIE id", s.read_word()? as u64);
    let version = s.read_byte()?;
    out.unsigned(s.offset - 1, 1, "version", version as u64);

    let start = s.offset;
    let augmentation = s.read_string(entry_end)?;
    out.field(start, s.offset - start, "augmentation", Value::Text(augmentation.clone()));

    let (code_alignment, n) = leb128::decode_u64(&mut s)?;
    out.unsigned(s.offset - n, n, "code alignment factor", code_alignment);
    let (data_alignment, n) = leb128::decode_i64(&mut s)?;
    out.field(s.offset - n, n, "data alignment factor", Value::Signed(data_alignment));
    let (return_register, n) = leb128::decode_u64(&mut s)?;
    out.unsigned(s.offset - n, n, "return address register", return_register);

    let augmentation_data = augmentation_data(&mut s, &augmentation, entry_end, out)?;
    let instructions = instructions(&s, entry_end, out)?;

    Ok(Cie {
        offset: pos,
        length,
        extended,
        version,
        augmentation,
        code_alignment,
        data_alignment,
        return_register,
        augmentation_data,
        instructions,
    })
}

fn walk_fde(
    reader: &Reader,
    pos: u64,
    length: u64,
    extended: bool,
    cie: &Cie,
    out: &mut Output,
) -> Result<Fde> {
    let entry_end = pos + header_len(extended) + length;
    let record = out.open(pos, "FDE", format!("FDE at {pos:#x}"));
    let result = parse_fde(reader, pos, length, extended, entry_end, cie, out);
    out.close(record, entry_end);

    // We attribute FDEs to the preceding CIE (which is what linkers emit) but the FDE
    // says where its CIE is so check that.
    if let Ok(fde) = &result
        && fde.referenced_cie() != Some(cie.offset)
    {
        let field = pos + header_len(extended);
        out.warn(
            field,
            4,
            format!(
                "FDE points at a CIE at {:#x} but follows the CIE at {:#x}",
                field.wrapping_sub(fde.cie_pointer as u64),
                cie.offset
            ),
        );
    }
    result
}

fn parse_fde(
    reader: &Reader,
    pos: u64,
    length: u64,
    extended: bool,
    entry_end: u64,
    cie: &Cie,
    out: &mut Output,
) -> Result<Fde> {
    report_length(pos, length, extended, out);

    let mut s = Stream::new(reader, pos + header_len(extended));
    let cie_pointer = s.read_word()?;
    out.unsigned(s.offset - 4, 4, "CIE pointer", cie_pointer as u64);
    let pc_begin = s.read_word()?;
    out.unsigned(s.offset - 4, 4, "PC begin", pc_begin as u64);
    let pc_range = s.read_word()?;
    out.unsigned(s.offset - 4, 4, "PC range", pc_range as u64);

    let augmentation_data = augmentation_data(&mut s, &cie.augmentation, entry_end, out)?;
    let instructions = instructions(&s, entry_end, out)?;

    Ok(Fde {
        offset: pos,
        length,
        extended,
        cie_pointer,
        pc_begin,
        pc_range,
        augmentation_data,
        instructions,
    })
}

/// Returns the length of the augmentation data if the augmentation string says there
/// is some.
fn augmentation_data(
    s: &mut Stream,
    augmentation: &str,
    entry_end: u64,
    out: &mut Output,
) -> Result<Option<u64>> {
    if !augmentation.starts_with('z') {
        return Ok(None);
    }
    let (len, n) = leb128::decode_u64(s)?;
    out.unsigned(s.offset - n, n, "augmentation length", len);
    require(
        s.offset.checked_add(len).is_some_and(|e| e <= entry_end),
        "augmentation data runs past the end of the entry",
    )?;
    if len > 0 {
        out.field(s.offset, len, "augmentation data", Value::Opaque);
    }
    s.offset += len;
    Ok(Some(len))
}

fn instructions(s: &Stream, entry_end: u64, out: &mut Output) -> Result<u64> {
    require(s.offset <= entry_end, "fields run past the end of the entry")?;
    let len = entry_end - s.offset;
    if len > 0 {
        out.field(s.offset, len, "call frame instructions", Value::Opaque);
    }
    Ok(len)
}
