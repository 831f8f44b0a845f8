//! The one byte DW_EH_PE_* pointer encodings used by .eh_frame_hdr and augmentation
//! data. See the LSB's "Exception Frames" chapter.
use super::leb128;
use crate::elf::Stream;
use crate::error::Result;

pub const DW_EH_PE_OMIT: u8 = 0xff;

/// How many bytes an encoded field occupies.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldLength {
    Fixed(u64),
    Uleb128,
    Sleb128,

    /// The field isn't present at all.
    Omitted,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PointerEncoding(pub u8);

impl PointerEncoding {
    pub fn is_omitted(self) -> bool {
        self.0 == DW_EH_PE_OMIT
    }

    /// Lower nibble.
    pub fn format(self) -> u8 {
        self.0 & 0x0f
    }

    /// Upper nibble. How the value is to be applied, which we only report.
    pub fn application(self) -> u8 {
        self.0 & 0xf0
    }

    pub fn is_signed(self) -> bool {
        matches!(self.format(), 0x09..=0x0c)
    }

    /// Unknown formats fall back to the register width, as absptr does.
    pub fn length(self, register_width: u64) -> FieldLength {
        if self.is_omitted() {
            return FieldLength::Omitted;
        }
        match self.format() {
            0x00 => FieldLength::Fixed(register_width), // absptr
            0x01 => FieldLength::Uleb128,
            0x02 | 0x0a => FieldLength::Fixed(2),
            0x03 | 0x0b => FieldLength::Fixed(4),
            0x04 | 0x0c => FieldLength::Fixed(8),
            0x09 => FieldLength::Sleb128,
            _ => FieldLength::Fixed(register_width),
        }
    }

    pub fn format_name(self) -> &'static str {
        if self.is_omitted() {
            return "omit";
        }
        match self.format() {
            0x00 => "absptr",
            0x01 => "uleb128",
            0x02 => "udata2",
            0x03 => "udata4",
            0x04 => "udata8",
            0x09 => "sleb128",
            0x0a => "sdata2",
            0x0b => "sdata4",
            0x0c => "sdata8",
            _ => "unknown",
        }
    }

    pub fn application_name(self) -> &'static str {
        if self.is_omitted() {
            return "omit";
        }
        match self.application() & 0x70 {
            0x00 => "absolute",
            0x10 => "pcrel",
            0x20 => "textrel",
            0x30 => "datarel",
            0x40 => "funcrel",
            0x50 => "aligned",
            _ => "unknown",
        }
    }

    pub fn is_indirect(self) -> bool {
        !self.is_omitted() && self.application() & 0x80 != 0
    }

    pub fn name(self) -> String {
        if self.is_omitted() {
            "omit".to_string()
        } else if self.is_indirect() {
            format!("indirect {} {}", self.application_name(), self.format_name())
        } else {
            format!("{} {}", self.application_name(), self.format_name())
        }
    }
}

/// A value read using a pointer encoding. Signed formats are sign extended into the
/// u64. The application is never resolved into an actual address.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EncodedValue {
    pub offset: u64,
    pub size: u64,
    pub value: u64,
}

/// Returns None if the encoding says the field is omitted.
pub fn read_encoded(stream: &mut Stream, encoding: PointerEncoding) -> Result<Option<EncodedValue>> {
    let offset = stream.offset;
    let value = match encoding.length(stream.reader.register_width()) {
        FieldLength::Omitted => return Ok(None),
        FieldLength::Uleb128 => leb128::decode_u64(stream)?.0,
        FieldLength::Sleb128 => leb128::decode_i64(stream)?.0 as u64,
        FieldLength::Fixed(width) if encoding.is_signed() => stream.read_int(width)? as u64,
        FieldLength::Fixed(width) => stream.read_uint(width)?,
    };
    Ok(Some(EncodedValue {
        offset,
        size: stream.offset - offset,
        value,
    }))
}
