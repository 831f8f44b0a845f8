//! Little Endian Base 128 variable length integers, used all over DWARF.
use crate::elf::Stream;
use crate::error::{ElfError, Result};

/// A u64 needs at most ceil(64 / 7) bytes.
pub const MAX_LEB128_LEN: u64 = 10;

/// Returns the value and the number of bytes consumed.
pub fn decode_u64(stream: &mut Stream) -> Result<(u64, u64)> {
    let start = stream.offset;
    let mut result = 0;
    let mut shift = 0;
    loop {
        if stream.offset - start >= MAX_LEB128_LEN {
            return Err(ElfError::Leb128Overflow(start));
        }
        let byte = stream.read_byte()? as u64;
        if shift < 64 {
            result |= (byte & 0x7F) << shift;
        }
        shift += 7;
        if (byte & 0x80) == 0 {
            break;
        }
    }
    Ok((result, stream.offset - start))
}

/// Returns the value and the number of bytes consumed.
pub fn decode_i64(stream: &mut Stream) -> Result<(i64, u64)> {
    let start = stream.offset;
    let mut result: i64 = 0;
    let mut shift = 0;
    let mut byte;
    loop {
        if stream.offset - start >= MAX_LEB128_LEN {
            return Err(ElfError::Leb128Overflow(start));
        }
        byte = stream.read_byte()?;
        if shift < 64 {
            result |= ((byte & 0x7F) as i64) << shift;
        }
        shift += 7;
        if (byte & 0x80) == 0 {
            break;
        }
    }
    if shift < 64 && (byte & 0x40) != 0 {
        result |= -1i64 << shift;
    }
    Ok((result, stream.offset - start))
}

#[cfg(test)]
pub fn encode_u64(mut value: u64) -> Vec<u8> {
    let mut bytes = Vec::new();
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            bytes.push(byte);
            return bytes;
        }
        bytes.push(byte | 0x80);
    }
}

#[cfg(test)]
pub fn encode_i64(mut value: i64) -> Vec<u8> {
    let mut bytes = Vec::new();
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        let done = (value == 0 && byte & 0x40 == 0) || (value == -1 && byte & 0x40 != 0);
        if done {
            bytes.push(byte);
            return bytes;
        }
        bytes.push(byte | 0x80);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::{Endianness, FileClass, Reader};

    fn unsigned(bytes: &[u8]) -> Result<(u64, u64)> {
        let r = Reader::new(bytes, FileClass::SixtyFour, Endianness::Little);
        decode_u64(&mut Stream::new(&r, 0))
    }

    fn signed(bytes: &[u8]) -> Result<(i64, u64)> {
        let r = Reader::new(bytes, FileClass::SixtyFour, Endianness::Little);
        decode_i64(&mut Stream::new(&r, 0))
    }

    #[test]
    fn known_values() {
        // examples from the DWARF standard, figures 22 and 23
        assert_eq!(unsigned(&[2]).unwrap(), (2, 1));
        assert_eq!(unsigned(&[127]).unwrap(), (127, 1));
        assert_eq!(unsigned(&[0x80, 1]).unwrap(), (128, 2));
        assert_eq!(unsigned(&[0x81, 1]).unwrap(), (129, 2));
        assert_eq!(unsigned(&[0xb9, 0x64]).unwrap(), (12857, 2));

        assert_eq!(signed(&[2]).unwrap(), (2, 1));
        assert_eq!(signed(&[0x7e]).unwrap(), (-2, 1));
        assert_eq!(signed(&[0xff, 0]).unwrap(), (127, 2));
        assert_eq!(signed(&[0x81, 0x7f]).unwrap(), (-127, 2));
        assert_eq!(signed(&[0x80, 1]).unwrap(), (128, 2));
        assert_eq!(signed(&[0x80, 0x7f]).unwrap(), (-128, 2));
    }

    #[test]
    fn round_trip() {
        let values = [0, 1, 63, 64, 127, 128, 300, 0xffff, 1 << 35, u64::MAX - 1, u64::MAX];
        for value in values {
            let bytes = encode_u64(value);
            let expected_len = (64 - value.leading_zeros()).max(1).div_ceil(7) as u64;
            assert_eq!(unsigned(&bytes).unwrap(), (value, expected_len), "{value}");
        }

        let values = [0, 1, -1, 63, -64, 64, -65, 1000, -1000, i64::MAX, i64::MIN];
        for value in values {
            let bytes = encode_i64(value);
            let (decoded, len) = signed(&bytes).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(len, bytes.len() as u64);
            // minimal: dropping the last byte would lose information
            let significant = if value < 0 { 64 - value.leading_ones() } else { 64 - value.leading_zeros() };
            assert_eq!(len, (significant as u64 + 1).div_ceil(7), "{value}");
        }
    }

    #[test]
    fn too_long() {
        let mut bytes = vec![0x80; 10];
        bytes.push(0);
        assert_eq!(unsigned(&bytes), Err(ElfError::Leb128Overflow(0)));
        assert_eq!(signed(&bytes), Err(ElfError::Leb128Overflow(0)));

        // ten bytes is fine
        let mut bytes = vec![0x80; 9];
        bytes.push(1);
        assert_eq!(unsigned(&bytes).unwrap(), (1 << 63, 10));
    }

    #[test]
    fn truncated() {
        assert!(unsigned(&[0x80, 0x80]).is_err());
    }
}
