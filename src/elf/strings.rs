use super::Reader;
use crate::output::{Output, Value};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StringEntry {
    /// Ordinal within the table.
    pub index: usize,

    /// File offset of the first byte.
    pub offset: u64,

    pub value: String,
}

/// Splits a STRTAB section into its NUL terminated strings. Returns the strings and the
/// offset just past the last one.
pub fn scan_strings(
    reader: &Reader,
    offset: u64,
    size: u64,
    max_entries: usize,
    out: &mut Output,
) -> (Vec<StringEntry>, u64) {
    let end = offset.saturating_add(size).min(reader.len());
    let mut strings = Vec::new();
    let mut pos = offset;
    while pos < end {
        if strings.len() == max_entries {
            out.warn(pos, end - pos, format!("string table limited to {max_entries} strings"));
            break;
        }
        let s = match reader.read_cstr(pos, end) {
            Ok(s) => s,
            Err(err) => {
                out.error(pos, end - pos, format!("bad string: {err}"));
                break;
            }
        };
        let consumed = s.consumed();
        if !s.terminated {
            out.warn(pos, consumed, "string is missing its terminator");
        }
        out.field(pos, consumed, format!("string {}", strings.len()), Value::Text(s.value.clone()));
        strings.push(StringEntry {
            index: strings.len(),
            offset: pos,
            value: s.value,
        });
        pos += consumed;
    }
    (strings, pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::{Endianness, FileClass};
    use crate::output::Severity;

    fn scan(bytes: &[u8], offset: u64, size: u64) -> (Vec<StringEntry>, u64, Output) {
        let reader = Reader::new(bytes, FileClass::SixtyFour, Endianness::Little);
        let mut out = Output::new();
        let (strings, end) = scan_strings(&reader, offset, size, 1000, &mut out);
        (strings, end, out)
    }

    #[test]
    fn tiles_the_section() {
        let bytes = b"junk\0.text\0\0.data\0.rodata\0more";
        let (strings, end, out) = scan(bytes, 5, 21);

        assert!(out.diagnostics.is_empty());
        assert_eq!(end, 26);
        let values: Vec<&str> = strings.iter().map(|s| s.value.as_str()).collect();
        assert_eq!(values, vec![".text", "", ".data", ".rodata"]);

        // offsets strictly increase and each string (plus terminator) ends where the
        // next one starts
        let mut expected = 5;
        for s in &strings {
            assert_eq!(s.offset, expected);
            expected += s.value.len() as u64 + 1;
        }
        assert_eq!(expected, 5 + 21);
    }

    #[test]
    fn unterminated() {
        let bytes = b"\0abc";
        let (strings, end, out) = scan(bytes, 0, 4);

        assert_eq!(strings.len(), 2);
        assert_eq!(strings[1].value, "abc");
        assert_eq!(end, 4);
        assert_eq!(out.count(Severity::Warning), 1);
    }

    #[test]
    fn limited() {
        let bytes = b"a\0b\0c\0";
        let reader = Reader::new(bytes, FileClass::ThirtyTwo, Endianness::Little);
        let mut out = Output::new();
        let (strings, end) = scan_strings(&reader, 0, 6, 2, &mut out);

        assert_eq!(strings.len(), 2);
        assert_eq!(end, 4);
        assert_eq!(out.count(Severity::Warning), 1);
    }
}
