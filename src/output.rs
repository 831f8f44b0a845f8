//! The decoder's sink. Walkers report decoded fields, diagnostics, and the byte ranges
//! the file claims. Nothing here knows how any of it will be displayed.
use crate::elf::SegmentExtent;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Unsigned(u64),
    Signed(i64),

    /// A raw value along with its symbolic interpretation, e.g. 1 and "LOAD".
    Named { raw: u64, name: String },

    Text(String),

    /// Bytes we locate but don't interpret, e.g. call frame instructions.
    Opaque,

    /// A container for the fields that follow it (at a greater depth).
    Record(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Unsigned(n) => write!(f, "{n:#x}"),
            Value::Signed(n) => write!(f, "{n}"),
            Value::Named { raw, name } => write!(f, "{name} ({raw:#x})"),
            Value::Text(s) => write!(f, "\"{s}\""),
            Value::Opaque => f.write_str("..."),
            Value::Record(s) => f.write_str(s),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub offset: u64,
    pub size: u64,
    pub depth: u8,
    pub label: String,
    pub value: Value,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Note,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Note => f.write_str("note"),
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub offset: Option<u64>,
    pub size: u64,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "{} at {offset:#x}: {}", self.severity, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Handle for a record opened with Output::open.
#[derive(Clone, Copy, Debug)]
pub struct RecordId(usize);

#[derive(Default)]
pub struct Output {
    pub fields: Vec<Field>,
    pub diagnostics: Vec<Diagnostic>,
    pub extents: Vec<SegmentExtent>,
    depth: u8,
}

impl Output {
    pub fn new() -> Self {
        Output::default()
    }

    pub fn field(&mut self, offset: u64, size: u64, label: impl Into<String>, value: Value) {
        self.fields.push(Field {
            offset,
            size,
            depth: self.depth,
            label: label.into(),
            value,
        });
    }

    pub fn unsigned(&mut self, offset: u64, size: u64, label: impl Into<String>, value: u64) {
        self.field(offset, size, label, Value::Unsigned(value));
    }

    pub fn named(
        &mut self,
        offset: u64,
        size: u64,
        label: impl Into<String>,
        raw: u64,
        name: impl Into<String>,
    ) {
        let name = name.into();
        self.field(offset, size, label, Value::Named { raw, name });
    }

    /// Starts a record. Fields added before the matching close are nested under it.
    pub fn open(&mut self, offset: u64, label: impl Into<String>, summary: impl Into<String>) -> RecordId {
        let id = RecordId(self.fields.len());
        self.field(offset, 0, label, Value::Record(summary.into()));
        self.depth = self.depth.saturating_add(1);
        id
    }

    /// Ends a record, setting its size to cover everything up to end.
    pub fn close(&mut self, id: RecordId, end: u64) {
        let record = &mut self.fields[id.0];
        record.size = end.saturating_sub(record.offset);
        self.depth = record.depth;
    }

    /// Replaces the summary text of an open (or closed) record.
    pub fn summarize(&mut self, id: RecordId, summary: impl Into<String>) {
        self.fields[id.0].value = Value::Record(summary.into());
    }

    /// Records a byte range claimed by the file's structure.
    pub fn extent(&mut self, offset: u64, size: u64, label: impl Into<String>) {
        self.extents.push(SegmentExtent {
            offset,
            size,
            label: label.into(),
        });
    }

    pub fn diagnostic(&mut self, severity: Severity, offset: Option<u64>, size: u64, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(%severity, ?offset, "{message}");
        self.diagnostics.push(Diagnostic {
            severity,
            offset,
            size,
            message,
        });
    }

    pub fn note(&mut self, offset: u64, size: u64, message: impl Into<String>) {
        self.diagnostic(Severity::Note, Some(offset), size, message);
    }

    pub fn warn(&mut self, offset: u64, size: u64, message: impl Into<String>) {
        self.diagnostic(Severity::Warning, Some(offset), size, message);
    }

    pub fn error(&mut self, offset: u64, size: u64, message: impl Into<String>) {
        self.diagnostic(Severity::Error, Some(offset), size, message);
    }

    #[cfg(test)]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_nest() {
        let mut out = Output::new();
        out.unsigned(0, 4, "before", 1);
        let id = out.open(4, "entry", "entry 0");
        out.unsigned(4, 4, "inner", 2);
        out.close(id, 12);
        out.unsigned(12, 4, "after", 3);

        let depths: Vec<u8> = out.fields.iter().map(|f| f.depth).collect();
        assert_eq!(depths, vec![0, 0, 1, 0]);
        assert_eq!(out.fields[1].size, 8);
    }

    #[test]
    fn display() {
        let value = Value::Named {
            raw: 1,
            name: "LOAD".to_string(),
        };
        assert_eq!(value.to_string(), "LOAD (0x1)");

        let mut out = Output::new();
        out.warn(0x10, 4, "odd");
        assert_eq!(out.diagnostics[0].to_string(), "warning at 0x10: odd");
        assert_eq!(out.count(Severity::Warning), 1);
        assert_eq!(out.count(Severity::Error), 0);
    }
}
