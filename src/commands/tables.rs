//! Row tables for the commands. Cells are formatted and styled as they are added and
//! tabled lays them out.
use crate::utils::Styling;
use crate::utils::uwriteln;
use std::io::Write;
use tabled::{
    builder::Builder,
    settings::{Alignment, Padding, Style, object::Columns},
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Align {
    /// Names, flags, and other words.
    Text,

    /// Offsets, sizes, counts: these line up on their last digit.
    Number,
}

struct Column {
    header: String,
    help: String,
    align: Align,
}

/// One row per decoded item. With titles and explain they look like:
/// index  type       offset  file size  flags
/// -----  ----       ------  ---------  -----
///     0  LOAD            0        1f8  r-x
///     1  GNU_STACK       0          0  rw-
/// ...                                          if elided
///
/// index: program header index
/// type: the segment type
pub struct TableBuilder {
    cols: Vec<Column>,

    /// Cells are None until added. A row is started whenever the current one already has
    /// a value for the column being added.
    rows: Vec<Vec<Option<String>>>,
    elided: bool,
}

impl TableBuilder {
    pub fn new() -> TableBuilder {
        TableBuilder {
            cols: Vec::new(),
            rows: Vec::new(),
            elided: false,
        }
    }

    /// Left aligned column
    pub fn add_col_l(&mut self, header: &str, help: &str) {
        self.add_col(header, help, Align::Text);
    }

    /// Right aligned column
    pub fn add_col_r(&mut self, header: &str, help: &str) {
        self.add_col(header, help, Align::Number);
    }

    fn add_col(&mut self, header: &str, help: &str, align: Align) {
        debug_assert!(self.rows.is_empty(), "{header} was added after the first row");
        debug_assert!(!self.cols.iter().any(|c| c.header == header));
        self.cols.push(Column {
            header: header.to_string(),
            help: help.to_string(),
            align,
        });
    }

    /// Typically add_field! is used instead.
    pub fn add_str_field(&mut self, header: &str, value: String) {
        let Some(i) = self.cols.iter().position(|c| c.header == header) else {
            debug_assert!(false, "there is no {header} column");
            return;
        };
        if self.rows.last().is_none_or(|row| row[i].is_some()) {
            self.rows.push(vec![None; self.cols.len()]);
        }
        if let Some(row) = self.rows.last_mut() {
            row[i] = Some(value);
        }
    }

    /// Set when rows were left out because of --max-results.
    pub fn elided(&mut self, elided: bool) {
        self.elided = elided;
    }

    pub fn writeln(&self, mut out: impl Write, titles: bool, explain: bool) {
        if self.rows.is_empty() {
            uwriteln!(out, "none");
        } else {
            let mut records: Vec<Vec<String>> = Vec::with_capacity(self.rows.len() + 2);
            if titles {
                records.push(
                    self.cols
                        .iter()
                        .map(|c| c.header.as_str().table_header().to_string())
                        .collect(),
                );
                records.push(
                    self.cols
                        .iter()
                        .map(|c| "-".repeat(c.header.len()).table_sep().to_string())
                        .collect(),
                );
            }
            for row in self.rows.iter() {
                records.push(row.iter().map(|cell| cell.clone().unwrap_or_default()).collect());
            }
            let aligns: Vec<Align> = self.cols.iter().map(|c| c.align).collect();
            uwriteln!(out, "{}", render(records, &aligns));
            if self.elided {
                uwriteln!(out, "...");
            }
        }

        if explain {
            uwriteln!(out);
            write_help(out, self.cols.iter().map(|c| (c.header.as_str(), c.help.as_str())));
        }
    }
}

/// Name and value pairs, no titles:
/// class   ELF64
/// data    little endian
///
/// class: 32 or 64-bit                   if explain
/// data: byte order used by every field after the identification bytes
pub struct SimpleTableBuilder {
    /// name, value, help
    rows: Vec<(String, String, String)>,
}

impl SimpleTableBuilder {
    pub fn new() -> SimpleTableBuilder {
        SimpleTableBuilder { rows: Vec::new() }
    }

    /// Typically add_simple! is used instead.
    pub fn add_str_row(&mut self, name: &str, value: String, help: &str) {
        self.rows.push((name.to_string(), value, help.to_string()));
    }

    pub fn writeln(&self, mut out: impl Write, explain: bool) {
        let records = self
            .rows
            .iter()
            .map(|(name, value, _)| vec![name.clone(), value.clone()])
            .collect();
        uwriteln!(out, "{}", render(records, &[Align::Text, Align::Text]));

        if explain {
            uwriteln!(out);
            write_help(out, self.rows.iter().map(|(name, _, help)| (name.as_str(), help.as_str())));
        }
    }
}

fn render(records: Vec<Vec<String>>, aligns: &[Align]) -> String {
    let mut builder = Builder::with_capacity(records.len(), aligns.len());
    for record in records {
        // tabled mangles the layout when a cell is empty
        let record = record
            .into_iter()
            .map(|cell| if cell.is_empty() { " ".to_string() } else { cell });
        builder.push_record(record);
    }

    let mut table = builder.build();
    for (i, align) in aligns.iter().enumerate() {
        let alignment = match align {
            Align::Text => Alignment::left(),
            Align::Number => Alignment::right(),
        };
        table.modify(Columns::one(i), alignment);
    }
    table.modify(Columns::first(), Padding::new(0, 1, 0, 0));
    table.with(Style::empty());
    table.to_string()
}

fn write_help<'a>(mut out: impl Write, lines: impl Iterator<Item = (&'a str, &'a str)>) {
    for (name, help) in lines {
        uwriteln!(out, "{}: {}", name.explain_title(), help.explain_text());
    }
}

/// Formats and styles one table cell.
macro_rules! cell {
    ($format:literal, $value:expr) => {
        format!($format, $value).table_field().to_string()
    };
    ($value:expr) => {
        format!("{}", $value).table_field().to_string()
    };
}
pub(crate) use cell;

macro_rules! add_field {
    ($builder:ident, $header:literal, $format:literal, $value:expr) => {
        $builder.add_str_field($header, $crate::commands::tables::cell!($format, $value))
    };
    ($builder:ident, $header:literal, $value:expr) => {
        $builder.add_str_field($header, $crate::commands::tables::cell!($value))
    };
}
pub(crate) use add_field;

macro_rules! add_simple {
    ($builder:ident, $name:literal, $format:literal, $value:expr, $help:expr) => {
        $builder.add_str_row($name, $crate::commands::tables::cell!($format, $value), $help)
    };
    ($builder:ident, $name:literal, $value:expr, $help:expr) => {
        $builder.add_str_row($name, $crate::commands::tables::cell!($value), $help)
    };
}
pub(crate) use add_simple;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::strip_escapes;

    fn text(f: impl FnOnce(&mut Vec<u8>)) -> String {
        let mut v: Vec<u8> = Vec::new();
        f(&mut v);
        strip_escapes(&String::from_utf8(v).unwrap())
    }

    fn words(line: &str) -> Vec<&str> {
        line.split_whitespace().collect()
    }

    #[test]
    fn rows_and_gaps() {
        let mut b = TableBuilder::new();
        b.add_col_r("offset", "where it starts");
        b.add_col_l("name", "what it is");
        add_field!(b, "offset", "{:x}", 0x10u64);
        add_field!(b, "name", ".text");
        add_field!(b, "offset", "{:x}", 0x200u64); // no name for this one
        b.elided(true);

        let s = text(|v| b.writeln(v, true, true));
        let lines: Vec<&str> = s.lines().collect();
        assert_eq!(words(lines[0]), vec!["offset", "name"]);
        assert_eq!(words(lines[1]), vec!["------", "----"]);
        assert_eq!(words(lines[2]), vec!["10", ".text"]);
        assert_eq!(words(lines[3]), vec!["200"]);
        assert_eq!(lines[4], "...");
        assert_eq!(lines[5], "");
        assert_eq!(lines[6], "offset: where it starts");
        assert_eq!(lines[7], "name: what it is");
        assert_eq!(lines.len(), 8);
    }

    #[test]
    fn no_rows() {
        let mut b = TableBuilder::new();
        b.add_col_l("name", "what it is");
        b.elided(true);
        assert_eq!(text(|v| b.writeln(v, true, false)), "none\n");
    }

    #[test]
    fn simple() {
        let mut b = SimpleTableBuilder::new();
        add_simple!(b, "class", "ELF32", "address width");
        add_simple!(b, "entry", "{:#x}", 0x1000u64, "where execution starts");

        let s = text(|v| b.writeln(v, false));
        let lines: Vec<&str> = s.lines().collect();
        assert_eq!(words(lines[0]), vec!["class", "ELF32"]);
        assert_eq!(words(lines[1]), vec!["entry", "0x1000"]);
        assert_eq!(lines.len(), 2);

        let s = text(|v| b.writeln(v, true));
        assert!(s.ends_with("\nclass: address width\nentry: where execution starts\n"));
    }
}
