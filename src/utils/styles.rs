//! Used to color and otherwise style various bits of output. Styling can be turned off
//! with --plain (and is also off when stdout isn't a terminal).
use nu_ansi_term::{AnsiString, Color, Style};
use std::sync::atomic::{AtomicBool, Ordering};

static PLAIN: AtomicBool = AtomicBool::new(false);

pub fn set_plain(plain: bool) {
    PLAIN.store(plain, Ordering::Relaxed);
}

fn paint(style: Style, s: String) -> AnsiString<'static> {
    if PLAIN.load(Ordering::Relaxed) {
        Style::new().paint(s)
    } else {
        style.paint(s)
    }
}

pub trait Styling {
    fn explain_title(self) -> AnsiString<'static>;
    fn explain_text(self) -> AnsiString<'static>;
    fn table_header(self) -> AnsiString<'static>;
    fn table_sep(self) -> AnsiString<'static>;
    fn table_field(self) -> AnsiString<'static>;
    fn note(self) -> AnsiString<'static>;
    fn warn(self) -> AnsiString<'static>;
    fn error(self) -> AnsiString<'static>;
}

impl Styling for String {
    fn explain_title(self) -> AnsiString<'static> {
        paint(Style::new().bold(), self)
    }

    fn explain_text(self) -> AnsiString<'static> {
        paint(Style::new().italic(), self)
    }

    fn table_header(self) -> AnsiString<'static> {
        paint(Style::new().bold().fg(Color::Blue), self)
    }

    fn table_sep(self) -> AnsiString<'static> {
        paint(Style::new().fg(Color::Blue), self)
    }

    fn table_field(self) -> AnsiString<'static> {
        paint(Style::new(), self)
    }

    fn note(self) -> AnsiString<'static> {
        paint(Style::new().fg(Color::Cyan), self)
    }

    fn warn(self) -> AnsiString<'static> {
        paint(Style::new().fg(Color::Yellow), self)
    }

    fn error(self) -> AnsiString<'static> {
        paint(Style::new().bold().fg(Color::Red), self)
    }
}

impl Styling for &str {
    fn explain_title(self) -> AnsiString<'static> {
        self.to_string().explain_title()
    }

    fn explain_text(self) -> AnsiString<'static> {
        self.to_string().explain_text()
    }

    fn table_header(self) -> AnsiString<'static> {
        self.to_string().table_header()
    }

    fn table_sep(self) -> AnsiString<'static> {
        self.to_string().table_sep()
    }

    fn table_field(self) -> AnsiString<'static> {
        self.to_string().table_field()
    }

    fn note(self) -> AnsiString<'static> {
        self.to_string().note()
    }

    fn warn(self) -> AnsiString<'static> {
        self.to_string().warn()
    }

    fn error(self) -> AnsiString<'static> {
        self.to_string().error()
    }
}
