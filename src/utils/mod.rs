pub mod styles;

pub use styles::*;

/// writeln! for console output: there is nothing useful to do if stdout has gone away.
macro_rules! uwriteln {
    ($dst:expr) => {{
        let _ = writeln!($dst);
    }};
    ($dst:expr, $($arg:tt)*) => {{
        let _ = writeln!($dst, $($arg)*);
    }};
}
pub(crate) use uwriteln;

pub fn warn(mesg: &str) {
    eprintln!("{}", mesg.warn());
}

/// Remove escape sequences from the string (e.g. for colors).
#[cfg(test)]
pub fn strip_escapes(s: &str) -> String {
    // Even with Style::empty() the tabled crate can add escape sequences to the end of
    // lines to reset all modes so it's simplest to strip them here.
    let mut result = String::with_capacity(s.len());
    let mut escaping = false;

    // Escape sequences can be fairly gnarly, e.g. for RGB colors.
    // See https://gist.github.com/fnky/458719343aabd01cfb17a3a4f7296797
    for c in s.chars() {
        if c == '\x1b' {
            escaping = true;
        } else if escaping {
            if c == 'm' {
                escaping = false;
            }
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips() {
        let s = format!("{} and {}", "one".warn(), "two".table_header());
        assert_eq!(strip_escapes(&s), "one and two");
    }
}
