//! Utilities for printing and everything related to "UI".

use std::{
    cmp::min,
    fmt,
    io::{stdout, Write},
    time::{Duration, Instant},
};

use term_painter::{Color, Style, ToStyle};


macro_rules! info {
    () => { info!("") };
    ($($t:tt)*) => {
        crate::ui::print_msg(crate::ui::MsgKind::Info, format_args!($($t)*))
    };
}

macro_rules! warn {
    () => { warn!("") };
    ($($t:tt)*) => {
        crate::ui::print_msg(crate::ui::MsgKind::Warning, format_args!($($t)*))
    };
}

macro_rules! error {
    () => { error!("") };
    ($($t:tt)*) => {
        crate::ui::print_msg(crate::ui::MsgKind::Error, format_args!($($t)*))
    };
}

/// Prints the message, evaluates the body and then marks the message as done,
/// with the time it took. Evaluates to the value of the body.
macro_rules! progress {
    ([$($t:tt)*] => $body:expr) => {{
        let progress = crate::ui::Progress::start(format_args!($($t)*));
        let out = $body;
        progress.finish();
        out
    }};
}


#[derive(Debug, Clone, Copy)]
pub enum MsgKind {
    Error,
    Warning,
    Info,
    Progress,
}

impl MsgKind {
    fn icon(&self) -> char {
        match self {
            MsgKind::Error => '!',
            MsgKind::Warning => 'w',
            MsgKind::Info => 'i',
            MsgKind::Progress => '…',
        }
    }

    pub fn icon_style(&self) -> Style {
        match self {
            MsgKind::Error => Color::Red.bold(),
            MsgKind::Warning => Color::Yellow.bold(),
            MsgKind::Info => Color::Blue.bold(),
            MsgKind::Progress => Color::Green.bold(),
        }
    }

    pub fn body_style(&self) -> Style {
        match self {
            MsgKind::Error => Color::BrightRed.to_style(),
            MsgKind::Warning => Color::BrightYellow.to_style(),
            MsgKind::Info => Color::NotSet.to_style(),
            MsgKind::Progress => Color::NotSet.to_style(),
        }
    }
}

/// Prints a message with an icon, rewrapped to the terminal width.
pub fn print_msg(kind: MsgKind, body: fmt::Arguments<'_>) {
    let line_len = min(100, term_size::dimensions().map(|(w, _)| w).unwrap_or(80)) - 7;
    let lines = wrap(&body.to_string(), line_len);

    let icon_style = kind.icon_style();
    icon_style.with(|| print!("[{}] ", kind.icon()));
    for (i, line) in lines.iter().enumerate() {
        let prefix = match i {
            0 => "",
            _ if i == lines.len() - 1 => "    └ ",
            _ => "    │ ",
        };

        println!("{}{}", icon_style.paint(prefix), kind.body_style().paint(line));
    }
}

/// Splits `body` into lines of at most `line_len` characters (unless a
/// single word is longer).
fn wrap(body: &str, line_len: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();
    for word in body.split_whitespace() {
        let len = current_line.chars().count();
        if len > 0 && len + word.chars().count() >= line_len {
            lines.push(current_line.trim_end().to_string());
            current_line.clear();
        }

        current_line.push_str(word);
        current_line.push(' ');
    }
    lines.push(current_line.trim_end().to_string());

    lines
}

/// A running task printed by `progress!`.
pub struct Progress {
    msg: String,
    started: Instant,
}

impl Progress {
    pub fn start(msg: fmt::Arguments<'_>) -> Self {
        let msg = msg.to_string();
        let kind = MsgKind::Progress;
        print!("{} {} ... ", kind.icon_style().paint("[…]"), kind.body_style().paint(&msg));
        let _ = stdout().flush();

        Self {
            msg,
            started: Instant::now(),
        }
    }

    pub fn finish(self) -> Duration {
        let time = self.started.elapsed();
        let kind = MsgKind::Progress;
        println!(
            "\r{} {} ... {} (in {:.2?})",
            kind.icon_style().paint("[✓]"),
            kind.body_style().paint(&self.msg),
            kind.icon_style().paint("done"),
            time,
        );

        time
    }
}

/// Formats the given integer with `,` as thousand separator.
pub fn fmt_with_thousand_sep(v: u64) -> String {
    let digits = v.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }

    out
}

/// Formats a number of bytes with a binary unit.
pub fn fmt_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];

    if bytes < 1024 {
        return format!("{} bytes", bytes);
    }

    let mut v = bytes as f64 / 1024.0;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }

    format!("{:.1} {}", v, UNITS[unit])
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousand_sep() {
        assert_eq!(fmt_with_thousand_sep(0), "0");
        assert_eq!(fmt_with_thousand_sep(999), "999");
        assert_eq!(fmt_with_thousand_sep(1000), "1,000");
        assert_eq!(fmt_with_thousand_sep(1_000_005), "1,000,005");
        assert_eq!(fmt_with_thousand_sep(1_234_567), "1,234,567");
    }

    #[test]
    fn bytes() {
        assert_eq!(fmt_bytes(50), "50 bytes");
        assert_eq!(fmt_bytes(2048), "2.0 KiB");
        assert_eq!(fmt_bytes(5 * 1024 * 1024 + 512 * 1024), "5.5 MiB");
    }

    #[test]
    fn wrapping() {
        assert_eq!(wrap("", 10), [""]);
        assert_eq!(wrap("a b c", 10), ["a b c"]);
        assert_eq!(wrap("aaaa bbbb cccc", 10), ["aaaa bbbb", "cccc"]);
        assert_eq!(wrap("averyveryverylongword x", 10), ["averyveryverylongword", "x"]);
    }
}
