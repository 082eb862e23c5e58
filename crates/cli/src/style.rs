//! Terminal styling for status lines and the run summary.

use console::Style;

/// Tone of a status line.
#[derive(Debug, Clone, Copy)]
pub enum Tone {
    Ok,
    Warn,
    Fail,
}

/// A status line prefixed with a colored marker.
pub fn line(tone: Tone, msg: &str) -> String {
    let (marker, style) = match tone {
        Tone::Ok => ("✓", Style::new().green()),
        Tone::Warn => ("⚠", Style::new().yellow()),
        Tone::Fail => ("✗", Style::new().red()),
    };
    format!("{} {}", style.apply_to(marker), msg)
}

pub fn header(msg: &str) -> String {
    Style::new().bold().apply_to(msg).to_string()
}

pub fn dim(msg: &str) -> String {
    Style::new().dim().apply_to(msg).to_string()
}
