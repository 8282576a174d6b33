//! Code-frame rendering.

use crate::Location;
use nu_ansi_term::{Color, Style};

/// Lines of context shown above the first marked line.
pub const LINES_ABOVE: u32 = 2;
/// Lines of context shown below the last marked line.
pub const LINES_BELOW: u32 = 3;

/// A rendered snippet of source text around a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeFrame {
    /// The frame with ANSI styling, for terminals.
    pub styled: String,
    /// The same frame without any styling, for the overlay.
    pub plain: String,
}

/// Renders a code frame for `location` in `text`.
///
/// Returns `None` for empty text or when the location starts past the last
/// line.
pub fn render(text: &str, location: &Location) -> Option<CodeFrame> {
    if text.is_empty() {
        return None;
    }

    let lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    let start_line = location.start_line.max(1);
    if start_line as usize > lines.len() {
        return None;
    }

    Some(CodeFrame {
        styled: render_with(&lines, location, &Palette::styled()),
        plain: render_with(&lines, location, &Palette::plain()),
    })
}

struct Palette {
    gutter: Option<Style>,
    marker: Option<Style>,
}

impl Palette {
    fn styled() -> Self {
        Self {
            gutter: Some(Style::new().fg(Color::DarkGray)),
            marker: Some(Color::Red.bold()),
        }
    }

    fn plain() -> Self {
        Self {
            gutter: None,
            marker: None,
        }
    }

    fn gutter(&self, text: &str) -> String {
        paint(self.gutter, text)
    }

    fn marker(&self, text: &str) -> String {
        paint(self.marker, text)
    }
}

fn paint(style: Option<Style>, text: &str) -> String {
    match style {
        Some(style) => style.paint(text).to_string(),
        None => text.to_string(),
    }
}

fn render_with(lines: &[&str], location: &Location, palette: &Palette) -> String {
    let start_line = location.start_line.max(1);
    let last_line = location.last_line().max(start_line);

    let first_shown = start_line.saturating_sub(LINES_ABOVE).max(1);
    let last_shown = (last_line + LINES_BELOW).min(lines.len() as u32);
    let width = last_shown.to_string().len();

    let mut out = Vec::new();
    for number in first_shown..=last_shown {
        let source = lines[(number - 1) as usize];
        let gutter = format!(" {:>width$} |", number);
        let body = if source.is_empty() {
            String::new()
        } else {
            format!(" {source}")
        };

        match marker_span(location, number, start_line, last_line, source) {
            Some((column, count)) => {
                out.push(format!(
                    "  {}{}{}",
                    palette.marker(">"),
                    palette.gutter(&gutter),
                    body
                ));

                let spacing: String = source
                    .chars()
                    .take(column.saturating_sub(1) as usize)
                    .map(|c| if c == '\t' { '\t' } else { ' ' })
                    .collect();
                let blank_gutter = format!(" {} |", " ".repeat(width));
                out.push(format!(
                    "   {} {}{}",
                    palette.gutter(&blank_gutter),
                    spacing,
                    palette.marker(&"^".repeat(count.max(1) as usize))
                ));
            }
            None => out.push(format!("   {}{}", palette.gutter(&gutter), body)),
        }
    }

    out.join("\n")
}

/// Returns the 1-based column and marker count for a marked line.
fn marker_span(
    location: &Location,
    number: u32,
    start_line: u32,
    last_line: u32,
    source: &str,
) -> Option<(u32, u32)> {
    if number < start_line || number > last_line {
        return None;
    }

    let length = source.chars().count() as u32;
    let start_column = location.start_column.max(1);

    if start_line == last_line {
        let count = location.end_column.saturating_sub(start_column);
        return Some((start_column, count));
    }

    if number == start_line {
        Some((start_column, (length + 1).saturating_sub(start_column)))
    } else if number == last_line {
        Some((1, location.end_column))
    } else {
        Some((1, length))
    }
}
