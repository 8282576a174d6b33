//! tsc output parser.

use camino::{Utf8Path, Utf8PathBuf};
use checker_diagnostics::{CompilerDiagnostic, MessageChain, MessageText};
use code_frame::{LineCol, LineIndex};
use std::collections::HashMap;

/// Parses `tsc --pretty false` output into compiler diagnostics.
///
/// Relative paths are resolved against `root`. Each referenced file is read
/// once to convert line/column pairs into offsets; an unreadable file yields
/// diagnostics without a position.
pub fn parse_tsc_output(output: &str, root: &Utf8Path) -> Vec<CompilerDiagnostic> {
    let mut texts: HashMap<Utf8PathBuf, Option<String>> = HashMap::new();
    let mut diagnostics = Vec::new();
    let mut current: Option<Pending> = None;

    // tsc outputs diagnostics in the format:
    // file.ts(line,column): error TS1234: message
    //   elaboration, indented two spaces per level
    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }

        if line.starts_with(' ') {
            if let Some(pending) = current.as_mut() {
                let trimmed = line.trim_start();
                let depth = (line.len() - trimmed.len()) / 2;
                pending.details.push((depth.max(1), trimmed.to_string()));
            }
            continue;
        }

        if let Some(pending) = current.take() {
            diagnostics.push(pending.finish(&mut texts));
        }
        current = parse_header(line, root);
    }

    if let Some(pending) = current.take() {
        diagnostics.push(pending.finish(&mut texts));
    }

    diagnostics
}

/// A diagnostic whose elaboration lines may still follow.
struct Pending {
    file: Option<Utf8PathBuf>,
    position: Option<(u32, u32)>,
    category: u8,
    code: u32,
    message: String,
    details: Vec<(usize, String)>,
}

impl Pending {
    fn finish(self, texts: &mut HashMap<Utf8PathBuf, Option<String>>) -> CompilerDiagnostic {
        let file_text = self.file.as_ref().and_then(|file| {
            texts
                .entry(file.clone())
                .or_insert_with(|| std::fs::read_to_string(file).ok())
                .clone()
        });

        let (start, length) = match (self.position, file_text.as_deref()) {
            (Some((line, column)), Some(text)) => {
                let index = LineIndex::new(text);
                let offset = index
                    .offset(LineCol::new(line.saturating_sub(1), 0))
                    .map(u32::from)
                    .map(|line_start| {
                        let line_text = text
                            .get(line_start as usize..)
                            .and_then(|rest| rest.split('\n').next())
                            .unwrap_or_default();
                        line_start + utf16_column_to_byte(line_text, column.saturating_sub(1))
                    });
                let length =
                    offset.map(|o| text.get(o as usize..).map(token_length).unwrap_or(1));
                (offset, length)
            }
            _ => (None, None),
        };

        CompilerDiagnostic {
            file_name: self.file.map(|f| f.to_string()),
            file_text,
            start,
            length,
            message_text: build_message(self.message, self.details),
            category: self.category,
            code: self.code,
        }
    }
}

fn parse_header(line: &str, root: &Utf8Path) -> Option<Pending> {
    if let Some((category, code, message)) = parse_category_and_code(line) {
        return Some(Pending {
            file: None,
            position: None,
            category,
            code,
            message,
            details: Vec::new(),
        });
    }

    // The path may itself contain "): ", so try every candidate split.
    for (split, _) in line.match_indices("): ") {
        let location = &line[..split];
        let Some(open) = location.rfind('(') else {
            continue;
        };
        let Some((line_num, column)) = location[open + 1..].split_once(',') else {
            continue;
        };
        let (Ok(line_num), Ok(column)) = (line_num.parse::<u32>(), column.parse::<u32>()) else {
            continue;
        };
        let Some((category, code, message)) = parse_category_and_code(&line[split + 3..]) else {
            continue;
        };

        return Some(Pending {
            file: Some(root.join(&location[..open])),
            position: Some((line_num, column)),
            category,
            code,
            message,
            details: Vec::new(),
        });
    }

    None
}

/// Parses `error TS2322: message`.
fn parse_category_and_code(text: &str) -> Option<(u8, u32, String)> {
    let (category, rest) = text.split_once(' ')?;
    let category = match category {
        "warning" => 0,
        "error" => 1,
        "suggestion" => 2,
        "message" => 3,
        _ => return None,
    };

    let rest = rest.strip_prefix("TS")?;
    let (code, message) = rest.split_once(':')?;
    let code = code.parse().ok()?;

    Some((category, code, message.trim().to_string()))
}

/// Converts a 0-based UTF-16 column, as tsc counts it, into a byte column.
///
/// Columns past the end of the line clamp to the line's length.
fn utf16_column_to_byte(line: &str, column: u32) -> u32 {
    let mut units = 0;
    for (byte, c) in line.char_indices() {
        if units >= column {
            return byte as u32;
        }
        units += c.len_utf16() as u32;
    }
    line.len() as u32
}

/// Length of the identifier-like token at the start of `text`, at least 1.
fn token_length(text: &str) -> u32 {
    let length: usize = text
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '$')
        .map(char::len_utf8)
        .sum();
    length.max(1) as u32
}

fn build_message(head: String, details: Vec<(usize, String)>) -> MessageText {
    if details.is_empty() {
        return MessageText::Text(head);
    }

    let mut root = MessageChain::new(head);
    for (depth, text) in details {
        let mut node = &mut root;
        for _ in 1..depth {
            if node.next.is_empty() {
                break;
            }
            let last = node.next.len() - 1;
            node = &mut node.next[last];
        }
        node.next.push(MessageChain::new(text));
    }

    MessageText::Chain(root)
}
