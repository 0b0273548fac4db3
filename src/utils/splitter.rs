//! Delimiter-aware scanning over query text.
//!
//! All helpers work on bytes: every delimiter they look for is ASCII, so the
//! offsets they return always fall on `char` boundaries.

/// Nesting state for a left-to-right scan.
#[derive(Debug, Default)]
struct Nesting {
    parens: usize,
    brackets: usize,
    single_quoted: bool,
    double_quoted: bool,
}

impl Nesting {
    /// Feeds one byte and reports whether it sits at top level, outside any
    /// quote. Quote characters themselves are never top level.
    fn advance(&mut self, byte: u8) -> bool {
        match byte {
            b'\'' if !self.double_quoted => {
                self.single_quoted = !self.single_quoted;
                return false;
            }
            b'"' if !self.single_quoted => {
                self.double_quoted = !self.double_quoted;
                return false;
            }
            _ => {}
        }

        if self.single_quoted || self.double_quoted {
            return false;
        }

        match byte {
            b'(' => self.parens += 1,
            b')' => self.parens = self.parens.saturating_sub(1),
            b'[' => self.brackets += 1,
            b']' => self.brackets = self.brackets.saturating_sub(1),
            _ => {}
        }

        self.parens == 0 && self.brackets == 0
    }
}

/// Split `text` at every top-level `separator`, ignoring separators inside
/// parentheses, brackets and quotes. Segments are trimmed; empty ones are
/// dropped.
pub fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    debug_assert!(separator.is_ascii());
    let sep = separator as u8;
    let mut nesting = Nesting::default();
    let mut parts = Vec::new();
    let mut start = 0;

    for (idx, &byte) in text.as_bytes().iter().enumerate() {
        if nesting.advance(byte) && byte == sep {
            push_segment(&mut parts, &text[start..idx]);
            start = idx + 1;
        }
    }
    push_segment(&mut parts, &text[start..]);

    parts
}

fn push_segment<'a>(parts: &mut Vec<&'a str>, segment: &'a str) {
    let segment = segment.trim();
    if !segment.is_empty() {
        parts.push(segment);
    }
}

/// Byte offset of the first top-level, case-insensitive occurrence of
/// `keyword`. Keywords carry their own surrounding spaces, e.g. `" where "`.
pub fn find_keyword(text: &str, keyword: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let needle = keyword.as_bytes();
    if needle.is_empty() || needle.len() > bytes.len() {
        return None;
    }

    let mut nesting = Nesting::default();
    for idx in 0..=bytes.len() - needle.len() {
        if nesting.advance(bytes[idx]) && bytes[idx..idx + needle.len()].eq_ignore_ascii_case(needle)
        {
            return Some(idx);
        }
    }
    None
}

/// Byte offset of the first top-level occurrence of `ch`.
pub fn find_top_level_char(text: &str, ch: char) -> Option<usize> {
    debug_assert!(ch.is_ascii());
    let target = ch as u8;
    let mut nesting = Nesting::default();
    text.as_bytes()
        .iter()
        .position(|&byte| nesting.advance(byte) && byte == target)
}
