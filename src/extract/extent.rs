//! Position helpers over comment-stripped lines.
//!
//! Positions are (line index, byte column). Columns always address the
//! stripped text, which shares byte offsets with the raw text.

use crate::scanner::SourceLine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Pos {
    pub line: usize,
    pub col: usize,
}

impl Pos {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// Characters of `lines[from..=last]` starting at `from`, with positions.
fn chars_from<'a>(
    lines: &'a [SourceLine],
    from: Pos,
    last: usize,
) -> impl Iterator<Item = (Pos, char)> + 'a {
    let last = last.min(lines.len().saturating_sub(1));
    (from.line..=last).flat_map(move |idx| {
        let code = lines.get(idx).map(|l| l.code.as_str()).unwrap_or("");
        let start = if idx == from.line { from.col } else { 0 };
        code.get(start..)
            .unwrap_or("")
            .char_indices()
            .map(move |(i, ch)| (Pos::new(idx, start + i), ch))
    })
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// First `{` at relative depth zero, or the first occurrence of one of the
/// `stop_words` at relative depth zero, whichever comes first.
pub fn find_opener_or_word(
    lines: &[SourceLine],
    from: Pos,
    last: usize,
    stop_words: &[&str],
) -> Option<(Pos, Option<&'static str>)> {
    let mut depth: usize = 0;
    let mut prev_word_char = false;

    for (pos, ch) in chars_from(lines, from, last) {
        match ch {
            '{' if depth == 0 => return Some((pos, None)),
            '{' | '(' | '[' => depth += 1,
            '}' | ')' | ']' => depth = depth.saturating_sub(1),
            _ => {}
        }

        if depth == 0 && !prev_word_char && is_word_char(ch) {
            if let Some(word) = word_at(lines, pos) {
                if let Some(stop) = STOP_WORDS.iter().find(|w| **w == word) {
                    if stop_words.contains(stop) {
                        return Some((pos, Some(*stop)));
                    }
                }
            }
        }
        prev_word_char = is_word_char(ch);
    }

    None
}

/// Words the extractor splits declarations on.
const STOP_WORDS: &[&str] = &["by", "satisfy", "constraint"];

/// First `{` at relative depth zero.
pub fn find_opener(lines: &[SourceLine], from: Pos, last: usize) -> Option<Pos> {
    find_opener_or_word(lines, from, last, &[]).map(|(pos, _)| pos)
}

/// Position of the delimiter closing the one opened at `open`.
pub fn matching_close(lines: &[SourceLine], open: Pos, last: usize) -> Option<Pos> {
    let mut depth: usize = 0;
    for (pos, ch) in chars_from(lines, open, last) {
        match ch {
            '{' | '(' | '[' => depth += 1,
            '}' | ')' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(pos);
                }
            }
            _ => {}
        }
    }
    None
}

/// Next non-whitespace position at or after `from`.
pub fn next_token(lines: &[SourceLine], from: Pos, last: usize) -> Option<Pos> {
    chars_from(lines, from, last)
        .find(|(_, ch)| !ch.is_whitespace())
        .map(|(pos, _)| pos)
}

/// The identifier starting at `pos`, if any.
pub fn word_at(lines: &[SourceLine], pos: Pos) -> Option<&str> {
    let code = lines.get(pos.line)?.code.get(pos.col..)?;
    let end = code
        .char_indices()
        .find(|(_, ch)| !is_word_char(*ch))
        .map_or(code.len(), |(i, _)| i);
    (end > 0).then(|| &code[..end])
}

/// Position just past `pos`'s character.
pub fn after(lines: &[SourceLine], pos: Pos) -> Pos {
    let width = lines
        .get(pos.line)
        .and_then(|l| l.code.get(pos.col..))
        .and_then(|rest| rest.chars().next())
        .map_or(1, char::len_utf8);
    Pos::new(pos.line, pos.col + width)
}

/// Raw text in `[start, end)`.
pub fn slice_raw(lines: &[SourceLine], start: Pos, end: Pos) -> String {
    slice(lines, start, end, |l| &l.raw)
}

/// Comment-stripped text in `[start, end)`.
pub fn slice_code(lines: &[SourceLine], start: Pos, end: Pos) -> String {
    slice(lines, start, end, |l| &l.code)
}

fn slice(
    lines: &[SourceLine],
    start: Pos,
    end: Pos,
    text: impl Fn(&SourceLine) -> &String,
) -> String {
    if end < start {
        return String::new();
    }
    let mut parts = Vec::new();
    for idx in start.line..=end.line {
        let Some(line) = lines.get(idx) else {
            break;
        };
        let full = text(line);
        let from = if idx == start.line { start.col } else { 0 };
        let to = if idx == end.line { end.col } else { full.len() };
        parts.push(full.get(from..to.min(full.len())).unwrap_or(""));
    }
    parts.join("\n")
}

/// Remove the common leading indentation of non-blank lines and trim blank
/// lines at either end.
pub fn dedent(text: &str) -> String {
    let indent = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    let lines: Vec<&str> = text
        .lines()
        .map(|l| {
            if l.trim().is_empty() {
                ""
            } else {
                l.get(indent..).unwrap_or(l).trim_end()
            }
        })
        .collect();

    let first = lines.iter().position(|l| !l.is_empty());
    let last = lines.iter().rposition(|l| !l.is_empty());
    match (first, last) {
        (Some(first), Some(last)) => lines[first..=last].join("\n"),
        _ => String::new(),
    }
}

/// Collapse runs of whitespace into single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split on commas that are not nested inside delimiters.
pub fn split_top_level(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth: usize = 0;
    let mut current = String::new();

    for ch in text.chars() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts.retain(|p| !p.is_empty());
    parts
}
