//! Line scanner for Acorn source text.
//!
//! The scanner turns raw text into a stream of [`SourceLine`]s with comments
//! blanked out, a running delimiter depth, and a classification of the
//! trailing operator of each line. It never fails: malformed input yields a
//! best-effort stream and, when a block comment is left open, the line where
//! that comment started.
//!
//! Comment characters are replaced by spaces of the same UTF-8 width, so a
//! byte offset into [`SourceLine::code`] is also a valid offset into
//! [`SourceLine::raw`]. The extractor relies on this to slice declaration
//! text out of the raw source.

use serde::Serialize;

/// Infix operators that carry a statement onto the next physical line.
pub const CONTINUATION_OPERATORS: &[&str] = &[
    "+", "-", "*", "/", "%", "^", "=", "!=", "<", ">", "<=", ">=", "->", "=>", "<->",
];

/// Word operators that carry a statement onto the next physical line.
pub const CONTINUATION_WORDS: &[&str] = &["and", "or", "implies", "iff", "not"];

/// Characters that can make up a symbolic operator.
const OPERATOR_CHARS: &str = "+-*/%^=<>!&|~@$?\\:";

/// How a line ends, operator-wise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "operator", rename_all = "snake_case")]
pub enum TrailingOperator {
    /// No trailing operator.
    None,
    /// A listed continuation operator; the statement continues.
    Listed(&'static str),
    /// An operator outside the continuation list; the line is treated as
    /// complete.
    Unlisted(String),
}

/// One physical line of a source unit.
#[derive(Debug, Clone, Serialize)]
pub struct SourceLine {
    /// 1-based line number.
    pub number: usize,
    /// The line exactly as written.
    pub raw: String,
    /// The line with comments replaced by spaces.
    pub code: String,
    /// Open delimiter count after this line.
    pub depth: usize,
    /// Whether the line starts inside a block comment.
    pub in_block_comment: bool,
    pub trailing: TrailingOperator,
}

impl SourceLine {
    /// Whether the line has no code once comments are removed.
    pub fn is_blank(&self) -> bool {
        self.code.trim().is_empty()
    }

    /// Whether the line ends with a listed continuation operator.
    pub fn ends_with_operator(&self) -> bool {
        matches!(self.trailing, TrailingOperator::Listed(_))
    }

    /// Whether the logical statement carries on to the next line.
    pub fn continues(&self) -> bool {
        self.ends_with_operator() || self.depth > 0
    }
}

/// The scanner's output for one unit.
#[derive(Debug, Clone, Default)]
pub struct ScannedUnit {
    pub lines: Vec<SourceLine>,
    /// Line where a block comment was opened and never closed.
    pub unterminated_comment: Option<usize>,
}

/// Scan raw source text into annotated lines.
pub fn scan(text: &str) -> ScannedUnit {
    let mut lines = Vec::new();
    let mut in_comment = false;
    let mut comment_start = 0;
    let mut depth: usize = 0;

    for (idx, raw) in text.lines().enumerate() {
        let number = idx + 1;
        let started_in_comment = in_comment;
        let mut code = String::with_capacity(raw.len());
        let mut chars = raw.chars().peekable();

        while let Some(ch) = chars.next() {
            if in_comment {
                if ch == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    code.push_str("  ");
                    in_comment = false;
                } else {
                    pad(&mut code, ch);
                }
                continue;
            }

            match (ch, chars.peek()) {
                ('/', Some('/')) => {
                    pad(&mut code, ch);
                    for rest in chars.by_ref() {
                        pad(&mut code, rest);
                    }
                }
                ('/', Some('*')) => {
                    chars.next();
                    code.push_str("  ");
                    in_comment = true;
                    comment_start = number;
                }
                _ => code.push(ch),
            }
        }

        for ch in code.chars() {
            match ch {
                '{' | '(' | '[' => depth += 1,
                '}' | ')' | ']' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }

        let trailing = classify_trailing(&code);
        lines.push(SourceLine {
            number,
            raw: raw.to_string(),
            code,
            depth,
            in_block_comment: started_in_comment,
            trailing,
        });
    }

    ScannedUnit {
        lines,
        unterminated_comment: in_comment.then_some(comment_start),
    }
}

fn pad(code: &mut String, ch: char) {
    for _ in 0..ch.len_utf8() {
        code.push(' ');
    }
}

/// Classify the operator a line ends with.
fn classify_trailing(code: &str) -> TrailingOperator {
    let trimmed = code.trim_end();

    let symbolic_start = trimmed
        .char_indices()
        .rev()
        .take_while(|(_, c)| OPERATOR_CHARS.contains(*c))
        .last()
        .map(|(i, _)| i);

    if let Some(start) = symbolic_start {
        let op = &trimmed[start..];
        return match CONTINUATION_OPERATORS.iter().find(|listed| **listed == op) {
            Some(listed) => TrailingOperator::Listed(listed),
            None => TrailingOperator::Unlisted(op.to_string()),
        };
    }

    let word_start = trimmed
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_alphanumeric() || *c == '_')
        .last()
        .map(|(i, _)| i);

    if let Some(start) = word_start {
        let word = &trimmed[start..];
        if let Some(listed) = CONTINUATION_WORDS.iter().find(|w| **w == word) {
            return TrailingOperator::Listed(listed);
        }
    }

    TrailingOperator::None
}
