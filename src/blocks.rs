//! Delimiter block tracking.
//!
//! The tracker walks the comment-stripped lines with a stack of open
//! delimiters and records, per line, the depth before and after it. Closing
//! delimiters with nothing to close are reported and ignored, so depth never
//! goes negative; the tracker always produces a complete map.

use std::fmt;

use crate::scanner::SourceLine;

/// A bracketing delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delimiter {
    Brace,
    Paren,
    Bracket,
}

impl Delimiter {
    fn from_open(ch: char) -> Option<Self> {
        match ch {
            '{' => Some(Delimiter::Brace),
            '(' => Some(Delimiter::Paren),
            '[' => Some(Delimiter::Bracket),
            _ => None,
        }
    }

    fn from_close(ch: char) -> Option<Self> {
        match ch {
            '}' => Some(Delimiter::Brace),
            ')' => Some(Delimiter::Paren),
            ']' => Some(Delimiter::Bracket),
            _ => None,
        }
    }

    pub fn open(&self) -> char {
        match self {
            Delimiter::Brace => '{',
            Delimiter::Paren => '(',
            Delimiter::Bracket => '[',
        }
    }

    pub fn close(&self) -> char {
        match self {
            Delimiter::Brace => '}',
            Delimiter::Paren => ')',
            Delimiter::Bracket => ']',
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.open())
    }
}

/// Depth on either side of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineDepth {
    pub before: usize,
    pub after: usize,
}

/// A delimiter problem found while tracking blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralIssue {
    /// A closer with no open delimiter.
    UnmatchedClose { line: usize, found: char },
    /// A closer that does not match the innermost opener.
    Mismatched {
        line: usize,
        found: char,
        expected: char,
        opened_at: usize,
    },
    /// An opener still open at end of input.
    Unclosed { line: usize, delimiter: Delimiter },
}

impl StructuralIssue {
    pub fn line(&self) -> usize {
        match self {
            StructuralIssue::UnmatchedClose { line, .. }
            | StructuralIssue::Mismatched { line, .. }
            | StructuralIssue::Unclosed { line, .. } => *line,
        }
    }

    pub fn message(&self) -> String {
        match self {
            StructuralIssue::UnmatchedClose { found, .. } => {
                format!("unmatched closing '{}'", found)
            }
            StructuralIssue::Mismatched {
                found,
                expected,
                opened_at,
                ..
            } => format!(
                "mismatched delimiter: expected '{}' to close line {}, found '{}'",
                expected, opened_at, found
            ),
            StructuralIssue::Unclosed { delimiter, .. } => {
                format!("unclosed '{}'", delimiter)
            }
        }
    }
}

/// Per-line depth map of a unit plus the issues found building it.
#[derive(Debug, Clone, Default)]
pub struct BlockMap {
    pub depths: Vec<LineDepth>,
    pub issues: Vec<StructuralIssue>,
}

impl BlockMap {
    /// Track delimiters across the given lines.
    pub fn build(lines: &[SourceLine]) -> Self {
        let mut stack: Vec<(Delimiter, usize)> = Vec::new();
        let mut depths = Vec::with_capacity(lines.len());
        let mut issues = Vec::new();

        for line in lines {
            let before = stack.len();

            for ch in line.code.chars() {
                if let Some(open) = Delimiter::from_open(ch) {
                    stack.push((open, line.number));
                } else if let Some(close) = Delimiter::from_close(ch) {
                    match stack.pop() {
                        None => issues.push(StructuralIssue::UnmatchedClose {
                            line: line.number,
                            found: ch,
                        }),
                        Some((open, opened_at)) if open != close => {
                            issues.push(StructuralIssue::Mismatched {
                                line: line.number,
                                found: ch,
                                expected: open.close(),
                                opened_at,
                            })
                        }
                        Some(_) => {}
                    }
                }
            }

            depths.push(LineDepth {
                before,
                after: stack.len(),
            });
        }

        for (delimiter, line) in stack.into_iter().rev() {
            issues.push(StructuralIssue::Unclosed { line, delimiter });
        }

        Self { depths, issues }
    }

    /// Depth before and after the line at `index` (0-based).
    pub fn depth(&self, index: usize) -> LineDepth {
        self.depths.get(index).copied().unwrap_or_default()
    }

    /// Whether a declaration at `base` depth may start on the line at `index`.
    pub fn is_boundary(&self, index: usize, base: usize) -> bool {
        self.depth(index).before == base
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}
