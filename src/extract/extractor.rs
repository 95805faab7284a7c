//! Header recognition and extent capture.

use std::collections::HashMap;

use log::trace;
use once_cell::sync::Lazy;
use phf::phf_map;
use regex::Regex;

use super::declaration::{
    Declaration, DefinitionForm, Detail, Directive, Span, TheoremForm,
};
use super::extent::{
    after, collapse_whitespace, dedent, find_opener, find_opener_or_word, matching_close,
    next_token, slice_code, slice_raw, split_top_level, word_at, Pos,
};
use crate::blocks::BlockMap;
use crate::lint::{Diagnostic, Rule};
use crate::scanner::SourceLine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    Theorem,
    Axiom,
    Define,
    Let,
    Structure,
    Inductive,
    Attributes,
    Typeclass,
    Instance,
    Import,
    From,
    Numerals,
}

static KEYWORDS: phf::Map<&'static str, Keyword> = phf_map! {
    "theorem" => Keyword::Theorem,
    "axiom" => Keyword::Axiom,
    "define" => Keyword::Define,
    "let" => Keyword::Let,
    "structure" => Keyword::Structure,
    "inductive" => Keyword::Inductive,
    "attributes" => Keyword::Attributes,
    "typeclass" => Keyword::Typeclass,
    "instance" => Keyword::Instance,
    "import" => Keyword::Import,
    "from" => Keyword::From,
    "numerals" => Keyword::Numerals,
};

impl Keyword {
    /// Kinds whose body brace may sit on the line after the header.
    fn takes_block(&self) -> bool {
        matches!(
            self,
            Keyword::Theorem
                | Keyword::Axiom
                | Keyword::Define
                | Keyword::Structure
                | Keyword::Inductive
                | Keyword::Attributes
                | Keyword::Typeclass
                | Keyword::Instance
        )
    }
}

/// What opened a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Header {
    Keyword(Keyword),
    /// `name: Type` inside a typeclass body.
    Member,
    /// `name(params) { claim }` inside a typeclass body.
    Law,
}

static NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^\s(:{\[=]+)").unwrap());

static MEMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*|[0-9]+)\s*([(:])").unwrap());

static CLASS_HEAD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:([A-Za-z_][A-Za-z0-9_]*)\s*:\s*)?([A-Za-z_][A-Za-z0-9_.]*)\s*(?:\[([^\]]*)\])?")
        .unwrap()
});

static TYPE_HEAD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_.]*)\s*(?:\[([^\]]*)\])?").unwrap()
});

static INSTANCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_.]*)\s*(?:\[[^\]]*\])?\s*(?::\s*([A-Za-z_][A-Za-z0-9_.]*))?")
        .unwrap()
});

static EXTENDS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bextends\s+(.+)$").unwrap());

static FROM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9_./]+)\s+import\s+(.+)$").unwrap());

static MODULE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-Za-z0-9_./]+)").unwrap());

/// Walks a unit's lines and collects declarations.
pub struct Extractor<'a> {
    lines: &'a [SourceLine],
    blocks: &'a BlockMap,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Extractor<'a> {
    pub fn new(lines: &'a [SourceLine], blocks: &'a BlockMap) -> Self {
        Self {
            lines,
            blocks,
            diagnostics: Vec::new(),
        }
    }

    /// Extract every top-level declaration, returning them with the
    /// structural diagnostics found along the way.
    pub fn run(mut self) -> (Vec<Declaration>, Vec<Diagnostic>) {
        let declarations = self.window(0, self.lines.len(), 0, false);
        (declarations, self.diagnostics)
    }

    /// Recognize declarations starting in `lines[from..to]` at depth `base`.
    fn window(&mut self, from: usize, to: usize, base: usize, in_typeclass: bool) -> Vec<Declaration> {
        let mut declarations = Vec::new();
        let mut i = from;

        while i < to {
            let line = &self.lines[i];
            if line.is_blank() || !self.blocks.is_boundary(i, base) {
                i += 1;
                continue;
            }

            let Some((header, start)) = self.recognize(i, in_typeclass) else {
                i += 1;
                continue;
            };

            let (end, unterminated) = self.extent(header, i, to, base);
            let decl = self.build(header, start, end, base, unterminated);

            trace!(
                name = decl.name.as_str(),
                kind = decl.kind().as_str(),
                line = decl.line();
                "extracted declaration"
            );

            if unterminated {
                self.diagnostics.push(Diagnostic::new(
                    Rule::UnterminatedDeclaration,
                    decl.line(),
                    format!("unterminated {} declaration", header_label(header)),
                ));
            }

            declarations.push(decl);
            i = end + 1;
        }

        self.check_duplicates(&declarations);
        declarations
    }

    /// Identify the header on line `i`, returning it and the position of its
    /// first token.
    fn recognize(&self, i: usize, in_typeclass: bool) -> Option<(Header, Pos)> {
        let code = &self.lines[i].code;
        let indent = code.len() - code.trim_start().len();
        let start = Pos::new(i, indent);

        if let Some(word) = word_at(self.lines, start) {
            if let Some(keyword) = KEYWORDS.get(word) {
                let rest = code.get(indent + word.len()..).unwrap_or("");
                // `from` and `let` are common identifiers too; require a follower.
                let follows = rest.is_empty()
                    || rest.starts_with(char::is_whitespace)
                    || (keyword.takes_block() && rest.starts_with(['{', '(', '[']));
                if follows {
                    return Some((Header::Keyword(*keyword), start));
                }
            }
        }

        if in_typeclass {
            let caps = MEMBER_RE.captures(code.trim_start())?;
            let header = if &caps[2] == ":" {
                Header::Member
            } else {
                Header::Law
            };
            return Some((header, start));
        }

        None
    }

    /// First line `j >= start` that closes a statement at `base`.
    fn statement_end(&self, start: usize, to: usize, base: usize) -> Option<usize> {
        (start..to).find(|&j| {
            let line = &self.lines[j];
            !line.is_blank() && self.blocks.depth(j).after <= base && !line.ends_with_operator()
        })
    }

    fn next_nonblank(&self, after_line: usize, to: usize) -> Option<usize> {
        (after_line + 1..to).find(|&j| !self.lines[j].is_blank())
    }

    /// Last line of the declaration starting on line `i`, and whether the
    /// window ran out first.
    fn extent(&self, header: Header, i: usize, to: usize, base: usize) -> (usize, bool) {
        let Some(mut end) = self.statement_end(i, to, base) else {
            return (to.saturating_sub(1).max(i), true);
        };

        let keyword = match header {
            Header::Keyword(k) => Some(k),
            _ => None,
        };
        let takes_block = match header {
            Header::Keyword(k) => k.takes_block(),
            Header::Law => true,
            Header::Member => false,
        };
        let mut took_block = false;
        let mut took_proof = false;
        let mut took_constraint = false;

        loop {
            let Some(next) = self.next_nonblank(end, to) else {
                break;
            };
            let next_start = Pos::new(next, 0);
            let Some(token) = next_token(self.lines, next_start, next) else {
                break;
            };
            let word = word_at(self.lines, token);
            let opens_block = self.lines[next].code.get(token.col..).map_or(false, |s| s.starts_with('{'));

            let extend = match keyword {
                _ if takes_block
                    && !took_block
                    && opens_block
                    && find_opener(self.lines, Pos::new(i, 0), end).is_none() =>
                {
                    took_block = true;
                    true
                }
                Some(Keyword::Theorem) if !took_proof && word == Some("by") => {
                    took_proof = true;
                    true
                }
                Some(Keyword::Structure) if !took_constraint && word == Some("constraint") => {
                    took_constraint = true;
                    true
                }
                _ => false,
            };

            if !extend {
                break;
            }
            match self.statement_end(next, to, base) {
                Some(e) => end = e,
                None => return (to.saturating_sub(1).max(next), true),
            }
        }

        (end, false)
    }

    fn end_pos(&self, end: usize) -> Pos {
        Pos::new(end, self.lines.get(end).map_or(0, |l| l.code.len()))
    }

    /// Code after the keyword up to `limit`, whitespace collapsed.
    fn tail(&self, from: Pos, limit: Pos) -> String {
        collapse_whitespace(&slice_code(self.lines, from, limit))
    }

    fn build(&mut self, header: Header, start: Pos, end: usize, base: usize, unterminated: bool) -> Declaration {
        let end_pos = self.end_pos(end);
        let first = start.line + 1;
        let last = end + 1;

        let keyword_len = word_at(self.lines, start).map_or(0, str::len);
        let rest = Pos::new(start.line, start.col + keyword_len);
        let lines = self.lines;
        let full_text = || slice_raw(lines, start, end_pos).trim().to_string();

        // Header up to and including the line of `opener`, the rest is body.
        let split_at = |opener: Option<Pos>| -> (Span, Option<Span>) {
            match opener {
                Some(open) if open.line < end => (
                    Span::new(first, open.line + 1),
                    Some(Span::new(open.line + 2, last)),
                ),
                _ => (Span::new(first, last), None),
            }
        };

        let mut decl = match header {
            Header::Keyword(Keyword::Theorem) | Header::Keyword(Keyword::Axiom) => {
                let form = if header == Header::Keyword(Keyword::Axiom) {
                    TheoremForm::Axiom
                } else {
                    TheoremForm::Theorem
                };
                self.build_theorem(start, rest, end, form)
            }
            Header::Law => {
                let name = MEMBER_RE
                    .captures(self.lines[start.line].code.trim_start())
                    .map(|c| c[1].to_string())
                    .unwrap_or_default();
                let opener = find_opener(self.lines, start, end);
                Declaration {
                    name,
                    header_span: Span::new(first, last),
                    body_span: None,
                    signature: self.tail(start, opener.unwrap_or(end_pos)),
                    detail: Detail::Theorem {
                        statement_text: full_text(),
                        proof_text: None,
                        form: TheoremForm::Law,
                    },
                    children: Vec::new(),
                    unterminated,
                }
            }
            Header::Member => {
                let name = MEMBER_RE
                    .captures(self.lines[start.line].code.trim_start())
                    .map(|c| c[1].to_string())
                    .unwrap_or_default();
                Declaration {
                    name,
                    header_span: Span::new(first, last),
                    body_span: None,
                    signature: self.tail(start, end_pos),
                    detail: Detail::Definition {
                        definition_text: full_text(),
                        form: DefinitionForm::Member,
                    },
                    children: Vec::new(),
                    unterminated,
                }
            }
            Header::Keyword(Keyword::Define) => {
                let opener = find_opener(self.lines, rest, end);
                let (header_span, body_span) = split_at(opener);
                Declaration {
                    name: self.name_after(rest, end_pos),
                    header_span,
                    body_span,
                    signature: self.tail(start, opener.unwrap_or(end_pos)),
                    detail: Detail::Definition {
                        definition_text: full_text(),
                        form: DefinitionForm::Define,
                    },
                    children: Vec::new(),
                    unterminated,
                }
            }
            Header::Keyword(Keyword::Let) => {
                let found = find_opener_or_word(self.lines, rest, end, &["satisfy"]);
                let name = self.name_after(rest, end_pos);
                match found {
                    Some((satisfy, Some(_))) => {
                        let open = find_opener(self.lines, Pos::new(satisfy.line, satisfy.col + 7), end);
                        let body = open.map(|o| self.block_text(o, end)).unwrap_or_default();
                        let (header_span, body_span) = split_at(open);
                        Declaration {
                            name,
                            header_span,
                            body_span,
                            signature: self.tail(start, satisfy),
                            detail: Detail::Definition {
                                definition_text: body,
                                form: DefinitionForm::Satisfy,
                            },
                            children: Vec::new(),
                            unterminated,
                        }
                    }
                    _ => Declaration {
                        name,
                        header_span: Span::new(first, last),
                        body_span: None,
                        signature: self.tail(start, end_pos),
                        detail: Detail::Definition {
                            definition_text: full_text(),
                            form: DefinitionForm::Let,
                        },
                        children: Vec::new(),
                        unterminated,
                    },
                }
            }
            Header::Keyword(Keyword::Structure) | Header::Keyword(Keyword::Inductive) => {
                let opener = find_opener(self.lines, rest, end);
                let head = self.tail(rest, opener.unwrap_or(end_pos));
                let (name, type_params) = match TYPE_HEAD_RE.captures(&head) {
                    Some(c) => (
                        c[1].to_string(),
                        c.get(2).map(|m| split_top_level(m.as_str())).unwrap_or_default(),
                    ),
                    None => (String::new(), Vec::new()),
                };
                let close = opener.and_then(|o| matching_close(self.lines, o, end));
                let items = match (opener, close) {
                    (Some(o), Some(c)) => block_items(&slice_code(self.lines, after(self.lines, o), c)),
                    (Some(o), None) => block_items(&slice_code(self.lines, after(self.lines, o), end_pos)),
                    _ => Vec::new(),
                };
                let (header_span, body_span) = split_at(opener);

                let detail = if header == Header::Keyword(Keyword::Structure) {
                    let constraint = close.and_then(|c| self.constraint_text(after(self.lines, c), end));
                    Detail::Structure {
                        type_params,
                        fields: items,
                        constraint,
                    }
                } else {
                    Detail::Inductive {
                        type_params,
                        constructors: items,
                    }
                };

                Declaration {
                    name,
                    header_span,
                    body_span,
                    signature: self.tail(start, opener.unwrap_or(end_pos)),
                    detail,
                    children: Vec::new(),
                    unterminated,
                }
            }
            Header::Keyword(Keyword::Attributes) | Header::Keyword(Keyword::Typeclass) => {
                let opener = find_opener(self.lines, rest, end);
                let head = self.tail(rest, opener.unwrap_or(end_pos));
                let caps = CLASS_HEAD_RE.captures(&head);
                let type_param = caps
                    .as_ref()
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().to_string());
                let name = caps
                    .as_ref()
                    .and_then(|c| c.get(2))
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default();

                let is_typeclass = header == Header::Keyword(Keyword::Typeclass);
                let detail = if is_typeclass {
                    let extends = EXTENDS_RE
                        .captures(&head)
                        .map(|c| split_top_level(&c[1]))
                        .unwrap_or_default();
                    Detail::Typeclass { type_param, extends }
                } else {
                    let type_params = caps
                        .as_ref()
                        .and_then(|c| c.get(3))
                        .map(|m| split_top_level(m.as_str()))
                        .unwrap_or_default();
                    Detail::Attributes {
                        type_param,
                        type_params,
                    }
                };

                let children = opener
                    .map(|o| self.children(o, end, base, is_typeclass))
                    .unwrap_or_default();
                let (header_span, body_span) = split_at(opener);

                Declaration {
                    name,
                    header_span,
                    body_span,
                    signature: self.tail(start, opener.unwrap_or(end_pos)),
                    detail,
                    children,
                    unterminated,
                }
            }
            Header::Keyword(Keyword::Instance) => {
                let opener = find_opener(self.lines, rest, end);
                let head = self.tail(rest, opener.unwrap_or(end_pos));
                let (name, typeclass) = match INSTANCE_RE.captures(&head) {
                    Some(c) => (c[1].to_string(), c.get(2).map(|m| m.as_str().to_string())),
                    None => (String::new(), None),
                };
                let (header_span, body_span) = split_at(opener);
                Declaration {
                    name,
                    header_span,
                    body_span,
                    signature: self.tail(start, opener.unwrap_or(end_pos)),
                    detail: Detail::Instance { typeclass },
                    children: Vec::new(),
                    unterminated,
                }
            }
            Header::Keyword(keyword @ (Keyword::Import | Keyword::From | Keyword::Numerals)) => {
                let head = self.tail(rest, end_pos);
                let directive = match keyword {
                    Keyword::From => match FROM_RE.captures(&head) {
                        Some(c) => Directive::FromImport {
                            module: c[1].to_string(),
                            items: split_top_level(&c[2]),
                        },
                        None => Directive::FromImport {
                            module: first_module(&head),
                            items: Vec::new(),
                        },
                    },
                    Keyword::Numerals => Directive::Numerals {
                        type_name: first_module(&head),
                    },
                    _ => Directive::Import {
                        module: first_module(&head),
                    },
                };
                let name = match &directive {
                    Directive::Import { module } | Directive::FromImport { module, .. } => module.clone(),
                    Directive::Numerals { type_name } => type_name.clone(),
                };
                Declaration {
                    name,
                    header_span: Span::new(first, last),
                    body_span: None,
                    signature: self.tail(start, end_pos),
                    detail: Detail::Directive(directive),
                    children: Vec::new(),
                    unterminated,
                }
            }
        };

        decl.unterminated = unterminated;
        decl
    }

    fn build_theorem(&self, start: Pos, rest: Pos, end: usize, form: TheoremForm) -> Declaration {
        let end_pos = self.end_pos(end);
        let stops: &[&str] = if form == TheoremForm::Theorem { &["by"] } else { &[] };

        let (statement_end, signature_end, by_pos) =
            match find_opener_or_word(self.lines, rest, end, stops) {
                Some((open, None)) => {
                    let close = matching_close(self.lines, open, end);
                    let stmt_end = close.map_or(end_pos, |c| after(self.lines, c));
                    let by = next_token(self.lines, stmt_end, end)
                        .filter(|t| form == TheoremForm::Theorem && word_at(self.lines, *t) == Some("by"));
                    (stmt_end, open, by)
                }
                Some((by, Some(_))) => (by, by, Some(by)),
                None => (end_pos, end_pos, None),
            };

        let proof_open = by_pos.and_then(|by| find_opener(self.lines, Pos::new(by.line, by.col + 2), end));
        let proof_text = proof_open.map(|o| self.block_text(o, end));

        let first = start.line + 1;
        let (header_span, body_span) = match proof_open {
            Some(open) if open.line < end => (
                Span::new(first, open.line + 1),
                Some(Span::new(open.line + 2, end + 1)),
            ),
            _ => (Span::new(first, end + 1), None),
        };

        Declaration {
            name: self.name_after(rest, signature_end),
            header_span,
            body_span,
            signature: self.tail(start, signature_end),
            detail: Detail::Theorem {
                statement_text: slice_raw(self.lines, start, statement_end).trim().to_string(),
                proof_text,
                form,
            },
            children: Vec::new(),
            unterminated: false,
        }
    }

    /// Dedented raw text inside the block opened at `open`.
    fn block_text(&self, open: Pos, end: usize) -> String {
        let close = matching_close(self.lines, open, end).unwrap_or_else(|| self.end_pos(end));
        dedent(&slice_raw(self.lines, after(self.lines, open), close))
    }

    /// Body of a `constraint { ... }` block following `from`.
    fn constraint_text(&self, from: Pos, end: usize) -> Option<String> {
        let token = next_token(self.lines, from, end)?;
        if word_at(self.lines, token) != Some("constraint") {
            return None;
        }
        let open = find_opener(self.lines, Pos::new(token.line, token.col + 10), end)?;
        Some(self.block_text(open, end))
    }

    /// Identifier following the keyword.
    fn name_after(&self, rest: Pos, limit: Pos) -> String {
        let head = self.tail(rest, limit);
        NAME_RE
            .captures(&head)
            .map(|c| c[1].to_string())
            .filter(|name| !KEYWORDS.contains_key(name.as_str()))
            .unwrap_or_default()
    }

    /// Declarations nested in the block opened at `open`.
    fn children(&mut self, open: Pos, end: usize, base: usize, in_typeclass: bool) -> Vec<Declaration> {
        let inner = base + 1;
        if self.blocks.depth(open.line).after != inner {
            return Vec::new();
        }
        let to = matching_close(self.lines, open, end).map_or(end + 1, |c| c.line);
        if open.line + 1 >= to {
            return Vec::new();
        }
        self.window(open.line + 1, to, inner, in_typeclass)
    }

    fn check_duplicates(&mut self, declarations: &[Declaration]) {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for decl in declarations.iter().filter(|d| d.requires_unique_name()) {
            match seen.get(decl.name.as_str()) {
                Some(first) => self.diagnostics.push(Diagnostic::new(
                    Rule::DuplicateDeclaration,
                    decl.line(),
                    format!(
                        "duplicate declaration '{}' (first declared on line {})",
                        decl.name, first
                    ),
                )),
                None => {
                    seen.insert(decl.name.as_str(), decl.line());
                }
            }
        }
    }
}

fn header_label(header: Header) -> &'static str {
    match header {
        Header::Keyword(Keyword::Theorem) => "theorem",
        Header::Keyword(Keyword::Axiom) => "axiom",
        Header::Keyword(Keyword::Define) => "define",
        Header::Keyword(Keyword::Let) => "let",
        Header::Keyword(Keyword::Structure) => "structure",
        Header::Keyword(Keyword::Inductive) => "inductive",
        Header::Keyword(Keyword::Attributes) => "attributes",
        Header::Keyword(Keyword::Typeclass) => "typeclass",
        Header::Keyword(Keyword::Instance) => "instance",
        Header::Keyword(Keyword::Import) | Header::Keyword(Keyword::From) => "import",
        Header::Keyword(Keyword::Numerals) => "numerals",
        Header::Member => "member",
        Header::Law => "law",
    }
}

fn first_module(head: &str) -> String {
    MODULE_RE
        .captures(head)
        .map(|c| c[1].to_string())
        .unwrap_or_default()
}

/// Non-blank lines of a block body with trailing commas removed.
fn block_items(code: &str) -> Vec<String> {
    code.lines()
        .map(|l| l.trim().trim_end_matches(',').trim())
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
