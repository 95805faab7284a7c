//! Declaration records produced by the extractor.

use serde::Serialize;

/// Inclusive 1-based line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of lines covered.
    pub fn len(&self) -> usize {
        self.end + 1 - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn contains(&self, line: usize) -> bool {
        self.start <= line && line <= self.end
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// How a theorem-like declaration was introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TheoremForm {
    Theorem,
    Axiom,
    /// A claim inside a typeclass body.
    Law,
}

/// How a definition was introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionForm {
    Define,
    Let,
    Satisfy,
    /// A `name: Type` constant inside a typeclass body.
    Member,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "directive", rename_all = "snake_case")]
pub enum Directive {
    Import { module: String },
    FromImport { module: String, items: Vec<String> },
    Numerals { type_name: String },
}

/// Kind-specific payload of a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Detail {
    Theorem {
        statement_text: String,
        proof_text: Option<String>,
        form: TheoremForm,
    },
    Definition {
        definition_text: String,
        form: DefinitionForm,
    },
    Structure {
        type_params: Vec<String>,
        fields: Vec<String>,
        constraint: Option<String>,
    },
    Inductive {
        type_params: Vec<String>,
        constructors: Vec<String>,
    },
    Attributes {
        type_param: Option<String>,
        type_params: Vec<String>,
    },
    Typeclass {
        type_param: Option<String>,
        extends: Vec<String>,
    },
    Instance {
        typeclass: Option<String>,
    },
    Directive(Directive),
}

/// Tag-only view of [`Detail`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    Theorem,
    Definition,
    Structure,
    Inductive,
    Attributes,
    Typeclass,
    Instance,
    Directive,
}

impl DeclarationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationKind::Theorem => "theorem",
            DeclarationKind::Definition => "definition",
            DeclarationKind::Structure => "structure",
            DeclarationKind::Inductive => "inductive",
            DeclarationKind::Attributes => "attributes",
            DeclarationKind::Typeclass => "typeclass",
            DeclarationKind::Instance => "instance",
            DeclarationKind::Directive => "directive",
        }
    }
}

impl std::fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One recognized declaration and everything nested inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    /// Empty for anonymous theorems. Directives carry their module or numerals type.
    pub name: String,
    pub header_span: Span,
    pub body_span: Option<Span>,
    /// Header text before the body block, whitespace collapsed.
    pub signature: String,
    pub detail: Detail,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Declaration>,
    pub unterminated: bool,
}

impl Declaration {
    pub fn kind(&self) -> DeclarationKind {
        match &self.detail {
            Detail::Theorem { .. } => DeclarationKind::Theorem,
            Detail::Definition { .. } => DeclarationKind::Definition,
            Detail::Structure { .. } => DeclarationKind::Structure,
            Detail::Inductive { .. } => DeclarationKind::Inductive,
            Detail::Attributes { .. } => DeclarationKind::Attributes,
            Detail::Typeclass { .. } => DeclarationKind::Typeclass,
            Detail::Instance { .. } => DeclarationKind::Instance,
            Detail::Directive(_) => DeclarationKind::Directive,
        }
    }

    /// First line of the declaration.
    pub fn line(&self) -> usize {
        self.header_span.start
    }

    /// Last line of the declaration, body included.
    pub fn end_line(&self) -> usize {
        self.body_span.map_or(self.header_span.end, |b| b.end)
    }

    /// Whole extent of the declaration.
    pub fn span(&self) -> Span {
        Span::new(self.line(), self.end_line())
    }

    /// Whether this declaration takes part in name uniqueness checks.
    pub fn requires_unique_name(&self) -> bool {
        !self.name.is_empty()
            && matches!(
                self.kind(),
                DeclarationKind::Theorem
                    | DeclarationKind::Definition
                    | DeclarationKind::Structure
                    | DeclarationKind::Inductive
                    | DeclarationKind::Typeclass
            )
    }

    /// Depth-first iterator over this declaration and its descendants.
    pub fn walk(&self) -> impl Iterator<Item = &Declaration> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.children.iter().rev());
            Some(next)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(name: &str, line: usize) -> Declaration {
        Declaration {
            name: name.to_string(),
            header_span: Span::new(line, line),
            body_span: None,
            signature: format!("define {}", name),
            detail: Detail::Definition {
                definition_text: String::new(),
                form: DefinitionForm::Define,
            },
            children: Vec::new(),
            unterminated: false,
        }
    }

    #[test]
    fn test_span_helpers() {
        let header = Span::new(1, 2);
        let body = Span::new(3, 5);
        assert_eq!(body.len(), 3);
        assert!(!header.overlaps(&body));
        assert!(body.contains(4));
        assert!(!body.contains(2));
    }

    #[test]
    fn test_walk_is_preorder() {
        let mut parent = definition("outer", 1);
        parent.detail = Detail::Typeclass {
            type_param: None,
            extends: Vec::new(),
        };
        parent.children = vec![definition("a", 2), definition("b", 3)];

        let names: Vec<&str> = parent.walk().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["outer", "a", "b"]);
    }

    #[test]
    fn test_anonymous_theorem_is_not_unique() {
        let mut decl = definition("", 1);
        decl.detail = Detail::Theorem {
            statement_text: "theorem { true }".to_string(),
            proof_text: None,
            form: TheoremForm::Theorem,
        };
        assert!(!decl.requires_unique_name());
    }
}
