//! Flattened declaration records handed to persistence.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::extract::{Declaration, DeclarationKind, Detail, Span};

/// Persistence table a record belongs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Theorems,
    Definitions,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Theorems => "theorems",
            Table::Definitions => "definitions",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One declaration, flattened out of its unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportRecord {
    /// Qualified name (`Owner.member` for nested declarations).
    pub name: String,
    /// Bare name.
    pub identifier: String,
    pub kind: DeclarationKind,
    pub source_file: PathBuf,
    pub module_name: String,
    pub line: usize,
    pub header_span: Span,
    pub body_span: Option<Span>,
    /// Statement text for theorems, definition text for definitions, the
    /// signature otherwise.
    pub text: String,
    pub proof: Option<String>,
    /// Qualified name of the enclosing declaration.
    pub parent: Option<String>,
}

impl ImportRecord {
    /// Table the record is stored in, if it is persisted at all. Anonymous
    /// theorems have no key and are never persisted.
    pub fn table(&self) -> Option<Table> {
        if self.identifier.is_empty() {
            return None;
        }
        match self.kind {
            DeclarationKind::Theorem => Some(Table::Theorems),
            DeclarationKind::Definition => Some(Table::Definitions),
            _ => None,
        }
    }
}

/// Flatten a unit's declarations into records, children after their parent.
/// Directives are skipped.
pub fn flatten(declarations: &[Declaration], source_file: &Path, module_name: &str) -> Vec<ImportRecord> {
    let mut records = Vec::new();
    for decl in declarations {
        push_records(decl, None, source_file, module_name, &mut records);
    }
    records
}

fn push_records(
    decl: &Declaration,
    parent: Option<&str>,
    source_file: &Path,
    module_name: &str,
    records: &mut Vec<ImportRecord>,
) {
    if decl.kind() == DeclarationKind::Directive {
        return;
    }

    let name = match parent {
        Some(owner) if !owner.is_empty() && !decl.name.is_empty() => {
            format!("{}.{}", owner, decl.name)
        }
        _ => decl.name.clone(),
    };

    let (text, proof) = match &decl.detail {
        Detail::Theorem {
            statement_text,
            proof_text,
            ..
        } => (statement_text.clone(), proof_text.clone()),
        Detail::Definition {
            definition_text, ..
        } => (definition_text.clone(), None),
        _ => (decl.signature.clone(), None),
    };

    records.push(ImportRecord {
        name: name.clone(),
        identifier: decl.name.clone(),
        kind: decl.kind(),
        source_file: source_file.to_path_buf(),
        module_name: module_name.to_string(),
        line: decl.line(),
        header_span: decl.header_span,
        body_span: decl.body_span,
        text,
        proof,
        parent: parent.map(str::to_string),
    });

    for child in &decl.children {
        push_records(child, Some(&name), source_file, module_name, records);
    }
}

/// Module name for `file` relative to `root`: path segments joined with dots,
/// extension dropped. A bare file yields its stem.
pub fn module_name(root: Option<&Path>, file: &Path) -> String {
    let relative = root
        .and_then(|r| file.strip_prefix(r).ok())
        .filter(|rel| !rel.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new(file.file_name().unwrap_or(file.as_os_str())));

    relative
        .with_extension("")
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(".")
}
