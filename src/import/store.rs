//! Persistence contract and the in-memory reference sink.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use super::record::{ImportRecord, Table};

/// Errors raised by a [`RecordSink`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{table} already contains '{name}'")]
    Conflict { table: Table, name: String },
}

/// Destination for imported records.
///
/// Both tables are keyed by name; inserting an existing name must fail with
/// [`StoreError::Conflict`] and leave the stored row untouched.
pub trait RecordSink {
    fn insert_theorem(
        &mut self,
        name: &str,
        statement: &str,
        proof: Option<&str>,
    ) -> Result<(), StoreError>;

    fn insert_definition(&mut self, name: &str, definition: &str) -> Result<(), StoreError>;

    /// Route a record to its table. Records that are not persisted are a
    /// no-op.
    fn insert(&mut self, record: &ImportRecord) -> Result<(), StoreError> {
        match record.table() {
            Some(Table::Theorems) => {
                self.insert_theorem(&record.name, &record.text, record.proof.as_deref())
            }
            Some(Table::Definitions) => self.insert_definition(&record.name, &record.text),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TheoremRow {
    pub statement: String,
    pub proof: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefinitionRow {
    pub definition: String,
}

/// Two uniquely-keyed tables held in memory.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MemoryStore {
    pub theorems: BTreeMap<String, TheoremRow>,
    pub definitions: BTreeMap<String, DefinitionRow>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.theorems.len() + self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl RecordSink for MemoryStore {
    fn insert_theorem(
        &mut self,
        name: &str,
        statement: &str,
        proof: Option<&str>,
    ) -> Result<(), StoreError> {
        if self.theorems.contains_key(name) {
            return Err(StoreError::Conflict {
                table: Table::Theorems,
                name: name.to_string(),
            });
        }
        self.theorems.insert(
            name.to_string(),
            TheoremRow {
                statement: statement.to_string(),
                proof: proof.map(str::to_string),
            },
        );
        Ok(())
    }

    fn insert_definition(&mut self, name: &str, definition: &str) -> Result<(), StoreError> {
        if self.definitions.contains_key(name) {
            return Err(StoreError::Conflict {
                table: Table::Definitions,
                name: name.to_string(),
            });
        }
        self.definitions.insert(
            name.to_string(),
            DefinitionRow {
                definition: definition.to_string(),
            },
        );
        Ok(())
    }
}
