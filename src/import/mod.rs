//! Corpus import: flatten declarations, reject cross-unit duplicates and hand
//! the rest to a [`RecordSink`].

mod importer;
mod record;
mod store;

pub use importer::{
    collect_files, collect_sources, DuplicateConflict, FailedUnit, ImportSummary, Importer,
    Origin, SourceFile, UnitDiagnostic, UnitSummary,
};
pub use record::{flatten, module_name, ImportRecord, Table};
pub use store::{DefinitionRow, MemoryStore, RecordSink, StoreError, TheoremRow};
