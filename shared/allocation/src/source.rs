use std::collections::BTreeMap;

use anyhow::Result;
use serde_json::Value;

use crate::SourceKind;

/// Supplies raw record rows per source kind.
///
/// `Ok(None)` means the source does not exist at all, which the loader turns into a
/// configuration error when the kind is required. Individual rows are parsed, and possibly
/// skipped, by the loader.
pub trait RecordSource {
    fn rows(&self, kind: SourceKind) -> Result<Option<Vec<Value>>>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordSource {
    rows: BTreeMap<SourceKind, Vec<Value>>,
}

impl InMemoryRecordSource {
    pub fn with_rows(mut self, kind: SourceKind, rows: Vec<Value>) -> Self {
        self.rows.insert(kind, rows);
        self
    }
}

impl RecordSource for InMemoryRecordSource {
    fn rows(&self, kind: SourceKind) -> Result<Option<Vec<Value>>> {
        Ok(self.rows.get(&kind).cloned())
    }
}
