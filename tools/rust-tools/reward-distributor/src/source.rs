use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use reward_allocation::{RecordSource, SourceKind};
use serde_json::Value;

/// Reads `<dir>/<kind>.json`, each holding a JSON array of row objects.
#[derive(Debug, Clone)]
pub struct JsonRecordSource {
    dir: PathBuf,
}

impl JsonRecordSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, kind: SourceKind) -> PathBuf {
        self.dir.join(format!("{kind}.json"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl RecordSource for JsonRecordSource {
    fn rows(&self, kind: SourceKind) -> Result<Option<Vec<Value>>> {
        let path = self.path_for(kind);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read records file: {}", path.display()))?;
        let rows: Vec<Value> = serde_json::from_str(&content)
            .with_context(|| format!("{} is not a JSON array of rows", path.display()))?;
        Ok(Some(rows))
    }
}
