//! JSON file store.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::{CommitSummary, GraphDocument, GraphStore, StoreResult};
use crate::erd::SchemaGraph;

/// Writes the graph as a pretty-printed [`GraphDocument`].
///
/// The document goes to a temporary file next to the destination and is
/// then renamed over it, so readers see either the old or the new file.
#[derive(Debug, Clone)]
pub struct JsonGraphStore {
    path: PathBuf,
}

impl JsonGraphStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back a previously committed document.
    pub fn load(&self) -> StoreResult<GraphDocument> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl GraphStore for JsonGraphStore {
    fn commit(&mut self, graph: &SchemaGraph) -> StoreResult<CommitSummary> {
        let document = GraphDocument::from_graph(graph);
        let json = serde_json::to_string_pretty(&document)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        // Removed on drop unless persisted.
        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(json.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| e.error)?;

        log::info!("wrote graph to {}", self.path.display());
        Ok(CommitSummary::new(
            self.path.display().to_string(),
            None,
            graph,
        ))
    }
}
