// SPDX-License-Identifier: MIT OR Apache-2.0
//! Persisted documents.
//!
//! A document is a graph plus a save-version tag, stored as RON. Documents
//! written by a newer version are rejected on load.

use crate::definition::NodeRegistry;
use crate::graph::{Graph, Violation};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Current document format version
pub const DOCUMENT_VERSION: u32 = 1;

/// Conventional document file extension
pub const DOCUMENT_EXTENSION: &str = "vweave";

/// Document load/save errors
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed RON
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Serialization failed
    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),

    /// Written by a newer version
    #[error("Document version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Newest readable version
        supported: u32,
    },

    /// Graph breaks a structural invariant
    #[error("Document graph is inconsistent ({} violations)", .0.len())]
    Invalid(Vec<Violation>),
}

/// A saved graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Format version
    pub version: u32,
    /// Optional display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The graph
    pub graph: Graph,
}

impl Document {
    /// Wrap a graph at the current version
    pub fn new(graph: Graph) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            name: None,
            graph,
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String, DocumentError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Parse RON, rejecting newer versions
    pub fn from_ron(s: &str) -> Result<Self, DocumentError> {
        let document: Document = ron::from_str(s)?;
        if document.version > DOCUMENT_VERSION {
            return Err(DocumentError::UnsupportedVersion {
                found: document.version,
                supported: DOCUMENT_VERSION,
            });
        }
        Ok(document)
    }

    /// Check the graph against the registry
    pub fn verify(&self, registry: &NodeRegistry) -> Result<(), DocumentError> {
        let violations = self.graph.validate(registry);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(DocumentError::Invalid(violations))
        }
    }

    /// Save to a file
    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        std::fs::write(path, self.to_ron()?)?;
        tracing::info!(path = %path.display(), nodes = self.graph.node_count(), "Saved document");
        Ok(())
    }

    /// Load from a file
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let contents = std::fs::read_to_string(path)?;
        let document = Self::from_ron(&contents)?;
        tracing::info!(path = %path.display(), nodes = document.graph.node_count(), "Loaded document");
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::create_default_registry;
    use crate::node::Position;
    use crate::value::Value;

    fn sample() -> Graph {
        let registry = create_default_registry();
        let mut graph = Graph::new();
        let circle = graph.add_node(&registry, "circle", Position::new(10.0, 20.0)).unwrap();
        let layers = graph.add_node(&registry, "layers", Position::default()).unwrap();
        graph.set_value(circle, "radius", Value::Float(42.0)).unwrap();
        graph.connect(&registry, circle, "output", layers, "socket1").unwrap();
        graph.set_toggle(layers, "sockets", true).unwrap();
        graph
    }

    #[test]
    fn test_ron_round_trip() {
        let document = Document::new(sample()).with_name("Sample");
        let ron = document.to_ron().unwrap();
        let loaded = Document::from_ron(&ron).unwrap();
        assert_eq!(loaded, document);
        assert!(loaded.verify(&create_default_registry()).is_ok());
    }

    #[test]
    fn test_newer_version_rejected() {
        let mut document = Document::new(Graph::new());
        document.version = DOCUMENT_VERSION + 1;
        let ron = document.to_ron().unwrap();
        assert!(matches!(
            Document::from_ron(&ron),
            Err(DocumentError::UnsupportedVersion { found, .. }) if found == DOCUMENT_VERSION + 1
        ));
    }

    #[test]
    fn test_malformed_input() {
        assert!(matches!(
            Document::from_ron("Document(version: "),
            Err(DocumentError::Parse(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!(
            "vectorweave-test-{}.{DOCUMENT_EXTENSION}",
            uuid::Uuid::new_v4()
        ));
        let document = Document::new(sample());
        document.save(&path).unwrap();
        let loaded = Document::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, document);
    }
}
