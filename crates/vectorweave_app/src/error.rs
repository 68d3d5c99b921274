// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command line errors.

use std::path::PathBuf;
use thiserror::Error;
use vectorweave_graph::DocumentError;

/// Top-level error of a command
#[derive(Debug, Error)]
pub enum AppError {
    /// Document could not be read, written or verified
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Settings file could not be read
    #[error("Failed to read settings {path}: {source}")]
    SettingsIo {
        /// Settings file
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Settings file is malformed
    #[error("Failed to parse settings {path}: {source}")]
    SettingsParse {
        /// Settings file
        path: PathBuf,
        /// Underlying error
        source: ron::error::SpannedError,
    },

    /// Settings written by a newer version
    #[error("Settings version {found} is newer than supported version {supported}")]
    UnsupportedSettingsVersion {
        /// Version in the file
        found: u32,
        /// Newest readable version
        supported: u32,
    },

    /// Output file could not be written
    #[error("Failed to write {path}: {source}")]
    Output {
        /// Output file
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// `--root` is not a node id
    #[error("Invalid node id {0:?}")]
    InvalidNodeId(String),

    /// Root node is not in the document
    #[error("Node {0} not found in document")]
    RootNotFound(String),

    /// No root given and the document has no canvas
    #[error("Document has no canvas node; pass --root")]
    NoRoot,

    /// Demo document could not be built
    #[error("Failed to build demo document: {0}")]
    Demo(&'static str),
}
