// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command line arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Procedural vector-art graph renderer
#[derive(Debug, Parser)]
#[command(name = "vectorweave")]
#[command(version, about)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Evaluate a document and write SVG
    Render {
        /// Document to render
        document: PathBuf,

        /// Node to render; defaults to the first canvas
        #[arg(long)]
        root: Option<String>,

        /// Output file; stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Render settings file (RON)
        #[arg(long, env = "VECTORWEAVE_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Print graph statistics and invariant violations
    Inspect {
        /// Document to inspect
        document: PathBuf,
    },

    /// Write a demo document
    Demo {
        /// Output file; stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
