// SPDX-License-Identifier: MIT OR Apache-2.0
//! `VectorWeave` command line front-end.
//!
//! Loads graph documents, evaluates them with the built-in node kinds and
//! writes the resulting scene as SVG.

mod cli;
mod config;
mod demo;
mod error;
mod svg;

use clap::Parser;
use cli::{Cli, Command};
use config::RenderSettings;
use error::AppError;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use svg::SvgWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use vectorweave_graph::kinds::compose::Canvas;
use vectorweave_graph::{create_default_registry, Document, Evaluator, Graph, NodeDefinition, NodeId};

fn main() {
    let cli = Cli::parse();
    init_tracing();

    tracing::debug!("Starting VectorWeave v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(cli.command) {
        tracing::error!("{e}");
        process::exit(1);
    }
}

/// Logs go to stderr so SVG and RON can be piped from stdout
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(command: Command) -> Result<(), AppError> {
    match command {
        Command::Render {
            document,
            root,
            output,
            config,
        } => render(&document, root.as_deref(), output, config.as_deref()),
        Command::Inspect { document } => inspect(&document),
        Command::Demo { output } => {
            let document = demo::build(Arc::new(create_default_registry()))?;
            match output {
                Some(path) => document.save(&path)?,
                None => println!("{}", document.to_ron()?),
            }
            Ok(())
        }
    }
}

fn render(
    path: &Path,
    root: Option<&str>,
    output: Option<PathBuf>,
    config: Option<&Path>,
) -> Result<(), AppError> {
    let settings = RenderSettings::resolve(config)?;
    let registry = create_default_registry();
    let document = Document::load(path)?;
    document.verify(&registry)?;

    let graph = &document.graph;
    let root = resolve_root(graph, root)?;
    let node = graph
        .node(root)
        .ok_or_else(|| AppError::RootNotFound(root.to_string()))?;
    let (width, height, background) = if node.node_type == Canvas::TYPE {
        let (width, height) = Canvas::size(node.values());
        (width, height, None)
    } else {
        (settings.width, settings.height, settings.background)
    };

    let shape = Evaluator::new(graph, &registry).render(root, "output");
    tracing::info!(root = %root, primitives = shape.primitive_count(), "Rendered scene");
    let markup = SvgWriter::new(&settings).write(&shape, width, height, background);

    match output {
        Some(path) => std::fs::write(&path, markup).map_err(|source| AppError::Output { path, source }),
        None => {
            print!("{markup}");
            Ok(())
        }
    }
}

fn resolve_root(graph: &Graph, root: Option<&str>) -> Result<NodeId, AppError> {
    match root {
        Some(id) => {
            let id: NodeId = id
                .parse()
                .map_err(|_| AppError::InvalidNodeId(id.to_string()))?;
            if graph.node(id).is_none() {
                return Err(AppError::RootNotFound(id.to_string()));
            }
            Ok(id)
        }
        None => graph
            .nodes_of_type(Canvas::TYPE)
            .next()
            .map(|node| node.id)
            .ok_or(AppError::NoRoot),
    }
}

fn inspect(path: &Path) -> Result<(), AppError> {
    let registry = create_default_registry();
    let document = Document::load(path)?;
    let graph = &document.graph;

    println!("{}", document.name.as_deref().unwrap_or("(untitled)"));
    println!("  version: {}", document.version);
    println!("  nodes:   {}", graph.node_count());
    println!("  links:   {}", graph.link_count());
    for definition in registry.types() {
        let count = graph.nodes_of_type(definition.type_name()).count();
        if count > 0 {
            println!("    {:<16} {count}", definition.display_name());
        }
    }

    if let Err(cycle) = graph.topological_order() {
        println!("  note: {cycle}");
    }

    let violations = graph.validate(&registry);
    if violations.is_empty() {
        println!("  no violations");
    } else {
        println!("  {} violations:", violations.len());
        for violation in &violations {
            println!("    {violation}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vectorweave_graph::Position;

    #[test]
    fn test_resolve_root_defaults_to_canvas() {
        let registry = create_default_registry();
        let mut graph = Graph::new();
        graph.add_node(&registry, "circle", Position::default()).unwrap();
        assert!(matches!(resolve_root(&graph, None), Err(AppError::NoRoot)));

        let canvas = graph.add_node(&registry, "canvas", Position::default()).unwrap();
        assert_eq!(resolve_root(&graph, None).unwrap(), canvas);
    }

    #[test]
    fn test_resolve_explicit_root() {
        let registry = create_default_registry();
        let mut graph = Graph::new();
        let circle = graph.add_node(&registry, "circle", Position::default()).unwrap();

        assert_eq!(resolve_root(&graph, Some(&circle.to_string())).unwrap(), circle);
        assert!(matches!(
            resolve_root(&graph, Some("not-a-uuid")),
            Err(AppError::InvalidNodeId(_))
        ));
        assert!(matches!(
            resolve_root(&graph, Some(&NodeId::new().to_string())),
            Err(AppError::RootNotFound(_))
        ));
    }

    #[test]
    fn test_render_demo_to_file() {
        let dir = std::env::temp_dir();
        let stem = format!("vectorweave-cli-{}", process::id());
        let doc_path = dir.join(format!("{stem}.vweave"));
        let svg_path = dir.join(format!("{stem}.svg"));

        demo::build(Arc::new(create_default_registry()))
            .unwrap()
            .save(&doc_path)
            .unwrap();
        render(&doc_path, None, Some(svg_path.clone()), None).unwrap();

        let markup = std::fs::read_to_string(&svg_path).unwrap();
        std::fs::remove_file(&doc_path).unwrap();
        std::fs::remove_file(&svg_path).unwrap();

        assert!(markup.starts_with("<svg"));
        assert_eq!(markup.matches("<circle").count(), 8);
        assert_eq!(markup.matches("<polygon").count(), 1);
    }
}
