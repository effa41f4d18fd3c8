mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use codemap_core::{
    build_module_edges, build_module_graph, build_retrieval_units, build_symbol_graph_with,
    induced_subgraph, parse_repository_to, ParseOptions, RetrievalUnit, Snapshot,
    SymbolGraphOptions,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct RenderedUnit {
    #[serde(flatten)]
    unit: RetrievalUnit,
    embedding_text: String,
}

fn default_snapshot_path(repo: &Path) -> PathBuf {
    repo.join(".codemap").join("symbols.json")
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_snapshot(path: &Path) -> Result<Snapshot> {
    Snapshot::load(path).with_context(|| format!("failed to load snapshot {}", path.display()))
}

fn main() -> Result<()> {
    init_tracing();
    let args = cli::Args::parse();

    match args.command {
        cli::Command::Parse {
            repo,
            output,
            workers,
            respect_ignore,
        } => {
            let mut options = ParseOptions::from_env();
            if let Some(workers) = workers {
                options = options.with_workers(workers);
            }
            if respect_ignore {
                options = options.with_respect_ignore_files(true);
            }
            let output = output.unwrap_or_else(|| default_snapshot_path(&repo));
            let report = parse_repository_to(&repo, &output, &options)
                .with_context(|| format!("failed to parse {}", repo.display()))?;
            info!(output = %output.display(), "Snapshot written");
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        cli::Command::Graph { snapshot, modules } => {
            let snapshot = load_snapshot(&snapshot)?;
            let graph = build_module_graph(&snapshot.symbols);
            let export = if modules.is_empty() {
                graph.export()
            } else {
                let mut export = induced_subgraph(&graph, &modules).export();
                export.dropped_edges = graph
                    .dropped_edges()
                    .iter()
                    .filter(|dropped| modules.contains(&dropped.source))
                    .cloned()
                    .collect();
                export
            };
            println!("{}", serde_json::to_string_pretty(&export)?);
            Ok(())
        }
        cli::Command::Symbols {
            snapshot,
            file,
            max_nodes,
            no_functions,
            no_classes,
        } => {
            let snapshot = load_snapshot(&snapshot)?;
            let options = SymbolGraphOptions {
                include_functions: !no_functions,
                include_classes: !no_classes,
                file_path: file,
                max_nodes,
            };
            let graph = build_symbol_graph_with(&snapshot.symbols, &options);
            println!("{}", serde_json::to_string_pretty(&graph.export())?);
            Ok(())
        }
        cli::Command::ModuleEdges { snapshot } => {
            let snapshot = load_snapshot(&snapshot)?;
            let edges = build_module_edges(&snapshot.symbols);
            println!("{}", serde_json::to_string_pretty(&edges)?);
            Ok(())
        }
        cli::Command::Units { snapshot, uid } => {
            let snapshot = load_snapshot(&snapshot)?;
            let rendered: Vec<RenderedUnit> = build_retrieval_units(&snapshot.symbols)
                .into_iter()
                .filter(|unit| uid.as_deref().map_or(true, |uid| unit.uid == uid))
                .map(|unit| RenderedUnit {
                    embedding_text: unit.to_embedding_text(),
                    unit,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rendered)?);
            Ok(())
        }
    }
}
