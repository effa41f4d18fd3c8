use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "codemap",
    version,
    about = "Static symbol map for Python repositories",
    after_help = r#"Examples:
  codemap parse ./service
  codemap parse ./service --output /tmp/symbols.json --workers 4
  codemap graph ./service/.codemap/symbols.json --modules app.py,util.py
  codemap symbols ./service/.codemap/symbols.json --file app.py --max-nodes 50
  codemap units ./service/.codemap/symbols.json --uid app.main
"#
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Parse a repository and write its symbol snapshot.
    Parse {
        repo: PathBuf,
        /// Snapshot destination (default: <repo>/.codemap/symbols.json).
        #[arg(long)]
        output: Option<PathBuf>,
        /// Worker threads for per-file extraction.
        #[arg(long)]
        workers: Option<usize>,
        /// Honor .gitignore and .ignore files during discovery.
        #[arg(long)]
        respect_ignore: bool,
    },
    /// Print the module dependency graph of a snapshot.
    Graph {
        snapshot: PathBuf,
        /// Restrict the graph to these module file paths.
        #[arg(long, value_delimiter = ',')]
        modules: Vec<String>,
    },
    /// Print the symbol dependency graph of a snapshot.
    Symbols {
        snapshot: PathBuf,
        /// Only symbols defined in this file.
        #[arg(long)]
        file: Option<String>,
        /// Keep at most this many nodes, the most connected first.
        #[arg(long)]
        max_nodes: Option<usize>,
        #[arg(long)]
        no_functions: bool,
        #[arg(long)]
        no_classes: bool,
    },
    /// Print module-to-module edges keyed by qualified name.
    ModuleEdges { snapshot: PathBuf },
    /// Print retrieval units with their embedding text.
    Units {
        snapshot: PathBuf,
        /// Only units for this uid.
        #[arg(long)]
        uid: Option<String>,
    },
}
