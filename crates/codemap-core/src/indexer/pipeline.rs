//! Repository parsing pipeline with Rayon-based parallelism.
//!
//! discovery → per-file indexing and resolution (parallel) → linking.
//! Files that fail to read or parse are logged and skipped; only discovery
//! failures abort a run.

use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{ParseOptions, SOURCE_LANGUAGE};
use crate::errors::{CodemapError, CodemapResult};
use crate::indexer::cache::ParseCache;
use crate::indexer::filesystem::{compute_content_hash, discover, FileDescriptor};
use crate::indexer::linker::compute_edges;
use crate::indexer::parser::decode_source;
use crate::indexer::resolver::resolve;
use crate::indexer::symbols::SyntaxIndexer;
use crate::models::{RepoInfo, Snapshot, Symbol};

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub path: String,
    pub message: String,
}

/// Summary of one parse run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ParseReport {
    pub files_seen: usize,
    pub files_parsed: usize,
    pub files_cached: usize,
    pub files_failed: usize,
    pub symbols: usize,
    pub edges: usize,
    pub external_dependencies: usize,
    pub failures: Vec<FileFailure>,
    pub elapsed_ms: u64,
}

pub struct ParseOutcome {
    pub snapshot: Snapshot,
    pub report: ParseReport,
}

struct FileResult {
    content_hash: String,
    symbols: Vec<Symbol>,
    cached: bool,
}

// ---------------------------------------------------------------------------
// RepositoryParser
// ---------------------------------------------------------------------------

pub struct RepositoryParser {
    options: ParseOptions,
    cache: Option<ParseCache>,
}

impl RepositoryParser {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            cache: None,
        }
    }

    /// Keep resolved symbols between runs so unchanged files skip parsing.
    pub fn with_cache(mut self) -> Self {
        self.cache = Some(ParseCache::new());
        self
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn cache(&self) -> Option<&ParseCache> {
        self.cache.as_ref()
    }

    pub fn parse(&mut self, root: &Path) -> CodemapResult<ParseOutcome> {
        let started = Instant::now();
        info!("Parsing repository {}", root.display());

        let absolute_root = std::fs::canonicalize(root).map_err(|e| CodemapError::Discovery {
            root: root.to_path_buf(),
            message: e.to_string(),
        })?;
        let files = discover(root, &self.options)?;
        info!("Discovered {} source files", files.len());

        // Surface a broken grammar once instead of as a failure per file.
        SyntaxIndexer::new()?;

        let results = parallel_index(&files, self.cache.as_ref(), self.options.workers);

        let mut report = ParseReport {
            files_seen: files.len(),
            ..ParseReport::default()
        };
        let mut symbols = Vec::new();
        for (file, result) in files.iter().zip(results) {
            match result {
                Ok(result) => {
                    if result.cached {
                        report.files_cached += 1;
                    } else {
                        report.files_parsed += 1;
                        if let Some(cache) = self.cache.as_mut() {
                            cache.insert(&file.relative_path, &result.content_hash, &result.symbols);
                        }
                    }
                    symbols.extend(result.symbols);
                }
                Err(err) => {
                    warn!("Skipping {}: {err}", file.relative_path);
                    report.failures.push(FileFailure {
                        path: file.relative_path.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }
        report.files_failed = report.failures.len();

        if let Some(cache) = self.cache.as_mut() {
            let live: HashSet<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
            cache.retain_paths(&live);
        }

        info!("Extracted {} symbols", symbols.len());
        let edges = compute_edges(&symbols);
        report.edges = edges.edge_count();
        report.external_dependencies = edges.external_count();
        let symbols = edges.apply(symbols);
        report.symbols = symbols.len();
        report.elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            files = report.files_seen,
            failed = report.files_failed,
            symbols = report.symbols,
            edges = report.edges,
            elapsed_ms = report.elapsed_ms,
            "Parse complete"
        );

        let snapshot = Snapshot {
            repo: RepoInfo {
                name: root.to_string_lossy().to_string(),
                language: SOURCE_LANGUAGE.to_string(),
                absolute_path: absolute_root.to_string_lossy().to_string(),
            },
            symbols,
        };
        Ok(ParseOutcome { snapshot, report })
    }
}

/// One-shot parse without a cache.
pub fn parse_repository(root: &Path, options: &ParseOptions) -> CodemapResult<ParseOutcome> {
    RepositoryParser::new(options.clone()).parse(root)
}

/// Parse and persist the snapshot at `output`. The previous snapshot is only
/// replaced once the whole run has succeeded.
pub fn parse_repository_to(
    root: &Path,
    output: &Path,
    options: &ParseOptions,
) -> CodemapResult<ParseReport> {
    let outcome = parse_repository(root, options)?;
    outcome.snapshot.save(output)?;
    info!("Saved snapshot to {}", output.display());
    Ok(outcome.report)
}

// ---------------------------------------------------------------------------
// Per-file work
// ---------------------------------------------------------------------------

/// Index every file, in parallel when a pool can be built, returning results
/// in the order of `files`.
fn parallel_index(
    files: &[FileDescriptor],
    cache: Option<&ParseCache>,
    workers: usize,
) -> Vec<CodemapResult<FileResult>> {
    if files.is_empty() {
        return vec![];
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build();

    match pool {
        Ok(pool) => pool.install(|| {
            files
                .par_iter()
                .map_init(SyntaxIndexer::new, |indexer, file| {
                    index_file(file, cache, indexer)
                })
                .collect()
        }),
        Err(err) => {
            warn!("Falling back to sequential indexing: {err}");
            let mut indexer = SyntaxIndexer::new();
            files
                .iter()
                .map(|file| index_file(file, cache, &mut indexer))
                .collect()
        }
    }
}

fn index_file(
    file: &FileDescriptor,
    cache: Option<&ParseCache>,
    indexer: &mut CodemapResult<SyntaxIndexer>,
) -> CodemapResult<FileResult> {
    let bytes = std::fs::read(&file.path)
        .map_err(|e| CodemapError::file_parse(&file.relative_path, e.to_string()))?;
    let content_hash = compute_content_hash(&bytes);

    if let Some(symbols) = cache.and_then(|c| c.get(&file.relative_path, &content_hash)) {
        debug!("Cache hit for {}", file.relative_path);
        return Ok(FileResult {
            content_hash,
            symbols: symbols.to_vec(),
            cached: true,
        });
    }

    let source = decode_source(&file.relative_path, bytes)?;
    let indexer = indexer
        .as_mut()
        .map_err(|e| CodemapError::file_parse(&file.relative_path, e.to_string()))?;
    let raw = indexer.index_source(&file.relative_path, source)?;
    let symbols = resolve(&file.relative_path, raw);
    debug!("Indexed {} ({} symbols)", file.relative_path, symbols.len());

    Ok(FileResult {
        content_hash,
        symbols,
        cached: false,
    })
}
