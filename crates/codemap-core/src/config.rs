//! Runtime options for a repository parse.
//!
//! Options come from the environment (`CODEMAP_WORKERS`,
//! `CODEMAP_RESPECT_IGNORE`) and may be overridden by callers.

pub const WORKERS_ENV: &str = "CODEMAP_WORKERS";
pub const RESPECT_IGNORE_ENV: &str = "CODEMAP_RESPECT_IGNORE";

/// Source-language label written into snapshots.
pub const SOURCE_LANGUAGE: &str = "python";

/// File extension (without the dot) of eligible source files.
pub const SOURCE_EXTENSION: &str = "py";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    /// Width of the per-file extraction pool. `1` runs sequentially.
    pub workers: usize,
    /// Honor `.gitignore` / `.ignore` files during discovery.
    pub respect_ignore_files: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            respect_ignore_files: false,
        }
    }
}

impl ParseOptions {
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Ok(raw) = std::env::var(WORKERS_ENV) {
            if let Some(workers) = parse_workers(&raw) {
                options.workers = workers;
            }
        }
        if let Ok(raw) = std::env::var(RESPECT_IGNORE_ENV) {
            options.respect_ignore_files = parse_flag(&raw);
        }
        options
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_respect_ignore_files(mut self, respect: bool) -> Self {
        self.respect_ignore_files = respect;
        self
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn parse_workers(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

fn parse_flag(raw: &str) -> bool {
    let v = raw.trim().to_lowercase();
    matches!(v.as_str(), "1" | "true" | "yes" | "on")
}
