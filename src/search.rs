//! Line-oriented substring search.
//!
//! A thin collaborator of the table: it shares no state with it. The
//! parallel path splits the lines into one contiguous chunk per worker,
//! scans each chunk on a dedicated rayon pool and concatenates the per-chunk
//! matches in chunk order, so its output equals the sequential output.

use log::{error, trace};
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

/// Worker count used when none is configured.
pub const DEFAULT_WORKERS: usize = 4;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to start {workers} search workers: {source}")]
    Pool {
        workers: usize,
        #[source]
        source: rayon::ThreadPoolBuildError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Number of workers; zero is treated as one.
    pub workers: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
        }
    }
}

impl SearchConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    fn effective_workers(&self) -> usize {
        self.workers.max(1)
    }
}

/// Lines containing `pattern`, in input order.
pub fn search_lines<S: AsRef<str>>(lines: &[S], pattern: &str) -> Vec<String> {
    lines
        .iter()
        .map(|line| line.as_ref())
        .filter(|line| line.contains(pattern))
        .map(str::to_owned)
        .collect()
}

/// A search worker pool, built once and reused across searches.
///
/// Building a rayon pool spawns its threads, so callers running many
/// searches with the same [`SearchConfig`] should keep one `LineSearcher`
/// rather than going through [`search_lines_parallel`] each time.
pub struct LineSearcher {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl LineSearcher {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let workers = config.effective_workers();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("line-search-{i}"))
            .build()
            .map_err(|source| SearchError::Pool { workers, source })?;
        Ok(Self { pool, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Same result as [`search_lines`], computed on this searcher's pool.
    pub fn search<S>(&self, lines: &[S], pattern: &str) -> Vec<String>
    where
        S: AsRef<str> + Sync,
    {
        if lines.is_empty() {
            return Vec::new();
        }
        let chunk_size = lines.len().div_ceil(self.workers);
        trace!(
            "searching {} lines with {} workers, {} lines per chunk",
            lines.len(),
            self.workers,
            chunk_size
        );

        // Each chunk returns its own list; `collect` keeps chunk order.
        let per_chunk: Vec<Vec<String>> = self.pool.install(|| {
            lines
                .par_chunks(chunk_size)
                .map(|chunk| search_lines(chunk, pattern))
                .collect()
        });
        per_chunk.into_iter().flatten().collect()
    }

    /// Matching lines of the file at `path`.
    ///
    /// Open and read failures are logged and yield an empty result.
    pub fn search_file<P: AsRef<Path>>(&self, path: P, pattern: &str) -> Vec<String> {
        match read_lines(path.as_ref()) {
            Ok(lines) => self.search(&lines, pattern),
            Err(err) => {
                error!("{err}");
                Vec::new()
            }
        }
    }
}

/// Same result as [`search_lines`], computed by `config.workers` workers.
///
/// Builds a fresh pool on every call; see [`LineSearcher`] to reuse one.
pub fn search_lines_parallel<S>(
    lines: &[S],
    pattern: &str,
    config: &SearchConfig,
) -> Result<Vec<String>, SearchError>
where
    S: AsRef<str> + Sync,
{
    if lines.is_empty() {
        return Ok(Vec::new());
    }
    Ok(LineSearcher::new(config)?.search(lines, pattern))
}

/// Lines of the file split on `\n`, with a trailing `\r` dropped. Bytes that
/// are not valid UTF-8 become U+FFFD; only the line holding them is affected.
fn read_lines(path: &Path) -> Result<Vec<String>, SearchError> {
    let display = path.display().to_string();
    let file = File::open(path).map_err(|source| SearchError::Open {
        path: display.clone(),
        source,
    })?;
    let mut lines = Vec::new();
    for line in BufReader::new(file).split(b'\n') {
        let mut line = line.map_err(|source| SearchError::Read {
            path: display.clone(),
            source,
        })?;
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        let line = String::from_utf8(line)
            .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned());
        lines.push(line);
    }
    Ok(lines)
}

/// Matching lines of the file at `path`.
///
/// Failures are logged and yield an empty result.
pub fn search_file<P: AsRef<Path>>(path: P, pattern: &str, config: &SearchConfig) -> Vec<String> {
    match LineSearcher::new(config) {
        Ok(searcher) => searcher.search_file(path, pattern),
        Err(err) => {
            error!("{err}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<String> {
        (0..37)
            .map(|i| {
                if i % 5 == 0 {
                    format!("line {i}: needle here")
                } else {
                    format!("line {i}: hay")
                }
            })
            .collect()
    }

    #[test]
    fn sequential_keeps_input_order() {
        let lines = ["abc", "xbx", "b", "zzz"];
        assert_eq!(search_lines(&lines, "b"), vec!["abc", "xbx", "b"]);
        assert!(search_lines(&lines, "q").is_empty());
    }

    /// Invariant: the empty pattern matches every line.
    #[test]
    fn empty_pattern_matches_all() {
        let lines = ["", "a"];
        assert_eq!(search_lines(&lines, ""), vec!["", "a"]);
    }

    /// Invariant: parallel output equals sequential output for any worker count,
    /// including more workers than lines.
    #[test]
    fn parallel_matches_sequential() {
        let lines = sample();
        let expected = search_lines(&lines, "needle");
        assert_eq!(expected.len(), 8);
        for workers in [0, 1, 2, 3, 4, 7, 64] {
            let cfg = SearchConfig::default().with_workers(workers);
            let got = search_lines_parallel(&lines, "needle", &cfg).unwrap();
            assert_eq!(got, expected, "workers = {workers}");
        }
    }

    #[test]
    fn parallel_on_empty_input() {
        let lines: [&str; 0] = [];
        let got = search_lines_parallel(&lines, "x", &SearchConfig::default()).unwrap();
        assert!(got.is_empty());
    }

    /// Invariant: one pool serves repeated searches with unchanged results.
    #[test]
    fn searcher_is_reusable() {
        let lines = sample();
        let searcher = LineSearcher::new(&SearchConfig::default().with_workers(3)).unwrap();
        assert_eq!(searcher.workers(), 3);
        for pattern in ["needle", "hay", "line 3", "absent"] {
            assert_eq!(searcher.search(&lines, pattern), search_lines(&lines, pattern));
            assert_eq!(searcher.search(&lines, pattern), search_lines(&lines, pattern));
        }
    }

    /// Invariant: a bad byte only affects its own line; CRLF endings are
    /// trimmed like LF.
    #[test]
    fn read_lines_keeps_lines_around_invalid_bytes() {
        use std::io::Write;
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"first\r\nsec\xffond\nthird").unwrap();
        f.flush().unwrap();
        let lines = read_lines(f.path()).unwrap();
        assert_eq!(lines, vec!["first", "sec\u{FFFD}ond", "third"]);
    }

    #[test]
    fn default_worker_count() {
        assert_eq!(SearchConfig::default().workers, DEFAULT_WORKERS);
        assert_eq!(SearchConfig::default().with_workers(0).effective_workers(), 1);
    }
}
