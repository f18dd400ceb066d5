mod common;

use chain_hashmap::{search_file, search_lines, LineSearcher, SearchConfig};
use common::init_test_logger;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_lines(lines: &[String]) -> NamedTempFile {
    let mut f = NamedTempFile::new().expect("temp file");
    for line in lines {
        writeln!(f, "{line}").expect("write line");
    }
    f.flush().expect("flush");
    f
}

#[test]
fn finds_matching_lines_in_file() {
    init_test_logger();
    let lines: Vec<String> = (0..1_000)
        .map(|i| {
            if i % 7 == 0 {
                format!("{i}: ERROR disk full")
            } else {
                format!("{i}: ok")
            }
        })
        .collect();
    let file = write_lines(&lines);

    let got = search_file(file.path(), "ERROR", &SearchConfig::default());
    assert_eq!(got.len(), 143);
    assert_eq!(got, search_lines(&lines, "ERROR"));
    assert!(got.iter().all(|l| l.contains("ERROR")));
}

// Test: worker count is a performance setting only.
// Verifies: every worker count yields the same lines in file order.
#[test]
fn worker_count_does_not_change_output() {
    let lines: Vec<String> = (0..97).map(|i| format!("row {i} mod={}", i % 3)).collect();
    let file = write_lines(&lines);
    let expected = search_file(file.path(), "mod=2", &SearchConfig::default().with_workers(1));
    assert_eq!(expected.len(), 32);
    for workers in [2, 3, 4, 8, 200] {
        let cfg = SearchConfig::default().with_workers(workers);
        assert_eq!(search_file(file.path(), "mod=2", &cfg), expected, "workers = {workers}");
    }
}

#[test]
fn missing_file_yields_empty_result() {
    init_test_logger();
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("does-not-exist.txt");
    assert!(search_file(&missing, "x", &SearchConfig::default()).is_empty());
}

#[test]
fn empty_file_yields_empty_result() {
    let file = write_lines(&[]);
    assert!(search_file(file.path(), "", &SearchConfig::default()).is_empty());
}

// Test: a stray byte that is not valid UTF-8 does not hide the other lines.
// Verifies: valid matching lines are still returned, in file order.
#[test]
fn invalid_utf8_keeps_valid_matches() {
    init_test_logger();
    let mut f = NamedTempFile::new().expect("temp file");
    f.write_all(b"good line\n\xff\xfe bad\nlast line\r\n").expect("write");
    f.flush().expect("flush");
    assert_eq!(
        search_file(f.path(), "line", &SearchConfig::default()),
        vec!["good line", "last line"]
    );
    assert_eq!(
        search_file(f.path(), "bad", &SearchConfig::default()),
        vec!["\u{FFFD}\u{FFFD} bad"]
    );
}

// Test: one searcher serves several files and patterns.
#[test]
fn reused_searcher_matches_fresh_searches() {
    let lines: Vec<String> = (0..50).map(|i| format!("entry {i} tag={}", i % 4)).collect();
    let file = write_lines(&lines);
    let config = SearchConfig::default().with_workers(3);
    let searcher = LineSearcher::new(&config).expect("pool");
    for pattern in ["tag=0", "tag=3", "entry 4", "nothing"] {
        assert_eq!(
            searcher.search_file(file.path(), pattern),
            search_file(file.path(), pattern, &config)
        );
        assert_eq!(searcher.search(&lines, pattern), search_lines(&lines, pattern));
    }
    let dir = tempfile::tempdir().expect("temp dir");
    assert!(searcher.search_file(dir.path().join("gone.txt"), "x").is_empty());
}
