//! End-to-end tests over the build/load/query cycle.
//!
//! Each test builds its own fixture directory under the system temp dir
//! so runs are isolated per test and per process.

use std::fs;
use std::path::PathBuf;
use trix::index::{INDEX_FILE_NAME, IndexConfig, SearchIndex, build_index};

fn fixture_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join("trix_e2e")
        .join(format!("{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("Failed to create fixture dir");
    dir
}

fn build_and_load(dir: &PathBuf, config: &IndexConfig) -> SearchIndex {
    build_index(dir, config, None).expect("build failed");
    SearchIndex::load(dir, config).expect("load failed")
}

#[test]
fn query_scenario_two_files() {
    let dir = fixture_dir("scenario");
    fs::write(dir.join("a.py"), "def foo(): pass").unwrap();
    fs::write(dir.join("b.py"), "bar baz").unwrap();

    let config = IndexConfig::default();
    let index = build_and_load(&dir, &config);

    assert_eq!(index.file_count(), 2);

    // "foo" narrows to exactly a.py.
    let results = index.query("foo").unwrap();
    assert_eq!(results.files_considered, 1);
    assert_eq!(results.total_files, 2);
    assert_eq!(results.results.len(), 1);
    assert!(results.results[0].path.ends_with("a.py"));

    // "qux" matches nothing at all.
    let results = index.query("qux").unwrap();
    assert_eq!(results.files_considered, 0);
    assert!(results.results.is_empty());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn trigram_containment_is_necessary_not_sufficient() {
    let dir = fixture_dir("containment");
    fs::write(dir.join("a.txt"), "foobar").unwrap();
    fs::write(dir.join("b.txt"), "foo bar").unwrap();

    let config = IndexConfig::default();
    let index = build_and_load(&dir, &config);

    // "FOO" occurs in both files, so both survive the filter phase.
    let results = index.query("foo").unwrap();
    assert_eq!(results.files_considered, 2);

    // "oob"/"oba" only occur in the contiguous file.
    let results = index.query("foobar").unwrap();
    assert_eq!(results.files_considered, 1);
    assert!(results.results[0].path.ends_with("a.txt"));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn loaded_lists_are_sorted_and_mapping_is_valid() {
    let dir = fixture_dir("invariants");
    fs::write(dir.join("one.rs"), "fn alpha() { beta(); }").unwrap();
    fs::write(dir.join("two.rs"), "struct Gamma; impl Gamma {}").unwrap();
    fs::write(dir.join("three.rs"), "let delta = alpha();").unwrap();

    let config = IndexConfig::default();
    let index = build_and_load(&dir, &config);

    let words: Vec<String> = (0..index.word_count())
        .map(|i| index.word_at(i).unwrap())
        .collect();
    for pair in words.windows(2) {
        assert!(pair[0] <= pair[1], "words out of order: {:?}", pair);
    }

    let files: Vec<String> = (0..index.file_count())
        .map(|i| index.file_at(i).unwrap())
        .collect();
    for pair in files.windows(2) {
        assert!(pair[0] <= pair[1], "files out of order: {:?}", pair);
    }

    // One mapping row per word; every stored position addresses a file.
    for word_index in 0..index.word_count() {
        let containing = index.containing_files(word_index).unwrap();
        assert!(!containing.is_empty());
        for file_index in containing {
            assert!((file_index as usize) < index.file_count());
        }
    }
    assert!(index.containing_files(index.word_count()).is_err());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn rebuild_reproduces_identical_bytes() {
    let dir = fixture_dir("reproducible");
    fs::write(dir.join("x.rs"), "pub fn compute(input: u32) -> u32 { input * 2 }").unwrap();
    fs::write(dir.join("y.rs"), "fn main() { compute(21); }").unwrap();
    fs::write(dir.join("z.txt"), "notes about compute").unwrap();

    let config = IndexConfig::default();
    build_index(&dir, &config, None).unwrap();
    let first = fs::read(dir.join(INDEX_FILE_NAME)).unwrap();

    build_index(&dir, &config, None).unwrap();
    let second = fs::read(dir.join(INDEX_FILE_NAME)).unwrap();

    assert_eq!(first, second);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn lazy_verification_reports_line_numbers() {
    let dir = fixture_dir("verify");
    fs::write(
        dir.join("code.rs"),
        "fn setup() {}\nfn handle_request() {}\n// request parsing\n",
    )
    .unwrap();

    let config = IndexConfig::default();
    let index = build_and_load(&dir, &config);

    let results = index.query("request").unwrap();
    assert_eq!(results.files_considered, 1);

    let matches = results.results[0].matches.collect().unwrap();
    let lines: Vec<usize> = matches.iter().map(|m| m.line_number).collect();
    assert_eq!(lines, vec![2, 3]);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn queries_hit_the_shared_page_cache() {
    let dir = fixture_dir("cache");
    for i in 0..20 {
        fs::write(
            dir.join(format!("file_{:02}.txt", i)),
            format!("shared content plus unique marker_{:02}", i),
        )
        .unwrap();
    }

    let config = IndexConfig {
        cache_pages: 4,
        records_per_page: 8,
        ..IndexConfig::default()
    };
    let index = build_and_load(&dir, &config);

    index.query("shared content").unwrap();
    index.query("shared content").unwrap();

    let stats = index.cache_stats();
    assert!(stats.lookups > 0);
    assert!(stats.hits > 0);
    // A 4-page cache cannot hold this index's working set.
    assert!(stats.evictions > 0);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn short_queries_match_only_short_fragment_words() {
    let dir = fixture_dir("short");
    fs::write(dir.join("tiny.txt"), "ab").unwrap();
    fs::write(dir.join("long.txt"), "abcdef").unwrap();

    let config = IndexConfig::default();
    let index = build_and_load(&dir, &config);

    // "ab" was indexed as a terminal fragment of the two-byte file only;
    // the longer file contributed full trigrams.
    let results = index.query("ab").unwrap();
    assert_eq!(results.files_considered, 1);
    assert!(results.results[0].path.ends_with("tiny.txt"));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn ranking_caps_results_at_ten() {
    let dir = fixture_dir("cap");
    for i in 0..15 {
        fs::write(
            dir.join(format!("source_{:02}.rs", i)),
            "common needle text",
        )
        .unwrap();
    }

    let config = IndexConfig::default();
    let index = build_and_load(&dir, &config);

    let results = index.query("needle").unwrap();
    assert_eq!(results.files_considered, 15);
    assert_eq!(results.results.len(), 10);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn missing_index_fails_to_load() {
    let dir = fixture_dir("missing");
    let config = IndexConfig::default();
    assert!(SearchIndex::load(&dir, &config).is_err());

    fs::remove_dir_all(&dir).unwrap();
}
