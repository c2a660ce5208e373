//! Concurrent tokenization of the candidate file list.
//!
//! A fixed pool of workers (one per available CPU) claims files off a
//! shared atomic cursor. Each worker tokenizes lock-free through its
//! private [`Interner`], then merges the file's deduplicated trigram set
//! into two shared structures, each behind its own lock: the global word
//! set and the word-to-containing-files mapping. Only the
//! O(words-per-file) merge serializes; the O(file-size) extraction does
//! not.

use crate::index::tokenize::trigram_windows;
use crate::intern::{Interner, Word, WordRef};
use ahash::AHashSet;
use anyhow::{Context, Result, anyhow};
use roaring::RoaringBitmap;
use rustc_hash::FxHashMap;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Progress callback: (files claimed so far, total files). Sampled by an
/// observer thread roughly once per second; never invoked by workers.
pub type ProgressFn = dyn Fn(usize, usize) + Sync;

/// Output of the indexing pass. File positions refer to the candidate
/// list the indexer was run over.
pub struct TokenizedCorpus {
    pub words: HashSet<Word>,
    pub word_files: FxHashMap<Word, RoaringBitmap>,
}

/// Tokenize every file in `files`, merging per-worker results into one
/// global word set and word-to-files mapping.
///
/// Fail-fast: any worker error (unreadable file, poisoned state) fails
/// the whole pass after all workers have drained; no partial result is
/// returned and nothing is retried.
pub fn index_files(files: &[String], progress: Option<&ProgressFn>) -> Result<TokenizedCorpus> {
    let cursor = AtomicUsize::new(0);
    let done = AtomicBool::new(false);
    let words: Mutex<HashSet<Word>> = Mutex::new(HashSet::new());
    let word_files: Mutex<FxHashMap<Word, RoaringBitmap>> = Mutex::new(FxHashMap::default());

    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);

    std::thread::scope(|scope| -> Result<()> {
        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            handles.push(scope.spawn(|| worker_loop(files, &cursor, &words, &word_files)));
        }

        if let Some(report) = progress {
            scope.spawn(|| {
                loop {
                    // Sample about once a second, checking often enough to
                    // exit promptly when the build ends.
                    for _ in 0..10 {
                        if done.load(Ordering::Relaxed) {
                            return;
                        }
                        std::thread::sleep(Duration::from_millis(100));
                    }
                    let claimed = cursor.load(Ordering::Relaxed).min(files.len());
                    report(claimed, files.len());
                }
            });
        }

        let mut first_error = None;
        for handle in handles {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    first_error.get_or_insert(err);
                }
                Err(_) => {
                    first_error.get_or_insert(anyhow!("indexing worker panicked"));
                }
            }
        }

        done.store(true, Ordering::Relaxed);
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    })?;

    if let Some(report) = progress {
        report(files.len(), files.len());
    }

    Ok(TokenizedCorpus {
        words: words.into_inner().unwrap(),
        word_files: word_files.into_inner().unwrap(),
    })
}

fn worker_loop(
    files: &[String],
    cursor: &AtomicUsize,
    words: &Mutex<HashSet<Word>>,
    word_files: &Mutex<FxHashMap<Word, RoaringBitmap>>,
) -> Result<()> {
    let mut interner = Interner::new();
    let mut content = String::new();

    loop {
        let next = cursor.fetch_add(1, Ordering::Relaxed);
        if next >= files.len() {
            return Ok(());
        }

        let path = &files[next];
        let bytes = fs::read(Path::new(path))
            .with_context(|| format!("failed to read {} for indexing", path))?;

        // Refill the scan buffer; borrowed keys from the previous file
        // cannot survive this point.
        content.clear();
        content.push_str(&String::from_utf8_lossy(&bytes));

        let file_words = tokenize_file(&content, &mut interner);
        let file_pos = next as u32;

        {
            let mut words = words.lock().unwrap();
            for word in &file_words {
                words.insert(word.clone());
            }
        }
        {
            let mut word_files = word_files.lock().unwrap();
            for word in file_words {
                word_files.entry(word).or_default().insert(file_pos);
            }
        }
    }
}

/// The distinct trigram set of one file, realized through the worker's
/// private interner.
fn tokenize_file(content: &str, interner: &mut Interner) -> Vec<Word> {
    let mut seen: AHashSet<WordRef<'_>> = AHashSet::new();
    let mut file_words = Vec::new();

    for window in trigram_windows(content) {
        if seen.insert(window) {
            file_words.push(interner.realize(window));
        }
    }

    file_words
}
