//! Loading and querying a built index.

use crate::index::matches::LazyMatchCollection;
use crate::index::tokenize::{contains_ignore_ascii_case, query_trigrams, query_words};
use crate::index::{INDEX_FILE_NAME, IndexConfig};
use crate::storage::{CacheStats, FixedStr, Int32, PageCache, PagedList, PagedList2D, StorageReader};
use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

/// Ranked results are capped at this many entries.
const MAX_RESULTS: usize = 10;

/// A ranked candidate: the file path and its deferred match collection.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub path: String,
    pub matches: LazyMatchCollection,
}

/// The outcome of one query, including how far the index narrowed the
/// search.
#[derive(Debug, Clone)]
pub struct ResultSet {
    /// Whole-word tokens of the query, used for ranking and highlighting.
    pub tokens: Vec<String>,
    /// Ranked candidates, at most [`MAX_RESULTS`].
    pub results: Vec<SearchResult>,
    /// Candidates that matched every query trigram, before truncation.
    pub files_considered: usize,
    /// Total files in the index.
    pub total_files: usize,
}

/// A loaded, immutable index: the three on-disk lists reopened through
/// one shared page cache.
///
/// Queries may run concurrently; they serialize only on the page cache
/// and the underlying file handle. Dropping the index closes the reader.
pub struct SearchIndex {
    words: PagedList<FixedStr>,
    files: PagedList<FixedStr>,
    mapping: PagedList2D<Int32>,
    cache: Arc<PageCache>,
}

impl SearchIndex {
    /// Reopen the index previously built in `directory`. The sections are
    /// opened in the exact order they were written; a corrupt or
    /// incompatible file fails the load.
    pub fn load(directory: &Path, config: &IndexConfig) -> Result<Self> {
        let path = directory.join(INDEX_FILE_NAME);
        let mut reader = StorageReader::open(&path)
            .with_context(|| format!("failed to load index for {}", directory.display()))?;

        let cache = Arc::new(PageCache::new(config.cache_pages, config.records_per_page));

        let words = PagedList::open(&mut reader, cache.clone())?;
        let files = PagedList::open(&mut reader, cache.clone())?;
        let mapping = PagedList2D::open(&mut reader, cache.clone())?;

        Ok(Self {
            words,
            files,
            mapping,
            cache,
        })
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Word at `index` in the sorted word list.
    pub fn word_at(&self, index: usize) -> Result<String> {
        Ok(self.words.get(index)?.into_string())
    }

    /// File path at `index` in the sorted file list.
    pub fn file_at(&self, index: usize) -> Result<String> {
        Ok(self.files.get(index)?.into_string())
    }

    /// File positions containing the word at `index`.
    pub fn containing_files(&self, index: usize) -> Result<Vec<u32>> {
        let row = self.mapping.row(index)?;
        row.iter().map(|entry| Ok(entry?.0)).collect()
    }

    /// Answer `query` from the index: trigram containment narrows the
    /// candidates, ranking orders them, and verification is deferred into
    /// each result's match collection.
    pub fn query(&self, query: &str) -> Result<ResultSet> {
        let trigrams = query_trigrams(query);
        let tokens = query_words(query);

        // Filter phase: tally how many distinct query trigrams each file
        // position matched.
        let mut tally: FxHashMap<u32, usize> = FxHashMap::default();
        for trigram in &trigrams {
            let Some(word_index) = self.find_word(trigram)? else {
                continue;
            };

            let row = self.mapping.row(word_index)?;
            for entry in row.iter() {
                *tally.entry(entry?.0).or_insert(0) += 1;
            }
        }

        // Full containment: a candidate must have matched every query
        // trigram. Necessary but not sufficient for the literal substring;
        // trigrams discard position information.
        let candidates: Vec<u32> = tally
            .into_iter()
            .filter(|&(_, matched)| matched == trigrams.len())
            .map(|(file_index, _)| file_index)
            .collect();
        let files_considered = candidates.len();

        let mut results = Vec::with_capacity(candidates.len());
        for file_index in candidates {
            let path = self.files.get(file_index as usize)?.into_string();
            let matches = LazyMatchCollection::new(path.clone(), tokens.clone());
            results.push(SearchResult { path, matches });
        }

        rank_results(&mut results, &trigrams, &tokens);
        results.truncate(MAX_RESULTS);

        Ok(ResultSet {
            tokens,
            results,
            files_considered,
            total_files: self.files.len(),
        })
    }

    /// Binary search the sorted word list for an exact occurrence of
    /// `value`. Returns some matching index - not necessarily the first
    /// of a run of equal entries.
    fn find_word(&self, value: &str) -> Result<Option<usize>> {
        let mut lo = 0isize;
        let mut hi = self.words.len() as isize - 1;

        while lo <= hi {
            let mid = (lo + hi) / 2;
            let entry = self.words.get(mid as usize)?;
            match entry.as_str().cmp(value) {
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid - 1,
                Ordering::Equal => return Ok(Some(mid as usize)),
            }
        }

        Ok(None)
    }
}

/// Order candidates for presentation:
/// 1. files whose name (without extension) exactly equals a query
///    trigram or token;
/// 2. then files whose name contains any query token;
/// 3. within ties, paths containing "Test" sink to the bottom - test
///    files are noisy and rarely what a search is after.
fn rank_results(results: &mut [SearchResult], trigrams: &[String], tokens: &[String]) {
    results.sort_by_cached_key(|result| {
        let path = Path::new(&result.path);
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
        let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");

        let exact_stem = trigrams
            .iter()
            .chain(tokens)
            .any(|term| stem.eq_ignore_ascii_case(term));
        let name_contains = tokens
            .iter()
            .any(|token| contains_ignore_ascii_case(name, token));
        let looks_like_test = result.path.contains("Test");

        (!exact_stem, !name_contains, looks_like_test)
    });
}
