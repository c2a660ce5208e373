//! Index building, loading, and querying.
//!
//! The life of an index: [`build::build_index`] scans a directory,
//! tokenizes every candidate file into trigrams on a worker pool, and
//! writes the sorted word list, file list, and word-to-files mapping into
//! one `index.dat`. [`search::SearchIndex::load`] reopens those sections
//! through a shared page cache, and [`search::SearchIndex::query`]
//! narrows candidates by trigram containment, ranks them, and defers
//! literal verification until a caller asks for a result's matches.

pub mod build;
pub mod indexer;
pub mod matches;
pub mod scan;
pub mod search;
pub mod tokenize;

pub use build::{INDEX_FILE_NAME, build_index};
pub use matches::{LazyMatchCollection, LineMatch};
pub use search::{ResultSet, SearchIndex, SearchResult};

use serde::{Deserialize, Serialize};

/// Configuration for building and loading indexes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Files above this size are unlikely to be source code and are skipped.
    pub max_file_size: u64,
    /// Extensions that never contain searchable text.
    pub excluded_extensions: Vec<String>,
    /// Directory names skipped during the walk.
    pub ignored_dirs: Vec<String>,
    /// Maximum number of pages held by a loaded index's cache.
    pub cache_pages: usize,
    /// Records materialized per page.
    pub records_per_page: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_file_size: 500_000,
            excluded_extensions: [
                "exe", "dll", "pdb", "so", "dylib", "a", "o", "obj", "lib", "bin", "dat",
                "png", "jpg", "jpeg", "gif", "ico", "bmp", "zip", "gz", "tar", "7z", "jar",
                "class", "pdf", "ttf", "woff", "woff2", "eot", "mp3", "mp4", "wasm",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            ignored_dirs: [".git", "node_modules", "target", "__pycache__", ".venv", "venv"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            cache_pages: 256,
            records_per_page: 64,
        }
    }
}
