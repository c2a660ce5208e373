//! # trix - persisted trigram code search
//!
//! trix scans a directory tree once, builds a trigram inverted index of
//! file contents, and serializes it to a compact paged binary file.
//! Substring-style queries are then answered from that file alone - no
//! re-scanning of source trees - by narrowing to the files containing
//! every trigram of the query and lazily verifying literal matches.
//!
//! ## Architecture
//!
//! - [`storage`] - the paged binary storage engine (sectioned file,
//!   fixed-width record lists, shared page cache)
//! - [`intern`] - zero-copy string interning with a stable hash
//! - [`index`] - build/load/query orchestration, tokenization, ranking
//! - [`server`] - length-framed stdio RPC for host editors
//! - [`output`] - result formatting for the command line
//!
//! ## Quick start
//!
//! ```ignore
//! use trix::index::{IndexConfig, SearchIndex, build_index};
//! use std::path::Path;
//!
//! let config = IndexConfig::default();
//! build_index(Path::new("/path/to/codebase"), &config, None).unwrap();
//!
//! let index = SearchIndex::load(Path::new("/path/to/codebase"), &config).unwrap();
//! let results = index.query("paged list").unwrap();
//! for result in &results.results {
//!     println!("{}", result.path);
//! }
//! ```

pub mod index;
pub mod intern;
pub mod output;
#[cfg(feature = "server")]
pub mod server;
pub mod storage;
