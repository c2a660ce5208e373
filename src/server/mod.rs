//! Stdio RPC server exposing the index to a host editor.
//!
//! The host speaks the length-framed protocol from [`protocol`] over the
//! process's stdin/stdout and only ever needs three operations: build an
//! index, query a directory (loading its index on demand), and shut
//! down. Each loaded index keeps its own page cache; the registry only
//! serializes the directory-to-index table itself.

pub mod protocol;

use crate::index::{IndexConfig, SearchIndex, build_index};
use anyhow::Result;
use lru::LruCache;
use self::protocol::{FileMatchData, Request, Response, SearchData, read_message, write_message};
use std::collections::HashMap;
use std::io::{self, ErrorKind};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Query responses cached per (directory, query).
const QUERY_CACHE_SIZE: usize = 100;

/// Directory-to-loaded-index table with idempotent load-if-absent
/// semantics. Independently loaded indexes do not contend: only the
/// table lookup itself takes the lock.
pub struct IndexRegistry {
    config: IndexConfig,
    indexes: Mutex<HashMap<PathBuf, Arc<SearchIndex>>>,
}

impl IndexRegistry {
    pub fn new(config: IndexConfig) -> Self {
        Self {
            config,
            indexes: Mutex::new(HashMap::new()),
        }
    }

    /// Return the loaded index for `directory`, loading it first if this
    /// is the first query against it.
    pub fn get_or_load(&self, directory: &Path) -> Result<Arc<SearchIndex>> {
        let mut indexes = self.indexes.lock().unwrap();

        if let Some(index) = indexes.get(directory) {
            return Ok(index.clone());
        }

        let index = Arc::new(SearchIndex::load(directory, &self.config)?);
        indexes.insert(directory.to_path_buf(), index.clone());
        Ok(index)
    }

    /// Drop the cached handle for `directory`, forcing the next query to
    /// reload from disk. Used after a rebuild.
    pub fn invalidate(&self, directory: &Path) {
        self.indexes.lock().unwrap().remove(directory);
    }

    pub fn loaded_count(&self) -> usize {
        self.indexes.lock().unwrap().len()
    }
}

/// Serve requests over stdin/stdout until the peer disconnects or sends
/// a shutdown request.
pub fn serve(config: IndexConfig) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut reader = stdin.lock();
    let mut writer = stdout.lock();
    serve_streams(config, &mut reader, &mut writer)
}

fn serve_streams<R: io::Read, W: io::Write>(
    config: IndexConfig,
    reader: &mut R,
    writer: &mut W,
) -> Result<()> {
    let registry = IndexRegistry::new(config.clone());
    let mut query_cache: LruCache<(PathBuf, String), SearchData> =
        LruCache::new(NonZeroUsize::new(QUERY_CACHE_SIZE).unwrap());

    loop {
        let request: Request = match read_message(reader) {
            Ok(request) => request,
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => return Ok(()),
            Err(err) => return Err(err.into()),
        };

        let response = match request {
            Request::Ping => Response::Pong,

            Request::Shutdown => {
                write_message(writer, &Response::ShuttingDown)?;
                return Ok(());
            }

            Request::Index { directory } => match build_index(&directory, &config, None) {
                Ok(()) => {
                    registry.invalidate(&directory);
                    query_cache.clear();
                    Response::Indexed { directory }
                }
                Err(err) => Response::Error {
                    message: format!("{:#}", err),
                },
            },

            Request::Search { directory, query } => {
                let key = (directory.clone(), query.clone());
                if let Some(data) = query_cache.get(&key) {
                    Response::Search(data.clone())
                } else {
                    match search(&registry, &directory, &query) {
                        Ok(data) => {
                            query_cache.put(key, data.clone());
                            Response::Search(data)
                        }
                        Err(err) => Response::Error {
                            message: format!("{:#}", err),
                        },
                    }
                }
            }
        };

        write_message(writer, &response)?;
    }
}

fn search(registry: &IndexRegistry, directory: &Path, query: &str) -> Result<SearchData> {
    let index = registry.get_or_load(directory)?;
    let result_set = index.query(query)?;

    Ok(SearchData {
        tokens: result_set.tokens,
        matches: result_set
            .results
            .into_iter()
            .map(|result| FileMatchData { path: result.path })
            .collect(),
        files_considered: result_set.files_considered,
        total_files: result_set.total_files,
    })
}
