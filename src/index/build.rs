//! Building the on-disk index.

use crate::index::indexer::{ProgressFn, index_files};
use crate::index::scan::collect_files;
use crate::index::IndexConfig;
use crate::intern::Word;
use crate::storage::{FixedStr, Int32, PagedList, PagedList2D, StorageWriter};
use anyhow::{Context, Result};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::path::Path;

/// Name of the index file written into the indexed directory.
pub const INDEX_FILE_NAME: &str = "index.dat";

/// Build `directory`'s index from scratch and write it to `index.dat`
/// inside that directory. Every build is a full rebuild; a failed build
/// publishes nothing usable (the footer is only patched on success).
pub fn build_index(
    directory: &Path,
    config: &IndexConfig,
    progress: Option<&ProgressFn>,
) -> Result<()> {
    let files = collect_files(directory, config)
        .with_context(|| format!("failed to scan {}", directory.display()))?;

    let corpus = index_files(&files, progress)?;

    let mut sorted_words: Vec<Word> = corpus.words.into_iter().collect();
    // Words are canonical uppercase, so ordinal order is ordinal
    // case-insensitive order.
    sorted_words.par_sort_unstable();

    let mut sorted_files = files.clone();
    sorted_files.par_sort_unstable();

    // Position dictionary: candidate position -> sorted position. One map
    // build instead of a per-word search.
    let file_pos: FxHashMap<&str, u32> = sorted_files
        .iter()
        .enumerate()
        .map(|(i, file)| (file.as_str(), i as u32))
        .collect();
    let sorted_pos: Vec<u32> = files.iter().map(|file| file_pos[file.as_str()]).collect();

    let mut rows: Vec<Vec<Int32>> = Vec::with_capacity(sorted_words.len());
    for word in &sorted_words {
        let mut row: Vec<u32> = match corpus.word_files.get(word) {
            Some(containing) => containing
                .iter()
                .map(|candidate| sorted_pos[candidate as usize])
                .collect(),
            None => Vec::new(),
        };
        row.sort_unstable();
        rows.push(row.into_iter().map(Int32).collect());
    }

    let word_width = sorted_words
        .iter()
        .map(|w| w.as_str().len())
        .max()
        .unwrap_or(0)
        .max(1);
    let file_width = sorted_files.iter().map(|f| f.len()).max().unwrap_or(0).max(1);

    let index_path = directory.join(INDEX_FILE_NAME);
    let mut writer = StorageWriter::create(&index_path)?;

    PagedList::write(
        &mut writer,
        word_width,
        sorted_words.iter().map(|w| FixedStr::new(w.as_str())),
    )?;
    PagedList::write(
        &mut writer,
        file_width,
        sorted_files.iter().map(FixedStr::new),
    )?;
    PagedList2D::write(&mut writer, 4, &rows)?;

    writer.finish()?;
    Ok(())
}
