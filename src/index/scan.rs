//! Candidate file discovery.

use crate::index::IndexConfig;
use anyhow::{Context, Result};
use ignore::WalkBuilder;
use std::path::Path;

/// Collect the files under `root` eligible for indexing.
///
/// Excluded: hidden and VCS-ignored entries, directories from the
/// configured skip list, known binary/artifact extensions, files above
/// the size limit, and any path whose UTF-8 byte length differs from its
/// character length. The storage format stores one byte per character,
/// so such paths cannot be serialized; they are silently dropped rather
/// than failing the build.
///
/// The result is sorted, which makes candidate positions deterministic.
pub fn collect_files(root: &Path, config: &IndexConfig) -> Result<Vec<String>> {
    let ignored_dirs = config.ignored_dirs.clone();

    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .filter_entry(move |entry| {
            let name = entry.file_name().to_string_lossy();
            !ignored_dirs.iter().any(|dir| dir.as_str() == name.as_ref())
        })
        .build();

    let mut files = Vec::new();

    for entry in walker {
        let entry = entry.context("failed to walk directory")?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            let ext = ext.to_ascii_lowercase();
            if config.excluded_extensions.iter().any(|e| *e == ext) {
                continue;
            }
        }

        let size = entry.metadata().map(|m| m.len()).unwrap_or(u64::MAX);
        if size > config.max_file_size {
            continue;
        }

        let Some(text) = path.to_str() else {
            continue;
        };
        if text.len() != text.chars().count() {
            continue;
        }

        files.push(text.to_string());
    }

    files.sort_unstable();
    Ok(files)
}
