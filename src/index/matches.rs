//! Deferred literal verification of candidate files.

use crate::index::tokenize::contains_ignore_ascii_case;
use anyhow::{Context, Result};
use memchr::memmem;
use std::fs;
use std::path::Path;

/// One verified occurrence of a query token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMatch {
    pub token: String,
    pub line_number: usize,
}

/// A match collection bound to one candidate file and the query's word
/// tokens. Construction is free; the file is only read and scanned when
/// [`collect`](Self::collect) is called, keeping the hot query path
/// independent of file contents.
#[derive(Debug, Clone)]
pub struct LazyMatchCollection {
    path: String,
    tokens: Vec<String>,
}

impl LazyMatchCollection {
    pub(crate) fn new(path: String, tokens: Vec<String>) -> Self {
        Self { path, tokens }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Scan the file for literal, case-insensitive occurrences of the
    /// query tokens, line by line.
    ///
    /// Best-effort binary rejection: a line containing three consecutive
    /// NUL bytes marks the whole file binary, and everything accumulated
    /// for it is discarded.
    pub fn collect(&self) -> Result<Vec<LineMatch>> {
        let bytes = fs::read(Path::new(&self.path))
            .with_context(|| format!("failed to read {} for verification", self.path))?;
        let text = String::from_utf8_lossy(&bytes);

        let nul_run = memmem::Finder::new(b"\x00\x00\x00");
        let mut matches = Vec::new();

        for (number, line) in text.lines().enumerate() {
            if nul_run.find(line.as_bytes()).is_some() {
                matches.clear();
                break;
            }

            for token in &self.tokens {
                if contains_ignore_ascii_case(line, token) {
                    matches.push(LineMatch {
                        token: token.clone(),
                        line_number: number + 1,
                    });
                }
            }
        }

        Ok(matches)
    }
}
