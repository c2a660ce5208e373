//! Zero-copy word interning for the tokenization hot path.
//!
//! Scanning produces huge numbers of short, repetitive keys. Borrowed
//! [`WordRef`]s are plain slices of a worker's scan buffer - no
//! allocation, and the borrow checker rejects any use after the buffer
//! has been refilled for the next file. [`Interner::realize`] converts a
//! borrowed key into the canonical, deduplicated uppercase [`Word`],
//! allocating only the first time a given content is seen.
//!
//! Keys compare and hash by character content (never identity), so a
//! borrowed slice can probe a cache of owned keys directly. Hashing is
//! deliberately stable: hash-bucketed structures derived from the index
//! must be reproducible across runs and processes, independent of the
//! standard library's randomized hashing.

use std::collections::HashMap;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::Arc;

/// Stable string hash: a dual-state djb2 variant that alternates
/// characters between two accumulators. Identical content yields
/// identical bits in every run and process. Case-folded to ASCII
/// uppercase so a raw borrowed key hashes like its canonical form.
pub fn stable_hash(text: &str) -> u32 {
    let mut hasher = StableHasher::default();
    hasher.write(text.as_bytes());
    hasher.finish32()
}

/// Hasher behind [`stable_hash`], usable as a map hasher through
/// [`StableState`].
#[derive(Debug, Clone)]
pub struct StableHasher {
    h1: u32,
    h2: u32,
    odd: bool,
}

impl Default for StableHasher {
    fn default() -> Self {
        Self {
            h1: 5381,
            h2: 5381,
            odd: false,
        }
    }
}

impl StableHasher {
    fn finish32(&self) -> u32 {
        self.h1.wrapping_add(self.h2.wrapping_mul(1_566_083_941))
    }
}

impl Hasher for StableHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            let c = byte.to_ascii_uppercase() as u32;
            if self.odd {
                self.h2 = (self.h2 << 5).wrapping_add(self.h2) ^ c;
            } else {
                self.h1 = (self.h1 << 5).wrapping_add(self.h1) ^ c;
            }
            self.odd = !self.odd;
        }
    }

    fn finish(&self) -> u64 {
        self.finish32() as u64
    }
}

/// `BuildHasher` producing [`StableHasher`]s seeded identically every
/// time, so bucket layout and iteration are reproducible.
#[derive(Debug, Default, Clone)]
pub struct StableState;

impl BuildHasher for StableState {
    type Hasher = StableHasher;

    fn build_hasher(&self) -> StableHasher {
        StableHasher::default()
    }
}

/// Borrowed view of a word inside a scan buffer. Valid only while the
/// buffer it points into is unchanged; equality and hashing are
/// case-insensitive over content.
#[derive(Debug, Clone, Copy)]
pub struct WordRef<'a>(&'a str);

impl<'a> WordRef<'a> {
    pub fn new(text: &'a str) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &'a str {
        self.0
    }
}

impl PartialEq for WordRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(other.0)
    }
}

impl Eq for WordRef<'_> {}

impl Hash for WordRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(stable_hash(self.0));
    }
}

/// Canonical, deduplicated, uppercase form of a word. Cheap to clone;
/// clones of the same realized word share one allocation.
#[derive(Debug, Clone)]
pub struct Word(Arc<str>);

impl Word {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether two words are clones of the same realized instance.
    pub fn same_instance(a: &Word, b: &Word) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl PartialEq for Word {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Word {}

impl Hash for Word {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(stable_hash(&self.0));
    }
}

impl PartialOrd for Word {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Word {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

/// Per-worker cache turning borrowed keys into canonical [`Word`]s.
///
/// Each indexing worker owns one interner, so realization never contends
/// across threads; cross-worker deduplication happens later, in the
/// lock-protected merge.
pub struct Interner {
    realized: HashMap<Box<str>, Word, StableState>,
    scratch: String,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    pub fn new() -> Self {
        Self {
            realized: HashMap::with_hasher(StableState),
            scratch: String::new(),
        }
    }

    /// Number of distinct words realized so far.
    pub fn len(&self) -> usize {
        self.realized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.realized.is_empty()
    }

    /// Return the canonical owned word for `key`, allocating an uppercase
    /// copy only if this content has not been seen before. Probing reuses
    /// a scratch buffer, so a cache hit allocates nothing.
    pub fn realize(&mut self, key: WordRef<'_>) -> Word {
        self.scratch.clear();
        self.scratch
            .extend(key.as_str().chars().map(|c| c.to_ascii_uppercase()));

        if let Some(existing) = self.realized.get(self.scratch.as_str()) {
            return existing.clone();
        }

        let word = Word(Arc::from(self.scratch.as_str()));
        self.realized
            .insert(Box::from(self.scratch.as_str()), word.clone());
        word
    }
}
