//! Trigram and whole-word extraction.
//!
//! Trigrams are the unit of the inverted index; whole-word tokens are
//! only used for ranking and match highlighting.

use crate::intern::WordRef;

/// Delimiters the whole-word tokenizer splits on.
const WORD_DELIMITERS: &[char] = &[
    ' ', '.', '{', '}', '<', '>', '(', ')', '[', ']', ':', ';', '+', '-', '*', '/', '\0', ',',
    '\t', '_', '|', '!', '@', '#', '$', '%', '^', '&', '?', '~',
];

/// Every 3-character sliding window of `text` as a borrowed key, plus a
/// single shorter fragment when the whole input is under 3 characters.
///
/// A window only qualifies as an index key if its UTF-8 byte length
/// equals its character length (the storage format stores one byte per
/// character); windows touching multi-byte sequences are skipped.
pub fn trigram_windows(text: &str) -> TrigramWindows<'_> {
    TrigramWindows { text, pos: 0 }
}

pub struct TrigramWindows<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Iterator for TrigramWindows<'a> {
    type Item = WordRef<'a>;

    fn next(&mut self) -> Option<WordRef<'a>> {
        let bytes = self.text.as_bytes();

        if bytes.len() < 3 {
            if self.pos == 0 && !self.text.is_empty() {
                self.pos = bytes.len();
                // Terminal fragment, subject to the same one-byte-per-char rule.
                if self.text.len() == self.text.chars().count() {
                    return Some(WordRef::new(self.text));
                }
            }
            return None;
        }

        // Three single-byte characters are exactly three ASCII bytes, so a
        // byte window that is all-ASCII is precisely a qualifying
        // 3-character window.
        while self.pos + 3 <= bytes.len() {
            let start = self.pos;
            self.pos += 1;
            if bytes[start..start + 3].iter().all(|b| b.is_ascii()) {
                return Some(WordRef::new(&self.text[start..start + 3]));
            }
        }

        None
    }
}

/// Distinct uppercase trigrams of a query string, in sorted order.
pub fn query_trigrams(query: &str) -> Vec<String> {
    let mut trigrams: Vec<String> = trigram_windows(query)
        .map(|w| w.as_str().to_ascii_uppercase())
        .collect();
    trigrams.sort_unstable();
    trigrams.dedup();
    trigrams
}

/// Whole-word tokens of `text`, split on the fixed delimiter set.
pub fn split_words(text: &str) -> Vec<&str> {
    text.split(WORD_DELIMITERS)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Query tokens for ranking and highlighting, original case preserved.
pub fn query_words(query: &str) -> Vec<String> {
    split_words(query).into_iter().map(str::to_owned).collect()
}

/// Case-insensitive (ASCII) substring containment.
pub fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    if needle.len() > haystack.len() {
        return false;
    }
    haystack
        .as_bytes()
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}

/// Position of the first case-insensitive occurrence of `needle` at or
/// after `from`, as a byte offset.
pub fn find_ignore_ascii_case(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    if needle.is_empty() || from >= haystack.len() {
        return None;
    }
    haystack.as_bytes()[from..]
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
        .map(|pos| from + pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn windows(text: &str) -> Vec<&str> {
        trigram_windows(text).map(|w| w.as_str()).collect()
    }

    #[test]
    fn test_sliding_windows() {
        assert_eq!(windows("hello"), vec!["hel", "ell", "llo"]);
        assert_eq!(windows("abc"), vec!["abc"]);
    }

    #[test]
    fn test_short_input_yields_terminal_fragment() {
        assert_eq!(windows("ab"), vec!["ab"]);
        assert_eq!(windows("a"), vec!["a"]);
        assert!(windows("").is_empty());
    }

    #[test]
    fn test_multibyte_windows_are_skipped() {
        // 'é' is two bytes; every window touching it fails the
        // one-byte-per-char constraint.
        assert_eq!(windows("abcédef"), vec!["abc", "def"]);
        assert!(windows("éé").is_empty());
        assert!(windows("é").is_empty());
    }

    #[test]
    fn test_query_trigrams_are_distinct_and_uppercase() {
        assert_eq!(query_trigrams("Foo"), vec!["FOO"]);
        assert_eq!(query_trigrams("aaaa"), vec!["AAA"]);
        assert_eq!(query_trigrams("fo"), vec!["FO"]);
        assert!(query_trigrams("").is_empty());
    }

    #[test]
    fn test_split_words_drops_empty_segments() {
        assert_eq!(
            split_words("foo.bar(baz, qux)"),
            vec!["foo", "bar", "baz", "qux"]
        );
        assert_eq!(split_words("snake_case_name"), vec!["snake", "case", "name"]);
        assert!(split_words("...:::").is_empty());
    }

    #[test]
    fn test_contains_ignore_ascii_case() {
        assert!(contains_ignore_ascii_case("PagedList.rs", "pagedlist"));
        assert!(contains_ignore_ascii_case("abc", "ABC"));
        assert!(!contains_ignore_ascii_case("abc", "abcd"));
        assert!(!contains_ignore_ascii_case("abc", "xyz"));
    }

    #[test]
    fn test_find_ignore_ascii_case() {
        assert_eq!(find_ignore_ascii_case("a Foo foo", "foo", 0), Some(2));
        assert_eq!(find_ignore_ascii_case("a Foo foo", "foo", 3), Some(6));
        assert_eq!(find_ignore_ascii_case("a Foo foo", "bar", 0), None);
    }
}
