#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Fuzz trigram extraction with arbitrary strings
    // Window generation must never panic or slice mid-character
    for window in trix::index::tokenize::trigram_windows(data) {
        let text = window.as_str();
        assert!(text.len() <= 3);
        assert_eq!(text.len(), text.chars().count());
    }
    let _ = trix::index::tokenize::query_trigrams(data);
    let _ = trix::index::tokenize::split_words(data);
});
