#![no_main]

use libfuzzer_sys::fuzz_target;
use trix::storage::{FixedStr, Int32, Record, RowRange};

fuzz_target!(|data: &[u8]| {
    // Record decoding from arbitrary bytes must fail cleanly, never panic
    let mut cursor = data;
    let _ = FixedStr::decode(&mut cursor, data.len().min(64).max(1));

    let mut cursor = data;
    let _ = Int32::decode(&mut cursor, 4);

    let mut cursor = data;
    let _ = RowRange::decode(&mut cursor, 8);
});
