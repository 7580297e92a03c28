//! Fuzz target for JSON and JSONL document parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use qalabel::convert::json::from_json_documents_slice;
use qalabel::convert::ConvertOptions;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_json_documents_slice(data, &ConvertOptions::default());
});
