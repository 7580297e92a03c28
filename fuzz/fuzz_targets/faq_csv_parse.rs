//! Fuzz target for FAQ CSV parsing.
//!
//! Arbitrary bytes go to the FAQ parser; any panic is a bug.

#![no_main]

use libfuzzer_sys::fuzz_target;
use qalabel::convert::csv_faq::from_faq_csv_slice;
use qalabel::convert::ConvertOptions;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_faq_csv_slice(data, &ConvertOptions::default());
});
