//! Fuzz target for label decoding followed by aggregation.

#![no_main]

use libfuzzer_sys::fuzz_target;
use qalabel::aggregate::{aggregate_labels, AggregateOptions};
use qalabel::schema::Label;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(labels) = serde_json::from_slice::<Vec<Label>>(data) {
        let _ = aggregate_labels(labels, &AggregateOptions::default());
    }
});
