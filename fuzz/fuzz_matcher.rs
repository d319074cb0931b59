//! Fuzz target for alias matching and text collection.
//!
//! Run with: cargo +nightly fuzz run fuzz_matcher
//!
//! The first byte splits the input into a dictionary (one `alias=expected`
//! pair per line) and a Markdown document. Every reported match must slice
//! the unit it came from at the reported character offsets.

#![no_main]

use libfuzzer_sys::fuzz_target;
use proofdict_config::RawTerm;
use proofdict_core::dictionary::normalize;
use proofdict_core::{Document, Matcher, document};

fuzz_target!(|data: &[u8]| {
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let Ok(input) = std::str::from_utf8(rest) else {
        return;
    };
    let mut split = (split as usize).min(input.len());
    while !input.is_char_boundary(split) {
        split -= 1;
    }
    let (dict, text) = input.split_at(split);

    let records: Vec<RawTerm> = dict
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(actual, expected)| RawTerm::new(actual, expected))
        .collect();
    let matcher = Matcher::new(normalize(&records));

    for unit in document::collect(&Document::markdown(text)) {
        for result in matcher.match_text(&unit.text) {
            let matched: String = unit
                .text
                .chars()
                .skip(result.match_start_index)
                .take(result.match_end_index - result.match_start_index)
                .collect();
            assert_eq!(matched, result.actual);
            assert_ne!(result.actual, result.expected);
        }
    }
});
