//! Locating dictionary aliases in text.
//!
//! A [`Matcher`] owns the active terms of one scan. [`Matcher::match_text`]
//! finds every occurrence of every alias, drops no-op candidates (matched text
//! already equal to the correction), resolves overlaps in favor of the term
//! that comes first in the dictionary, and returns the survivors in text
//! order.
//!
//! Offsets in [`MatchResult`] count Unicode scalar values, not bytes.

use std::collections::BTreeMap;
use std::ops::Range;

use serde::Serialize;

use crate::dictionary::{Alias, ProofTerm};

/// One located occurrence of an alias with its proposed correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    /// Character offset of the first matched character.
    pub match_start_index: usize,
    /// Character offset one past the last matched character.
    pub match_end_index: usize,
    /// The matched text.
    pub actual: String,
    /// The correction.
    pub expected: String,
    pub description: Option<String>,
    /// Rule identifier of the term that produced the match.
    pub rule: Option<String>,
}

impl MatchResult {
    /// Whether reporting this match would change anything.
    pub fn is_reportable(&self) -> bool {
        self.actual != self.expected
    }
}

/// A candidate before overlap resolution. Offsets are bytes.
#[derive(Debug)]
struct Candidate {
    term: usize,
    alias: usize,
    span: Range<usize>,
    actual: String,
    expected: String,
}

/// Matches a fixed set of terms against arbitrary text.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    terms: Vec<ProofTerm>,
}

impl Matcher {
    /// Build a matcher over `terms`; their order is the overlap priority.
    pub fn new(terms: Vec<ProofTerm>) -> Self {
        Self { terms }
    }

    /// Number of terms this matcher checks.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Scan `text` and return reportable matches in ascending start order.
    pub fn match_text(&self, text: &str) -> Vec<MatchResult> {
        let mut candidates = Vec::new();
        for (term_index, term) in self.terms.iter().enumerate() {
            for (alias_index, alias) in term.aliases.iter().enumerate() {
                collect_candidates(text, term, alias, |span, actual, expected| {
                    if actual != expected {
                        candidates.push(Candidate {
                            term: term_index,
                            alias: alias_index,
                            span,
                            actual,
                            expected,
                        });
                    }
                });
            }
        }

        // Candidates are already in (term, alias, start) order; accept greedily.
        let mut accepted: BTreeMap<usize, Candidate> = BTreeMap::new();
        for candidate in candidates {
            let overlaps_before = accepted
                .range(..candidate.span.end)
                .next_back()
                .is_some_and(|(_, prev)| prev.span.end > candidate.span.start);
            if !overlaps_before {
                accepted.insert(candidate.span.start, candidate);
            }
        }

        let mut chars = CharCursor::new(text);
        accepted
            .into_values()
            .map(|c| {
                let term = &self.terms[c.term];
                let start = chars.char_offset(c.span.start);
                let end = chars.char_offset(c.span.end);
                MatchResult {
                    match_start_index: start,
                    match_end_index: end,
                    actual: c.actual,
                    expected: c.expected,
                    description: term.description.clone(),
                    rule: term.rule_id.clone(),
                }
            })
            .collect()
    }
}

fn collect_candidates<F>(text: &str, term: &ProofTerm, alias: &Alias, mut emit: F)
where
    F: FnMut(Range<usize>, String, String),
{
    match alias {
        Alias::Literal(literal) => {
            for (start, matched) in text.match_indices(literal.as_str()) {
                emit(
                    start..start + matched.len(),
                    matched.to_string(),
                    term.expected.clone(),
                );
            }
        }
        Alias::Pattern { regex, .. } => {
            for caps in regex.captures_iter(text) {
                let Some(m) = caps.get(0) else { continue };
                if m.is_empty() {
                    continue;
                }
                let mut expected = String::new();
                caps.expand(&term.expected, &mut expected);
                emit(m.range(), m.as_str().to_string(), expected);
            }
        }
    }
}

/// Converts ascending byte offsets into character offsets in one pass.
struct CharCursor<'a> {
    text: &'a str,
    byte: usize,
    chars: usize,
}

impl<'a> CharCursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            byte: 0,
            chars: 0,
        }
    }

    /// `byte` must be a char boundary and not below any previous query.
    fn char_offset(&mut self, byte: usize) -> usize {
        self.chars += self.text[self.byte..byte].chars().count();
        self.byte = byte;
        self.chars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::normalize;
    use pretty_assertions::assert_eq;
    use proofdict_config::RawTerm;

    fn matcher(records: &[RawTerm]) -> Matcher {
        Matcher::new(normalize(records))
    }

    fn spans(results: &[MatchResult]) -> Vec<(usize, usize, &str, &str)> {
        results
            .iter()
            .map(|r| {
                (
                    r.match_start_index,
                    r.match_end_index,
                    r.actual.as_str(),
                    r.expected.as_str(),
                )
            })
            .collect()
    }

    #[test]
    fn test_single_literal_match() {
        let results = matcher(&[RawTerm::new("teh", "the")]).match_text("teh cat");
        assert_eq!(
            results,
            vec![MatchResult {
                match_start_index: 0,
                match_end_index: 3,
                actual: "teh".to_string(),
                expected: "the".to_string(),
                description: None,
                rule: None,
            }]
        );
    }

    #[test]
    fn test_all_occurrences_in_order() {
        let results = matcher(&[RawTerm::new("teh", "the")]).match_text("teh and teh");
        assert_eq!(spans(&results), vec![(0, 3, "teh", "the"), (8, 11, "teh", "the")]);
    }

    #[test]
    fn test_literal_is_case_sensitive() {
        let results = matcher(&[RawTerm::new("teh", "the")]).match_text("Teh TEH");
        assert!(results.is_empty());
    }

    #[test]
    fn test_non_overlapping_occurrences_of_one_alias() {
        let results = matcher(&[RawTerm::new("aa", "b")]).match_text("aaaa a");
        assert_eq!(spans(&results), vec![(0, 2, "aa", "b"), (2, 4, "aa", "b")]);
    }

    #[test]
    fn test_identity_alias_is_suppressed() {
        let results = matcher(&[RawTerm::new("the", "the")]).match_text("the cat");
        assert!(results.is_empty());
    }

    #[test]
    fn test_earlier_term_wins_overlap() {
        let records = vec![
            RawTerm::new("web site", "website"),
            RawTerm::new("site map", "sitemap"),
        ];
        let results = matcher(&records).match_text("our web site map");
        assert_eq!(spans(&results), vec![(4, 12, "web site", "website")]);

        let reversed: Vec<_> = records.into_iter().rev().collect();
        let results = matcher(&reversed).match_text("our web site map");
        assert_eq!(spans(&results), vec![(8, 16, "site map", "sitemap")]);
    }

    #[test]
    fn test_earlier_term_wins_even_when_shorter() {
        let records = vec![RawTerm::new("Java", "JAVA"), RawTerm::new("Javascript", "JavaScript")];
        let results = matcher(&records).match_text("Javascript");
        assert_eq!(spans(&results), vec![(0, 4, "Java", "JAVA")]);
    }

    #[test]
    fn test_disjoint_matches_from_different_terms_kept() {
        let records = vec![RawTerm::new("teh", "the"), RawTerm::new("recieve", "receive")];
        let results = matcher(&records).match_text("recieve teh mail");
        assert_eq!(
            spans(&results),
            vec![(0, 7, "recieve", "receive"), (8, 11, "teh", "the")]
        );
    }

    #[test]
    fn test_identity_candidate_does_not_block_other_terms() {
        let records = vec![
            RawTerm::new("/javascript/i", "JavaScript"),
            RawTerm::new("JavaScript", "ECMAScript"),
        ];
        let results = matcher(&records).match_text("JavaScript and javascript");
        assert_eq!(
            spans(&results),
            vec![
                (0, 10, "JavaScript", "ECMAScript"),
                (15, 25, "javascript", "JavaScript"),
            ]
        );
    }

    #[test]
    fn test_pattern_expands_captures() {
        let records = vec![RawTerm::new("/(\\d+)個/", "$1 pieces")];
        let results = matcher(&records).match_text("3個 and 12個");
        assert_eq!(
            spans(&results),
            vec![(0, 2, "3個", "3 pieces"), (7, 10, "12個", "12 pieces")]
        );
    }

    #[test]
    fn test_character_offsets_for_multibyte_text() {
        let records = vec![RawTerm::new("サーバ", "サーバー")];
        let text = "日本語のサーバです";
        let results = matcher(&records).match_text(text);
        assert_eq!(spans(&results), vec![(4, 7, "サーバ", "サーバー")]);
        let sliced: String = text.chars().skip(4).take(3).collect();
        assert_eq!(sliced, "サーバ");
    }

    #[test]
    fn test_prefix_alias_overlapping_correction() {
        // "サーバ" is a prefix of its own correction; already-correct text still matches
        // the alias, and the result is reportable because actual != expected.
        let records = vec![RawTerm::new("サーバ", "サーバー")];
        let results = matcher(&records).match_text("サーバー");
        assert_eq!(results.len(), 1);
        assert!(results[0].is_reportable());
    }

    #[test]
    fn test_metadata_copied_to_results() {
        let records = vec![
            RawTerm::new("teh", "the")
                .with_description("typo")
                .with_id("r-7"),
        ];
        let results = matcher(&records).match_text("teh");
        assert_eq!(results[0].description.as_deref(), Some("typo"));
        assert_eq!(results[0].rule.as_deref(), Some("r-7"));
    }

    #[test]
    fn test_empty_dictionary_yields_nothing() {
        let m = Matcher::default();
        assert!(m.is_empty());
        assert!(m.match_text("anything at all").is_empty());
    }

    #[test]
    fn test_results_slice_back_to_actual() {
        let records = vec![
            RawTerm::new("colour", "color"),
            RawTerm::new("/favou?rite/", "favorite"),
            RawTerm::new("Ü", "Ue"),
        ];
        let text = "Über colour, my favourite colour — Ü";
        for result in matcher(&records).match_text(text) {
            let sliced: String = text
                .chars()
                .skip(result.match_start_index)
                .take(result.match_end_index - result.match_start_index)
                .collect();
            assert_eq!(sliced, result.actual);
            assert!(result.is_reportable());
        }
    }

    #[test]
    fn test_rescanning_fixed_text_finds_nothing() {
        let records = vec![RawTerm::new("teh", "the"), RawTerm::new("recieve", "receive")];
        let m = matcher(&records);
        let mut text = "I recieve teh mail, teh end".to_string();
        let mut results = m.match_text(&text);
        results.reverse();
        for r in results {
            let start: usize = text.char_indices().nth(r.match_start_index).map(|(b, _)| b).unwrap();
            let end = start + r.actual.len();
            text.replace_range(start..end, &r.expected);
        }
        assert_eq!(text, "I receive the mail, the end");
        assert!(m.match_text(&text).is_empty());
    }
}
