//! Diagnostics and fixes.
//!
//! A [`Diagnostic`] is what a scan reports: a message anchored in the
//! document and, for dictionary matches, a [`Fix`] replacing the matched text
//! with the correction. [`apply_fixes`] writes the fixes back into the source.

use std::ops::Range;

use serde::Serialize;

use crate::document::TextUnit;
use crate::matcher::MatchResult;

/// Message reported when no dictionary source is configured.
pub const MISSING_DICTIONARY_MESSAGE: &str =
    "Not found dictionary setting.\nPlease set dict_url or dict_path in the configuration.";

/// A replacement of a byte range of the document source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fix {
    pub range: Range<usize>,
    pub replacement: String,
}

/// One reported problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub message: String,
    /// Byte range in the document source.
    pub range: Range<usize>,
    /// 1-based line of `range.start`.
    pub line: usize,
    /// 1-based column of `range.start`, in characters.
    pub column: usize,
    pub fix: Option<Fix>,
    /// Rule identifier of the dictionary term, if any.
    pub rule: Option<String>,
}

impl Diagnostic {
    /// A diagnostic about the document as a whole.
    pub fn document_level(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            range: 0..0,
            line: 1,
            column: 1,
            fix: None,
            rule: None,
        }
    }

    /// Build the diagnostic for a match found in `unit`.
    ///
    /// `rule_url` is the reference page of the matched term, when one can be
    /// derived from the dictionary locator.
    pub fn from_match(
        unit: &TextUnit,
        result: &MatchResult,
        rule_url: Option<&str>,
        lines: &LineIndex,
    ) -> Self {
        let start = unit.offset + byte_offset(&unit.text, result.match_start_index);
        let end = unit.offset + byte_offset(&unit.text, result.match_end_index);
        let (line, column) = lines.position(start);
        Self {
            message: format_message(result, rule_url),
            range: start..end,
            line,
            column,
            fix: Some(Fix {
                range: start..end,
                replacement: result.expected.clone(),
            }),
            rule: result.rule.clone(),
        }
    }
}

/// `"<actual> => <expected>"`, then the description and reference URL on
/// their own lines when present.
pub fn format_message(result: &MatchResult, rule_url: Option<&str>) -> String {
    let mut message = format!("{} => {}", result.actual, result.expected);
    if let Some(description) = &result.description {
        message.push('\n');
        message.push_str(description);
    }
    if let Some(url) = rule_url {
        message.push_str("\nSee ");
        message.push_str(url);
    }
    message
}

/// Byte offset of the `chars`-th character of `text` (or its length).
fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(b, _)| b)
        .unwrap_or(text.len())
}

/// Maps byte offsets to 1-based line/column positions.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(source: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source,
            line_starts,
        }
    }

    /// Line and character column of byte `offset`.
    pub fn position(&self, offset: usize) -> (usize, usize) {
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let line_start = self.line_starts[line - 1];
        let column = self.source[line_start..offset].chars().count() + 1;
        (line, column)
    }
}

/// Result of [`apply_fixes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixOutcome {
    pub output: String,
    pub applied: usize,
    /// Fixes dropped because they overlapped one already applied.
    pub skipped: usize,
}

/// Apply every fix in `diagnostics` to `source`.
///
/// Fixes are applied in document order; a fix overlapping an earlier one
/// is skipped.
pub fn apply_fixes(source: &str, diagnostics: &[Diagnostic]) -> FixOutcome {
    let mut fixes: Vec<&Fix> = diagnostics.iter().filter_map(|d| d.fix.as_ref()).collect();
    fixes.sort_by_key(|fix| (fix.range.start, fix.range.end));

    let mut output = String::with_capacity(source.len());
    let mut cursor = 0;
    let mut applied = 0;
    let mut skipped = 0;
    for fix in fixes {
        if fix.range.start < cursor || fix.range.end > source.len() {
            skipped += 1;
            continue;
        }
        output.push_str(&source[cursor..fix.range.start]);
        output.push_str(&fix.replacement);
        cursor = fix.range.end;
        applied += 1;
    }
    output.push_str(&source[cursor..]);

    FixOutcome {
        output,
        applied,
        skipped,
    }
}
