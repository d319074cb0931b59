//! Documents and the text units collected from them.
//!
//! [`collect`] is the first half of a scan: it walks a document and returns
//! every run of prose that should be checked, skipping text nested inside
//! block quotes, links, images, emphasis, and code. Each [`TextUnit`] keeps
//! its byte offset in the document so diagnostics and fixes can be mapped
//! back to the source.

use std::ops::Range;
use std::path::Path;

use pulldown_cmark::{Event, Options, Parser, Tag};

/// How a document's source is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Markdown,
    /// Paragraphs separated by blank lines.
    PlainText,
}

impl DocumentKind {
    /// Guess the kind from a file extension; anything unknown is Markdown.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("txt" | "text") => DocumentKind::PlainText,
            _ => DocumentKind::Markdown,
        }
    }
}

/// A document to scan.
#[derive(Debug, Clone)]
pub struct Document {
    source: String,
    kind: DocumentKind,
}

impl Document {
    pub fn new(source: impl Into<String>, kind: DocumentKind) -> Self {
        Self {
            source: source.into(),
            kind,
        }
    }

    pub fn markdown(source: impl Into<String>) -> Self {
        Self::new(source, DocumentKind::Markdown)
    }

    pub fn plain_text(source: impl Into<String>) -> Self {
        Self::new(source, DocumentKind::PlainText)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }
}

/// A contiguous run of prose taken verbatim from the document source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextUnit {
    /// Byte offset of the unit in the document source.
    pub offset: usize,
    pub text: String,
}

impl TextUnit {
    /// Byte range of the unit in the document source.
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.text.len()
    }
}

/// Collect the text units of `document` that are eligible for matching.
pub fn collect(document: &Document) -> Vec<TextUnit> {
    let ranges = match document.kind {
        DocumentKind::Markdown => markdown_ranges(&document.source),
        DocumentKind::PlainText => paragraph_ranges(&document.source),
    };
    ranges
        .into_iter()
        .map(|range| TextUnit {
            offset: range.start,
            text: document.source[range].to_string(),
        })
        .collect()
}

/// Structural contexts whose text is never checked.
fn is_excluded(tag: &Tag<'_>) -> bool {
    matches!(
        tag,
        Tag::BlockQuote(_)
            | Tag::Link { .. }
            | Tag::Image { .. }
            | Tag::Emphasis
            | Tag::CodeBlock(_)
            | Tag::MetadataBlock(_)
    )
}

fn markdown_ranges(source: &str) -> Vec<Range<usize>> {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_TASKLISTS;

    let mut ranges = Vec::new();
    let mut current: Option<Range<usize>> = None;
    // One entry per open tag: whether it excludes its contents.
    let mut open: Vec<bool> = Vec::new();
    let mut excluded_depth = 0usize;

    for (event, range) in Parser::new_ext(source, options).into_offset_iter() {
        match event {
            Event::Start(tag) => {
                flush(&mut current, &mut ranges);
                let excluded = is_excluded(&tag);
                excluded_depth += usize::from(excluded);
                open.push(excluded);
            }
            Event::End(_) => {
                flush(&mut current, &mut ranges);
                if open.pop() == Some(true) {
                    excluded_depth -= 1;
                }
            }
            Event::Text(_) if excluded_depth == 0 => extend(&mut current, &mut ranges, range),
            Event::SoftBreak if excluded_depth == 0 => {
                if let Some(cur) = current.as_mut().filter(|cur| cur.end == range.start) {
                    cur.end = range.end;
                }
            }
            _ => flush(&mut current, &mut ranges),
        }
    }
    flush(&mut current, &mut ranges);

    ranges
        .into_iter()
        .filter_map(|r| trim_trailing_newlines(source, r))
        .collect()
}

fn extend(current: &mut Option<Range<usize>>, ranges: &mut Vec<Range<usize>>, range: Range<usize>) {
    match current {
        Some(cur) if cur.end == range.start => cur.end = range.end,
        _ => {
            flush(current, ranges);
            *current = Some(range);
        }
    }
}

fn flush(current: &mut Option<Range<usize>>, ranges: &mut Vec<Range<usize>>) {
    if let Some(range) = current.take() {
        if !range.is_empty() {
            ranges.push(range);
        }
    }
}

fn trim_trailing_newlines(source: &str, range: Range<usize>) -> Option<Range<usize>> {
    let text = &source[range.clone()];
    let trimmed = text.trim_end_matches(['\n', '\r']);
    (!trimmed.is_empty()).then(|| range.start..range.start + trimmed.len())
}

fn paragraph_ranges(source: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut current: Option<Range<usize>> = None;
    let mut offset = 0;

    for line in source.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        if line.trim().is_empty() {
            flush(&mut current, &mut ranges);
            continue;
        }
        match current.as_mut() {
            Some(cur) => cur.end = offset,
            None => current = Some(start..offset),
        }
    }
    flush(&mut current, &mut ranges);

    ranges
        .into_iter()
        .filter_map(|r| trim_trailing_newlines(source, r))
        .collect()
}
