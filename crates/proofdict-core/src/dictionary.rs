//! Normalized proof terms and dictionary loading.
//!
//! Raw records ([`RawTerm`]) are loose: the correct form may be missing, the
//! incorrect variants may come as a single `actual` or a list of aliases, and
//! aliases may be literal strings or `/regex/flags` patterns. [`normalize`]
//! turns them into [`ProofTerm`]s, dropping whatever cannot be used without
//! failing the whole dictionary. Input order is preserved because it decides
//! which term wins when matches overlap.

use std::path::{Path, PathBuf};

use proofdict_config::record::{self, RawTerm};
use proofdict_config::{SourceMode, TagFilter};
use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

/// Errors from loading or parsing a dictionary.
#[derive(Debug, thiserror::Error)]
pub enum DictionaryError {
    #[error("failed to parse dictionary JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read dictionary '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        source: regex::Error,
    },
}

/// One incorrect variant of a term.
#[derive(Debug, Clone)]
pub enum Alias {
    /// Exact, case-sensitive substring.
    Literal(String),
    /// A `/body/flags` regular expression.
    Pattern {
        /// The alias as written in the dictionary.
        source: String,
        regex: Regex,
    },
}

impl Alias {
    /// Parse an alias. `Ok(None)` for empty aliases.
    ///
    /// An alias is a pattern when it is written `/body/flags` with a
    /// non-empty body and flags drawn from `gimsuy`; anything else is a
    /// literal.
    pub fn parse(alias: &str) -> Result<Option<Self>, DictionaryError> {
        if alias.is_empty() {
            return Ok(None);
        }
        let Some((body, flags)) = split_pattern(alias) else {
            return Ok(Some(Alias::Literal(alias.to_string())));
        };

        let regex = RegexBuilder::new(body)
            .case_insensitive(flags.contains('i'))
            .multi_line(flags.contains('m'))
            .dot_matches_new_line(flags.contains('s'))
            .build()
            .map_err(|source| DictionaryError::Pattern {
                pattern: alias.to_string(),
                source,
            })?;

        Ok(Some(Alias::Pattern {
            source: alias.to_string(),
            regex,
        }))
    }

    /// The alias as written in the dictionary.
    pub fn as_str(&self) -> &str {
        match self {
            Alias::Literal(s) => s,
            Alias::Pattern { source, .. } => source,
        }
    }
}

fn split_pattern(alias: &str) -> Option<(&str, &str)> {
    let rest = alias.strip_prefix('/')?;
    let close = rest.rfind('/')?;
    let (body, flags) = (&rest[..close], &rest[close + 1..]);
    if body.is_empty() || !flags.chars().all(|c| "gimsuy".contains(c)) {
        return None;
    }
    Some((body, flags))
}

/// One normalized dictionary entry.
#[derive(Debug, Clone)]
pub struct ProofTerm {
    /// The correct form.
    pub expected: String,
    /// Incorrect variants, in dictionary order, without duplicates.
    pub aliases: Vec<Alias>,
    pub tags: Vec<String>,
    pub description: Option<String>,
    /// Identifier used to build the reference URL.
    pub rule_id: Option<String>,
}

/// Normalize raw records into proof terms.
///
/// Records without an `expected` value are dropped; aliases that are empty,
/// duplicated, or fail to compile are skipped individually.
pub fn normalize(records: &[RawTerm]) -> Vec<ProofTerm> {
    let mut terms = Vec::with_capacity(records.len());

    for (index, raw) in records.iter().enumerate() {
        let Some(expected) = raw.expected.as_deref().filter(|e| !e.is_empty()) else {
            warn!(index, id = ?raw.id, "Dropping dictionary record without `expected`");
            continue;
        };

        let mut aliases: Vec<Alias> = Vec::new();
        for text in raw.actual.iter().chain(raw.aliases.iter()) {
            if aliases.iter().any(|a| a.as_str() == text.as_str()) {
                continue;
            }
            match Alias::parse(text) {
                Ok(Some(alias)) => aliases.push(alias),
                Ok(None) => debug!(index, "Skipping empty alias"),
                Err(e) => warn!(index, error = %e, "Skipping alias"),
            }
        }

        terms.push(ProofTerm {
            expected: expected.to_string(),
            aliases,
            tags: raw.tags.clone(),
            description: raw.description.clone().filter(|d| !d.is_empty()),
            rule_id: raw.id.clone(),
        });
    }

    terms
}

/// An ordered set of proof terms with freshness metadata.
#[derive(Debug, Clone)]
pub struct Dictionary {
    terms: Vec<ProofTerm>,
    last_updated: u64,
    mode: SourceMode,
}

impl Dictionary {
    /// Build a dictionary from raw records.
    pub fn from_records(records: &[RawTerm], mode: SourceMode, last_updated: u64) -> Self {
        Self {
            terms: normalize(records),
            last_updated,
            mode,
        }
    }

    /// Parse a JSON dictionary document.
    pub fn from_json(json: &str, mode: SourceMode, last_updated: u64) -> Result<Self, DictionaryError> {
        let records = record::parse_records(json)?;
        Ok(Self::from_records(&records, mode, last_updated))
    }

    /// All terms in dictionary order.
    pub fn terms(&self) -> &[ProofTerm] {
        &self.terms
    }

    /// Milliseconds since the Unix epoch when this dictionary was fetched (0 if unknown).
    pub fn last_updated(&self) -> u64 {
        self.last_updated
    }

    pub fn mode(&self) -> SourceMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Terms active under the given tag filter, in dictionary order.
    pub fn select_active(&self, filter: &TagFilter) -> Vec<ProofTerm> {
        select_active(&self.terms, filter)
    }
}

/// Keep the terms whose tags pass `filter`, preserving order.
pub fn select_active(terms: &[ProofTerm], filter: &TagFilter) -> Vec<ProofTerm> {
    filter
        .select(terms, |term| term.tags.iter())
        .into_iter()
        .cloned()
        .collect()
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> DictionaryError + use<> {
    let path = path.to_path_buf();
    move |source| DictionaryError::Io { path, source }
}

/// Load raw records from a local JSON file or a directory of JSON files.
///
/// Directory entries ending in `.json` are read in lexical order and
/// concatenated.
pub async fn load_local(path: &Path) -> Result<Vec<RawTerm>, DictionaryError> {
    let meta = tokio::fs::metadata(path).await.map_err(io_err(path))?;
    if !meta.is_dir() {
        let content = tokio::fs::read_to_string(path).await.map_err(io_err(path))?;
        return Ok(record::parse_records(&content)?);
    }

    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(path).await.map_err(io_err(path))?;
    while let Some(entry) = entries.next_entry().await.map_err(io_err(path))? {
        let file = entry.path();
        if file.extension().is_some_and(|ext| ext == "json") {
            files.push(file);
        }
    }
    files.sort();

    let mut records = Vec::new();
    for file in &files {
        let content = tokio::fs::read_to_string(file).await.map_err(io_err(file))?;
        records.extend(record::parse_records(&content)?);
    }
    debug!(path = %path.display(), files = files.len(), records = records.len(), "Loaded local dictionary");
    Ok(records)
}
