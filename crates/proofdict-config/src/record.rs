//! Raw dictionary records as they appear on the wire.
//!
//! A proofdict dictionary is JSON: either a bare array of records or an
//! object wrapping them under `"rules"`. Records are deliberately loose here;
//! normalization into match rules happens in `proofdict-core`.
//!
//! ```json
//! [
//!   {
//!     "id": "01BQ92YZK5M4Q2BQ0R7TD3QKB1",
//!     "expected": "JavaScript",
//!     "patterns": ["Javascript", "/java script/i"],
//!     "tags": ["noun"],
//!     "description": "Use the official product name."
//!   }
//! ]
//! ```

use serde::{Deserialize, Serialize};

/// One raw dictionary record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTerm {
    /// Rule identifier used to build the reference URL.
    #[serde(default, alias = "rule", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// The correct form. Records without it are dropped during normalization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,

    /// A single incorrect variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,

    /// Several incorrect variants.
    #[serde(default, alias = "patterns", skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RawTerm {
    /// Shorthand for a single `actual → expected` record.
    pub fn new(actual: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            actual: Some(actual.into()),
            expected: Some(expected.into()),
            ..Self::default()
        }
    }

    /// Attach tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach a rule identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add an extra incorrect variant.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }
}

/// The two accepted top-level dictionary shapes.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawDictionary {
    List(Vec<RawTerm>),
    Wrapped { rules: Vec<RawTerm> },
}

/// Parse a JSON dictionary document into its records.
pub fn parse_records(json: &str) -> Result<Vec<RawTerm>, serde_json::Error> {
    let dict: RawDictionary = serde_json::from_str(json)?;
    Ok(match dict {
        RawDictionary::List(rules) | RawDictionary::Wrapped { rules } => rules,
    })
}

/// Serialize records in the bare-array form used by the cache.
pub fn to_json(records: &[RawTerm]) -> Result<String, serde_json::Error> {
    serde_json::to_string(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_bare_array() {
        let json = r#"[{"actual": "teh", "expected": "the"}]"#;
        let records = parse_records(json).unwrap();
        assert_eq!(records, vec![RawTerm::new("teh", "the")]);
    }

    #[test]
    fn test_parse_wrapped_rules() {
        let json = r#"{"rules": [{"actual": "teh", "expected": "the", "tags": ["typo"]}]}"#;
        let records = parse_records(json).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tags, vec!["typo".to_string()]);
    }

    #[test]
    fn test_patterns_and_rule_aliases() {
        let json = r#"[{
            "rule": "r-1",
            "expected": "JavaScript",
            "patterns": ["Javascript", "javascript"],
            "specs": [{"from": "javascript", "to": "JavaScript"}]
        }]"#;
        let records = parse_records(json).unwrap();
        assert_eq!(records[0].id.as_deref(), Some("r-1"));
        assert_eq!(records[0].aliases, vec!["Javascript", "javascript"]);
    }

    #[test]
    fn test_missing_expected_still_parses() {
        let records = parse_records(r#"[{"actual": "x"}]"#).unwrap();
        assert_eq!(records[0].expected, None);
    }

    #[test]
    fn test_rejects_non_dictionary_json() {
        assert!(parse_records("42").is_err());
        assert!(parse_records("{not json").is_err());
    }

    #[test]
    fn test_to_json_skips_empty_fields() {
        let json = to_json(&[RawTerm::new("teh", "the")]).unwrap();
        assert_eq!(json, r#"[{"expected":"the","actual":"teh"}]"#);
    }
}
