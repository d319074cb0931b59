#![deny(unsafe_code)]

//! Configuration loading, dictionary records, and tag filter policy for proofdict.
//!
//! Loads TOML configuration files and validates them against expected schemas.
//! Provides the [`AppConfig`] type as the central configuration structure,
//! the [`record`] module for raw dictionary records, and the [`tags`] module
//! for whitelist/blacklist term scoping.

/// Raw dictionary records and JSON dictionary parsing.
pub mod record;
/// Whitelist/blacklist tag filter.
pub mod tags;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use record::RawTerm;
pub use tags::TagFilter;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Where the dictionary for a scan comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// Local files or an inline dictionary.
    Local,
    /// A remote proofdict endpoint, cached between runs.
    Network,
}

impl std::fmt::Display for SourceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceMode::Local => write!(f, "LOCAL"),
            SourceMode::Network => write!(f, "NETWORK"),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Dictionary source settings.
    #[serde(default)]
    pub dictionary: DictionaryConfig,

    /// Tag filter settings.
    #[serde(default)]
    pub tags: TagsConfig,

    /// Persisted dictionary cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Locator of a remote proofdict dictionary.
///
/// Either a base URL of a proofdict site, from which the JSON endpoint
/// (`<base>/dictionary.json`) and rule pages (`<base>/rules/<id>`) are
/// derived, or both endpoints spelled out.
///
/// ## TOML Example
///
/// ```toml
/// [dictionary]
/// dict_url = "https://example.github.io/proof-dictionary/"
///
/// # or
/// dict_url = { json_api = "https://example.com/dict.json", rule_base = "https://example.com/rule/" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DictLocator {
    /// Base URL of a proofdict site.
    Base(String),
    /// Explicit endpoints.
    Endpoints {
        /// URL of the dictionary JSON.
        #[serde(alias = "jsonAPI")]
        json_api: String,
        /// Prefix that a rule id is appended to.
        #[serde(alias = "ruleBase")]
        rule_base: String,
    },
}

impl DictLocator {
    /// URL of the dictionary JSON document.
    pub fn json_url(&self) -> String {
        match self {
            DictLocator::Base(base) => format!("{}/dictionary.json", base.trim_end_matches('/')),
            DictLocator::Endpoints { json_api, .. } => json_api.clone(),
        }
    }

    /// Human-readable reference page for a rule, if the rule has an id.
    pub fn rule_url(&self, rule_id: Option<&str>) -> Option<String> {
        let id = rule_id.filter(|id| !id.is_empty())?;
        Some(match self {
            DictLocator::Base(base) => format!("{}/rules/{id}", base.trim_end_matches('/')),
            DictLocator::Endpoints { rule_base, .. } => format!("{rule_base}{id}"),
        })
    }

    fn urls(&self) -> Vec<&str> {
        match self {
            DictLocator::Base(base) => vec![base.as_str()],
            DictLocator::Endpoints {
                json_api,
                rule_base,
            } => vec![json_api.as_str(), rule_base.as_str()],
        }
    }
}

/// Dictionary source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictionaryConfig {
    /// Remote dictionary locator. Selects network mode when set.
    #[serde(default, alias = "dictURL", skip_serializing_if = "Option::is_none")]
    pub dict_url: Option<DictLocator>,

    /// Local dictionary: a JSON file or a directory of JSON files.
    #[serde(default, alias = "dictPath", skip_serializing_if = "Option::is_none")]
    pub dict_path: Option<PathBuf>,

    /// Milliseconds a fetched dictionary stays fresh.
    #[serde(default = "default_auto_update_interval", alias = "autoUpdateInterval")]
    pub auto_update_interval: u64,

    /// Inline dictionary. Bypasses fetching and the cache entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proofdict: Option<Vec<RawTerm>>,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            dict_url: None,
            dict_path: None,
            auto_update_interval: default_auto_update_interval(),
            proofdict: None,
        }
    }
}

fn default_auto_update_interval() -> u64 {
    60 * 1000
}

/// Tag filter configuration.
///
/// When both lists are set the whitelist takes precedence.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TagsConfig {
    /// Only terms carrying one of these tags are active.
    #[serde(default, alias = "whitelistTags", alias = "whitelist_tags")]
    pub whitelist: Vec<String>,

    /// Terms carrying one of these tags are inactive.
    #[serde(default, alias = "blacklistTags", alias = "blacklist_tags")]
    pub blacklist: Vec<String>,
}

/// Persisted dictionary cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory holding the cached dictionary and its timestamp.
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
        }
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".proofdict-cache")
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file at the given path using async I/O.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(locator) = &self.dictionary.dict_url {
            for url in locator.urls() {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(ConfigError::Validation(format!(
                        "dictionary.dict_url must be an http(s) URL, got {url:?}"
                    )));
                }
            }
        }
        if let Some(path) = &self.dictionary.dict_path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Validation(
                    "dictionary.dict_path must not be empty".to_string(),
                ));
            }
        }

        for (list, tags) in [
            ("whitelist", &self.tags.whitelist),
            ("blacklist", &self.tags.blacklist),
        ] {
            if let Some(i) = tags.iter().position(|t| t.trim().is_empty()) {
                return Err(ConfigError::Validation(format!(
                    "tags.{list}[{i}] must not be empty"
                )));
            }
        }

        if self.cache.dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "cache.dir must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Source mode implied by the dictionary settings.
    ///
    /// `None` means no dictionary source is configured at all.
    pub fn source_mode(&self) -> Option<SourceMode> {
        let dict = &self.dictionary;
        if dict.dict_url.is_some() {
            Some(SourceMode::Network)
        } else if dict.dict_path.is_some() || dict.proofdict.is_some() {
            Some(SourceMode::Local)
        } else {
            None
        }
    }

    /// Build a [`TagFilter`] from the loaded tag config.
    pub fn build_tag_filter(&self) -> TagFilter {
        TagFilter::new(self.tags.whitelist.clone(), self.tags.blacklist.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.dictionary.auto_update_interval, 60_000);
        assert!(config.dictionary.dict_url.is_none());
        assert!(config.tags.whitelist.is_empty());
        assert!(config.tags.blacklist.is_empty());
        assert_eq!(config.cache.dir, PathBuf::from(".proofdict-cache"));
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config.dictionary.auto_update_interval, 60_000);
        assert_eq!(config.source_mode(), None);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
            [dictionary]
            dict_url = "https://example.github.io/proof-dictionary/"
            auto_update_interval = 1000

            [tags]
            whitelist = ["noun"]
            blacklist = ["slang"]

            [cache]
            dir = "/tmp/proofdict"

            [logging]
            level = "debug"
        "#;
        let config = AppConfig::parse(toml).unwrap();
        assert_eq!(
            config.dictionary.dict_url,
            Some(DictLocator::Base(
                "https://example.github.io/proof-dictionary/".to_string()
            ))
        );
        assert_eq!(config.dictionary.auto_update_interval, 1000);
        assert_eq!(config.tags.whitelist, vec!["noun"]);
        assert_eq!(config.tags.blacklist, vec!["slang"]);
        assert_eq!(config.cache.dir, PathBuf::from("/tmp/proofdict"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.source_mode(), Some(SourceMode::Network));
    }

    #[test]
    fn test_parse_camel_case_options() {
        let toml = r#"
            [dictionary]
            dictURL = { jsonAPI = "https://example.com/dict.json", ruleBase = "https://example.com/rule/" }
            autoUpdateInterval = 5

            [tags]
            whitelistTags = ["a"]
        "#;
        let config = AppConfig::parse(toml).unwrap();
        assert_eq!(
            config.dictionary.dict_url,
            Some(DictLocator::Endpoints {
                json_api: "https://example.com/dict.json".to_string(),
                rule_base: "https://example.com/rule/".to_string(),
            })
        );
        assert_eq!(config.dictionary.auto_update_interval, 5);
        assert_eq!(config.tags.whitelist, vec!["a"]);
    }

    #[test]
    fn test_inline_dictionary_from_toml() {
        let toml = r#"
            [[dictionary.proofdict]]
            actual = "teh"
            expected = "the"
            tags = ["typo"]

            [[dictionary.proofdict]]
            patterns = ["Javascript"]
            expected = "JavaScript"
            id = "js"
        "#;
        let config = AppConfig::parse(toml).unwrap();
        let inline = config.dictionary.proofdict.as_ref().unwrap();
        assert_eq!(inline.len(), 2);
        assert_eq!(inline[0], RawTerm::new("teh", "the").with_tags(["typo"]));
        assert_eq!(inline[1].aliases, vec!["Javascript"]);
        assert_eq!(config.source_mode(), Some(SourceMode::Local));
    }

    #[test]
    fn test_dict_path_selects_local_mode() {
        let toml = r#"
            [dictionary]
            dict_path = "dict/"
        "#;
        let config = AppConfig::parse(toml).unwrap();
        assert_eq!(config.source_mode(), Some(SourceMode::Local));
    }

    #[test]
    fn test_dict_url_wins_over_dict_path() {
        let toml = r#"
            [dictionary]
            dict_url = "https://example.com/"
            dict_path = "dict.json"
        "#;
        let config = AppConfig::parse(toml).unwrap();
        assert_eq!(config.source_mode(), Some(SourceMode::Network));
    }

    #[test]
    fn test_validation_rejects_non_http_url() {
        let toml = r#"
            [dictionary]
            dict_url = "ftp://example.com/"
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_validation_rejects_bad_endpoint() {
        let toml = r#"
            [dictionary]
            dict_url = { json_api = "https://example.com/d.json", rule_base = "rules/" }
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_validation_rejects_empty_tag() {
        let toml = r#"
            [tags]
            blacklist = ["ok", " "]
        "#;
        let err = AppConfig::parse(toml).unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation error: tags.blacklist[1] must not be empty"
        );
    }

    #[test]
    fn test_validation_rejects_empty_cache_dir() {
        let toml = r#"
            [cache]
            dir = ""
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    // ── Locator derivation ────────────────────────────────────────────

    #[test]
    fn test_base_locator_urls() {
        let locator = DictLocator::Base("https://example.github.io/proof-dictionary/".to_string());
        assert_eq!(
            locator.json_url(),
            "https://example.github.io/proof-dictionary/dictionary.json"
        );
        assert_eq!(
            locator.rule_url(Some("01BQ")).as_deref(),
            Some("https://example.github.io/proof-dictionary/rules/01BQ")
        );
    }

    #[test]
    fn test_base_locator_without_trailing_slash() {
        let locator = DictLocator::Base("https://example.com/dict".to_string());
        assert_eq!(locator.json_url(), "https://example.com/dict/dictionary.json");
    }

    #[test]
    fn test_endpoint_locator_urls() {
        let locator = DictLocator::Endpoints {
            json_api: "https://example.com/api.json".to_string(),
            rule_base: "https://example.com/rule/".to_string(),
        };
        assert_eq!(locator.json_url(), "https://example.com/api.json");
        assert_eq!(
            locator.rule_url(Some("r1")).as_deref(),
            Some("https://example.com/rule/r1")
        );
    }

    #[test]
    fn test_rule_url_requires_id() {
        let locator = DictLocator::Base("https://example.com/".to_string());
        assert_eq!(locator.rule_url(None), None);
        assert_eq!(locator.rule_url(Some("")), None);
    }

    #[test]
    fn test_build_tag_filter() {
        let toml = r#"
            [tags]
            whitelist = ["a"]
            blacklist = ["a"]
        "#;
        let config = AppConfig::parse(toml).unwrap();
        let filter = config.build_tag_filter();
        assert!(filter.is_active(["a"]));
        assert!(!filter.is_active(["b"]));
    }

    // ── Async file-based loading ──────────────────────────────────────

    #[tokio::test]
    async fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("proofdict.toml");
        tokio::fs::write(
            &path,
            b"[dictionary]\nauto_update_interval = 4242\ndict_path = \"terms.json\"\n",
        )
        .await
        .unwrap();

        let config = AppConfig::load(&path).await.unwrap();
        assert_eq!(config.dictionary.auto_update_interval, 4242);
        assert_eq!(
            config.dictionary.dict_path,
            Some(PathBuf::from("terms.json"))
        );
    }

    #[tokio::test]
    async fn test_load_nonexistent_file() {
        let result = AppConfig::load(Path::new("/nonexistent/proofdict.toml")).await;
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[tokio::test]
    async fn test_load_invalid_toml_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        tokio::fs::write(&path, b"not valid toml [[[").await.unwrap();

        let result = AppConfig::load(&path).await;
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let mut config = AppConfig::default();
        config.dictionary.dict_url = Some(DictLocator::Base("https://example.com/".to_string()));
        config.tags.whitelist = vec!["noun".to_string()];
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = AppConfig::parse(&text).unwrap();
        assert_eq!(parsed.dictionary.dict_url, config.dictionary.dict_url);
        assert_eq!(parsed.tags.whitelist, config.tags.whitelist);
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Validation("bad value".to_string());
        assert_eq!(err.to_string(), "validation error: bad value");
    }
}
