//! Configuration builders for tests.
//!
//! Use [`TestConfigBuilder`] to create customised [`AppConfig`] values without
//! repeating boilerplate across crate boundaries.

use std::path::PathBuf;

use proofdict_config::{AppConfig, DictLocator, RawTerm};

/// Fluent builder for [`AppConfig`] in tests.
///
/// # Example
///
/// ```ignore
/// let config = TestConfigBuilder::new()
///     .dict_url("https://example.github.io/proof-dictionary/")
///     .whitelist(["noun"])
///     .build();
/// ```
pub struct TestConfigBuilder {
    config: AppConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    /// Remote dictionary given as a proofdict site base URL.
    pub fn dict_url(mut self, base: &str) -> Self {
        self.config.dictionary.dict_url = Some(DictLocator::Base(base.to_string()));
        self
    }

    /// Remote dictionary given as explicit JSON and rule endpoints.
    pub fn dict_endpoints(mut self, json_api: &str, rule_base: &str) -> Self {
        self.config.dictionary.dict_url = Some(DictLocator::Endpoints {
            json_api: json_api.to_string(),
            rule_base: rule_base.to_string(),
        });
        self
    }

    pub fn dict_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.dictionary.dict_path = Some(path.into());
        self
    }

    pub fn inline_terms(mut self, terms: Vec<RawTerm>) -> Self {
        self.config.dictionary.proofdict = Some(terms);
        self
    }

    pub fn auto_update_interval(mut self, ms: u64) -> Self {
        self.config.dictionary.auto_update_interval = ms;
        self
    }

    pub fn whitelist<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.tags.whitelist = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn blacklist<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.tags.blacklist = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cache.dir = dir.into();
        self
    }

    pub fn log_level(mut self, level: &str) -> Self {
        self.config.logging.level = level.to_string();
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
