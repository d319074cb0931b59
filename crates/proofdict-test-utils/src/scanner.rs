//! Scanner test fixture.
//!
//! [`TestScanner`] wires a [`Scanner`] to a file-backed cache inside an owned
//! temp directory and a [`ManualClock`], so cache and freshness behavior can
//! be driven from a test.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use proofdict_config::AppConfig;
use proofdict_core::fetch::DictionaryFetcher;
use proofdict_core::freshness::ManualClock;
use proofdict_core::{FileStore, Scanner};
use tempfile::TempDir;

/// Milliseconds since the epoch that fixture clocks start at.
pub const FIXTURE_NOW: u64 = 1_700_000_000_000;

/// A test-scoped scanner with an owned temp directory.
///
/// The temp directory (config file and cache) is deleted when this value is
/// dropped, even on panic.
pub struct TestScanner {
    pub scanner: Scanner,
    pub store: Arc<FileStore>,
    pub clock: Arc<ManualClock>,
    pub config_path: PathBuf,
    temp_dir: TempDir,
}

impl TestScanner {
    /// Build a scanner from `config`; its cache dir is redirected into the
    /// temp directory.
    pub fn new(config: AppConfig, fetcher: Arc<dyn DictionaryFetcher>) -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        Self::in_dir(temp_dir, config, fetcher)
    }

    fn in_dir(temp_dir: TempDir, mut config: AppConfig, fetcher: Arc<dyn DictionaryFetcher>) -> Self {
        config.cache.dir = temp_dir.path().join("cache");
        let config_path = temp_dir.path().join("proofdict.toml");
        let store = Arc::new(FileStore::new(config.cache.dir.clone()));
        let clock = Arc::new(ManualClock::new(FIXTURE_NOW));
        let scanner = Scanner::new(config, store.clone(), fetcher).with_clock(clock.clone());

        Self {
            scanner,
            store,
            clock,
            config_path,
            temp_dir,
        }
    }

    /// Write `toml_content` to a temp config file, load it the way the CLI
    /// does, and build a scanner from it.
    pub async fn with_toml(toml_content: &str, fetcher: Arc<dyn DictionaryFetcher>) -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("proofdict.toml");
        tokio::fs::write(&config_path, toml_content)
            .await
            .expect("failed to write test config");
        let config = AppConfig::load(&config_path)
            .await
            .expect("failed to parse test config");

        Self::in_dir(temp_dir, config, fetcher)
    }

    /// The temp directory, for placing dictionary files next to the config.
    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a file under the temp directory and return its path.
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent dir");
        }
        std::fs::write(&path, content).expect("failed to write test file");
        path
    }
}
