//! Scan orchestrator.
//!
//! A scan runs in two phases. The dictionary refresh (network mode only) runs
//! alongside [`document::collect`]; once both are done the dictionary is
//! resolved once, filtered by tags, and every text unit is matched on the
//! blocking pool against the same [`Matcher`] snapshot.
//!
//! The [`Store`] is synchronous, so cache reads and writes made during a scan
//! run on the blocking pool.
//!
//! Nothing in a scan is fatal. A missing dictionary setting becomes a single
//! document-level diagnostic, and fetch, cache, and local-file failures are
//! logged and degrade to fewer (or no) matches.

use std::sync::Arc;

use proofdict_config::{AppConfig, SourceMode};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

use crate::dictionary::{self, Dictionary};
use crate::document::{self, Document, TextUnit};
use crate::fetch::{DictionaryFetcher, FetchError};
use crate::freshness::{self, Clock, SystemClock};
use crate::matcher::Matcher;
use crate::report::{self, Diagnostic, LineIndex};
use crate::store::{CachedDictionary, DictionaryCache, Store, StoreError};

/// Errors from an explicit dictionary refresh.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to update dictionary cache: {0}")]
    Store(#[from] StoreError),

    #[error("cache task failed: {0}")]
    Task(#[from] JoinError),
}

/// What a refresh did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The cached dictionary is still within its update interval.
    Fresh,
    /// A dictionary was fetched and cached.
    Updated { terms: usize },
    /// No remote dictionary applies (local mode or an inline dictionary).
    Skipped,
}

/// Result of scanning one document.
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Diagnostics in document order.
    pub diagnostics: Vec<Diagnostic>,
    /// `None` when no dictionary source is configured.
    pub mode: Option<SourceMode>,
    /// `None` when the refresh failed or did not run.
    pub refresh: Option<RefreshOutcome>,
}

/// State of the persisted dictionary cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStatus {
    /// Fetch time in milliseconds since the Unix epoch, 0 if never fetched.
    pub last_updated: u64,
    /// Number of cached records, `None` if nothing usable is cached.
    pub records: Option<usize>,
    pub expired: bool,
}

/// Scans documents against the configured dictionary.
pub struct Scanner {
    config: AppConfig,
    store: Arc<dyn Store>,
    fetcher: Arc<dyn DictionaryFetcher>,
    clock: Arc<dyn Clock>,
}

impl Scanner {
    pub fn new(config: AppConfig, store: Arc<dyn Store>, fetcher: Arc<dyn DictionaryFetcher>) -> Self {
        Self {
            config,
            store,
            fetcher,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the wall clock, e.g. with a [`freshness::ManualClock`].
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Scan a document and report every dictionary violation in it.
    pub async fn scan(&self, document: &Document) -> ScanReport {
        let Some(mode) = self.config.source_mode() else {
            warn!("No dictionary source configured");
            return ScanReport {
                diagnostics: vec![Diagnostic::document_level(report::MISSING_DICTIONARY_MESSAGE)],
                mode: None,
                refresh: None,
            };
        };

        let (refresh, units) = tokio::join!(
            async {
                match self.refresh(false).await {
                    Ok(outcome) => Some(outcome),
                    Err(e) => {
                        warn!(error = %e, "Dictionary refresh failed, using cached dictionary");
                        None
                    }
                }
            },
            async { document::collect(document) }
        );
        debug!(%mode, units = units.len(), ?refresh, "Collected text units");

        let diagnostics = self.resolve_and_match(document, units).await;
        ScanReport {
            diagnostics,
            mode: Some(mode),
            refresh,
        }
    }

    /// Fetch the remote dictionary if it has expired, or unconditionally
    /// when `force` is set, and store it in the cache.
    pub async fn refresh(&self, force: bool) -> Result<RefreshOutcome, ScanError> {
        let settings = &self.config.dictionary;
        let Some(locator) = settings.dict_url.as_ref().filter(|_| settings.proofdict.is_none())
        else {
            return Ok(RefreshOutcome::Skipped);
        };

        let last_updated = self.with_cache(|cache| cache.last_updated()).await?;
        if !force
            && !freshness::is_expired(last_updated, settings.auto_update_interval, self.clock.now_ms())
        {
            debug!(last_updated, "Cached dictionary is fresh");
            return Ok(RefreshOutcome::Fresh);
        }

        let url = locator.json_url();
        let records = self.fetcher.fetch(&url).await?;
        let terms = records.len();
        let fetched_at = self.clock.now_ms();
        self.with_cache(move |cache| cache.write(&records, fetched_at))
            .await??;
        info!(url = %url, records = terms, "Dictionary updated");
        Ok(RefreshOutcome::Updated { terms })
    }

    /// Run `f` against the dictionary cache on the blocking pool.
    async fn with_cache<T, F>(&self, f: F) -> Result<T, JoinError>
    where
        T: Send + 'static,
        F: FnOnce(&DictionaryCache<'_>) -> T + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(&DictionaryCache::new(store.as_ref()))).await
    }

    /// The dictionary a scan would use right now.
    ///
    /// Inline records win, then the cache (network mode only), then the
    /// local `dict_path`.
    pub async fn resolve_dictionary(&self) -> Option<Dictionary> {
        let mode = self.config.source_mode()?;
        let settings = &self.config.dictionary;

        if let Some(records) = &settings.proofdict {
            debug!(records = records.len(), "Using inline dictionary");
            return Some(Dictionary::from_records(records, mode, 0));
        }

        if mode == SourceMode::Network {
            let cached = self
                .with_cache(|cache| cache.read().map(|records| (records, cache.last_updated())))
                .await;
            match cached {
                Ok(Some((records, last_updated))) => {
                    return Some(Dictionary::from_records(&records, mode, last_updated));
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Cache read task failed"),
            }
        }

        let path = settings.dict_path.as_deref()?;
        match dictionary::load_local(path).await {
            Ok(records) => Some(Dictionary::from_records(&records, SourceMode::Local, 0)),
            Err(e) => {
                warn!(error = %e, "Failed to load local dictionary");
                None
            }
        }
    }

    /// Match collected units against the resolved dictionary.
    pub async fn resolve_and_match(&self, document: &Document, units: Vec<TextUnit>) -> Vec<Diagnostic> {
        let Some(dictionary) = self.resolve_dictionary().await else {
            debug!("No dictionary available");
            return Vec::new();
        };

        let active = dictionary.select_active(&self.config.build_tag_filter());
        debug!(total = dictionary.len(), active = active.len(), "Selected active terms");
        if active.is_empty() {
            return Vec::new();
        }

        let matcher = Arc::new(Matcher::new(active));
        let mut tasks = JoinSet::new();
        for unit in units {
            let matcher = Arc::clone(&matcher);
            tasks.spawn_blocking(move || {
                let results = matcher.match_text(&unit.text);
                (unit, results)
            });
        }

        let lines = LineIndex::new(document.source());
        let locator = self.config.dictionary.dict_url.as_ref();
        let mut diagnostics = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (unit, results) = match joined {
                Ok(done) => done,
                Err(e) => {
                    warn!(error = %e, "Matching task failed");
                    continue;
                }
            };
            for result in results.iter().filter(|r| r.is_reportable()) {
                let url = locator.and_then(|l| l.rule_url(result.rule.as_deref()));
                diagnostics.push(Diagnostic::from_match(&unit, result, url.as_deref(), &lines));
            }
        }

        diagnostics.sort_by_key(|d| (d.range.start, d.range.end));
        diagnostics
    }

    /// Inspect the persisted cache without modifying it. A corrupt entry
    /// reports no records and stays in place until the next scan.
    ///
    /// Blocks on the store.
    pub fn cache_status(&self) -> CacheStatus {
        let cache = DictionaryCache::new(self.store.as_ref());
        let last_updated = cache.last_updated();
        let records = match cache.peek() {
            CachedDictionary::Valid(records) => Some(records.len()),
            CachedDictionary::Absent | CachedDictionary::Corrupt => None,
        };
        CacheStatus {
            last_updated,
            records,
            expired: freshness::is_expired(
                last_updated,
                self.config.dictionary.auto_update_interval,
                self.clock.now_ms(),
            ),
        }
    }

    /// Drop the cached dictionary and its timestamp. Blocks on the store.
    pub fn clear_cache(&self) -> Result<(), StoreError> {
        DictionaryCache::new(self.store.as_ref()).clear()
    }
}
