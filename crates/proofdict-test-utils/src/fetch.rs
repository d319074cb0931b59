//! Canned dictionary fetchers.
//!
//! Both fetchers count their calls and remember the URLs they were asked
//! for, so tests can assert that a scan did or did not go to the network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use proofdict_config::RawTerm;
use proofdict_core::BoxFuture;
use proofdict_core::fetch::{DictionaryFetcher, FetchError};

#[derive(Debug, Default)]
struct CallLog {
    calls: AtomicUsize,
    urls: Mutex<Vec<String>>,
}

impl CallLog {
    fn record(&self, url: &str) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut urls) = self.urls.lock() {
            urls.push(url.to_string());
        }
    }

    fn urls(&self) -> Vec<String> {
        self.urls.lock().map(|u| u.clone()).unwrap_or_default()
    }
}

/// Serves the same records for every URL.
#[derive(Debug)]
pub struct StaticFetcher {
    records: Vec<RawTerm>,
    log: CallLog,
}

impl StaticFetcher {
    pub fn new(records: Vec<RawTerm>) -> Arc<Self> {
        Arc::new(Self {
            records,
            log: CallLog::default(),
        })
    }

    /// A fetcher serving an empty dictionary.
    pub fn empty() -> Arc<Self> {
        Self::new(Vec::new())
    }

    pub fn calls(&self) -> usize {
        self.log.calls.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.log.urls()
    }
}

impl DictionaryFetcher for StaticFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<RawTerm>, FetchError>> {
        Box::pin(async move {
            self.log.record(url);
            Ok(self.records.clone())
        })
    }
}

/// Fails every request with an HTTP status error.
#[derive(Debug)]
pub struct FailingFetcher {
    status: u16,
    log: CallLog,
}

impl FailingFetcher {
    pub fn new(status: u16) -> Arc<Self> {
        Arc::new(Self {
            status,
            log: CallLog::default(),
        })
    }

    pub fn calls(&self) -> usize {
        self.log.calls.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.log.urls()
    }
}

impl DictionaryFetcher for FailingFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<RawTerm>, FetchError>> {
        Box::pin(async move {
            self.log.record(url);
            Err(FetchError::Status {
                url: url.to_string(),
                status: self.status,
            })
        })
    }
}
