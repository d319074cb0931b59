#![deny(unsafe_code)]

//! proofdict core: dictionary model, term matcher, and scan orchestrator.
//!
//! A scan takes a [`Document`], collects the prose in it, and reports every
//! occurrence of a known-incorrect term together with its correction. The
//! dictionary comes from an inline list, a local file, or a remote proofdict
//! endpoint cached between runs.

use std::future::Future;
use std::pin::Pin;

/// A type-erased, `Send`-safe, boxed future, the return type for async trait
/// methods that require dynamic dispatch (`dyn Trait`).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Compile-time build metadata (version, git hash, profile).
pub mod build_info;
/// Proof terms, alias patterns, and dictionary loading.
pub mod dictionary;
/// Documents and the text units collected from them.
pub mod document;
/// Remote dictionary retrieval.
pub mod fetch;
/// Dictionary expiry and clocks.
pub mod freshness;
/// Alias matching with overlap resolution.
pub mod matcher;
/// Diagnostics, messages, and fix application.
pub mod report;
/// Scan orchestration.
pub mod scan;
/// Persisted dictionary cache.
pub mod store;

pub use dictionary::{Dictionary, ProofTerm};
pub use document::{Document, DocumentKind, TextUnit};
pub use fetch::{DictionaryFetcher, HttpFetcher};
pub use matcher::{MatchResult, Matcher};
pub use report::{Diagnostic, FixOutcome, apply_fixes};
pub use scan::{RefreshOutcome, ScanReport, Scanner};
pub use store::{FileStore, MemoryStore, Store};
