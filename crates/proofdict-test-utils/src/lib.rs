#![deny(unsafe_code)]

//! Shared test utilities for the proofdict workspace.
//!
//! Provides config builders, canned dictionary fetchers, a temp-dir backed
//! scanner fixture, and tracing helpers so that individual crate tests stay
//! concise and consistent.
//!
//! Add this crate as a `[dev-dependency]` in any workspace member:
//!
//! ```toml
//! [dev-dependencies]
//! proofdict-test-utils = { workspace = true }
//! ```

pub mod config;
pub mod fetch;
pub mod scanner;
pub mod tracing_setup;
