//! Quotawatch Library
//!
//! A local usage/quota tracker. A collector process periodically hands the
//! library a normalized usage snapshot from a remote metering API; the
//! library persists a bounded, append-only raw history per profile, compacts
//! aged entries into hourly summaries for long retention windows, and serves
//! derived views (rates, quota-exhaustion predictions, peak-usage insights,
//! stitched raw+summary history) to presentation adapters such as the CLI, a
//! local REST API, or a browser dashboard.
//!
//! ## Architecture Overview
//!
//! The library is organized around several key modules:
//!
//! - [`models`] - Core data structures for snapshots, summaries, documents
//!   and derived statistics
//! - [`storage`] - Atomic per-profile JSON document persistence
//! - [`store`] - The append-only, size-bounded raw snapshot log
//! - [`summarizer`] - Hourly compaction and long-term retention
//! - [`query`] - Range-filtered composite views and rate/prediction math
//! - [`profiles`] - Named account namespaces with a single active profile
//! - [`range`] - Range and retention token parsing
//! - [`config`] - Configuration management with environment variable support
//! - [`logging`] - Structured logging with JSON and pretty-print formats
//! - [`display`] - Terminal and JSON output formatting for the CLI
//!
//! ## Concurrency Contract
//!
//! The store assumes a single collector process. Document writes are atomic
//! (temp file + rename), so concurrent readers never observe a torn
//! document, but two concurrent writers race read-modify-write with
//! last-writer-wins semantics. Not safe for concurrent collectors.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use quotawatch::config::Config;
//! use quotawatch::query::{HistoryFormat, QueryEngine};
//! use quotawatch::range::RangeToken;
//! use quotawatch::storage::DocumentStore;
//!
//! # fn example() -> quotawatch::error::Result<()> {
//! let config = Config::default();
//! let docs = DocumentStore::new(&config.storage.data_dir);
//! let engine = QueryEngine::new(docs);
//!
//! let view = engine.history("default", RangeToken::D7, HistoryFormat::Raw)?;
//! # let _ = view;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod models;
pub mod profiles;
pub mod query;
pub mod range;
pub mod storage;
pub mod store;
pub mod summarizer;
pub mod timeutil;

pub use error::{QuotawatchError, Result};
pub use models::*;
pub use profiles::ProfileRegistry;
pub use query::QueryEngine;
pub use range::{RangeToken, RetentionPeriod};
pub use storage::DocumentStore;
pub use store::SnapshotStore;
pub use summarizer::Summarizer;
