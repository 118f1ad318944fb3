//! Error taxonomy for the quotawatch core.
//!
//! Callers are expected to branch on these variants: `NotFound` means "run a
//! collection first", `InsufficientData` means "wait for more samples", and
//! `CorruptData` is always propagated rather than papered over with an empty
//! document, since silent replacement would hide data loss.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, QuotawatchError>;

#[derive(Debug, Error)]
pub enum QuotawatchError {
    /// No persisted document exists, or a range filter matched zero entries.
    #[error("no usage data available for profile '{0}'")]
    NotFound(String),

    /// A document exists but holds fewer points than the computation needs.
    #[error("insufficient data: need at least {needed} samples in the window, found {found}")]
    InsufficientData { needed: usize, found: usize },

    /// Unrecognized range/retention token, or a window whose elapsed time
    /// is zero or negative (duplicate or out-of-order timestamps).
    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// A persisted document failed to parse. Never downgraded to an empty
    /// document; the caller decides whether to halt or recover.
    #[error("corrupt data file {path}: {source}")]
    CorruptData {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("profile '{0}' already exists")]
    ProfileExists(String),

    #[error("unknown profile '{0}'")]
    UnknownProfile(String),

    #[error("profile name '{0}' is reserved")]
    ReservedProfile(String),

    #[error("profile '{0}' is currently active; switch to another profile before deleting it")]
    ProfileActive(String),

    #[error("invalid profile name '{0}': use letters, digits, '-' or '_'")]
    InvalidProfileName(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
