//! Core error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("bad pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}

/// Store resolution failure: no roster entry matched, or the substring
/// fallback found more than one candidate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("store not found for '{raw}' (normalized '{normalized}', {} candidate(s))", .candidates.len())]
pub struct StoreNotFound {
    pub raw: String,
    pub normalized: String,
    pub candidates: Vec<String>,
}
