use crate::DocId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by a [`PageSource`](crate::source::PageSource).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("page not found")]
    NotFound,
    #[error("unexpected HTTP status {0}")]
    Http(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// The page was fetched but no text could be extracted from it.
    #[error("parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    #[error("document has {count} tokens, limit is {limit}")]
    TooManyTokens { count: usize, limit: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccumulateError {
    #[error("document has {0} tokens, more than a position can address")]
    PositionOverflow(usize),
    #[error("document {doc_id} updated after document {last}")]
    OutOfOrder { doc_id: DocId, last: DocId },
}

/// Everything that can go wrong with a single URL. None of these abort a build.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("tokenization failed: {0}")]
    Tokenize(#[from] TokenizeError),
    #[error("accumulation failed: {0}")]
    Accumulate(#[from] AccumulateError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Fetch,
    Parse,
    Tokenize,
    Accumulate,
}

impl DocumentError {
    pub fn kind(&self) -> FailureKind {
        match self {
            DocumentError::Fetch(FetchError::Parse(_)) => FailureKind::Parse,
            DocumentError::Fetch(_) => FailureKind::Fetch,
            DocumentError::Tokenize(_) => FailureKind::Tokenize,
            DocumentError::Accumulate(_) => FailureKind::Accumulate,
        }
    }
}

/// Output could not be written or read back. Fatal for a build.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json error on {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("bincode error on {}: {source}", path.display())]
    Bincode {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },
}

impl PersistError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            PersistError::Io { path, .. } | PersistError::Json { path, .. } | PersistError::Bincode { path, .. } => path,
        }
    }
}
