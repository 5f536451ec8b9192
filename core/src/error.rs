use crate::DocId;
use std::path::PathBuf;

/// Errors produced while ingesting documents, building the index or querying it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A document provider could not supply a usable document.
    #[error("invalid document {origin}: {reason}")]
    InvalidDocument { origin: String, reason: String },

    #[error("cannot build an index over an empty corpus\nSuggestion: add at least one document before calling build()")]
    EmptyCorpus,

    #[error("index has not been built yet\nSuggestion: call build() before issuing queries")]
    NotBuilt,

    #[error("unknown document id {0}")]
    UnknownDocument(DocId),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn invalid_document(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidDocument { origin: origin.into(), reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
