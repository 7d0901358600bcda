use std::path::PathBuf;

use crate::Hash;

/// error type for grit operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("repository not found at {0}")]
    NoRepo(PathBuf),

    #[error("repository already exists at {0}")]
    RepoExists(PathBuf),

    #[error("ref not found: {0}")]
    RefNotFound(String),

    #[error("invalid ref name: {0}")]
    InvalidRef(String),

    #[error("object not found: {0}")]
    ObjectNotFound(Hash),

    #[error("corrupt object: {0}")]
    CorruptObject(String),

    #[error("invalid object kind: {0}")]
    InvalidObjectKind(String),

    #[error("invalid hash hex: {0}")]
    InvalidHashHex(String),

    #[error("invalid identity (expected \"Name <email>\"): {0}")]
    InvalidIdentity(String),

    #[error("invalid tree entry name: {0}")]
    InvalidEntryName(String),

    #[error("duplicate tree entry name: {0}")]
    DuplicateEntryName(String),

    #[error("corrupt packfile: {0}")]
    CorruptPack(String),

    #[error("packfile checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: Hash, actual: Hash },

    #[error("unknown delta base: {0}")]
    UnknownBase(Hash),

    #[error("corrupt delta: {0}")]
    CorruptDelta(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// helper to wrap io errors with path context
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.into(),
            source,
        })
    }
}
