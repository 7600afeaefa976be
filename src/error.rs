use std::path::PathBuf;

use thiserror::Error;

use crate::php::ParseError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by the translation store, registry and remote translator.
///
/// Nothing in this crate recovers locally: every failure is returned to the
/// caller (CLI or host tooling) which decides how to report it.
#[derive(Debug, Error)]
pub enum Error {
    /// A locale directory, language file or persisted file does not exist
    #[error("{what} not found: {}", .path.display())]
    NotFound { what: &'static str, path: PathBuf },

    #[error("I/O failure on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    /// A locale or file name would resolve outside the locale root
    #[error("refusing to use {}: {reason}", .path.display())]
    UnsafePath { path: PathBuf, reason: &'static str },

    #[error("failed to send request to translation API: {0}")]
    Http(#[from] reqwest::Error),

    #[error("translation API error ({status}): {body}")]
    Remote {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("translation API response contained no translations")]
    EmptyResponse,

    #[error("invalid translation credentials in {}: {reason}", .path.display())]
    Credentials { path: PathBuf, reason: String },

    #[error(
        "no remote translator configured \
         (set GOOGLE_TRANSLATE_PROJECT_ID and GOOGLE_TRANSLATE_CREDENTIALS)"
    )]
    TranslatorNotConfigured,
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn not_found(what: &'static str, path: impl Into<PathBuf>) -> Self {
        Self::NotFound {
            what,
            path: path.into(),
        }
    }

    /// True for the `NotFound` family, including I/O failures caused by a missing path
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
