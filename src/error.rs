// SPDX-License-Identifier: GPL-3.0-only
use thiserror::Error;

/// Classification of every failure the data layer can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    CancelledContext,
    StoreFailure,
    UpstreamFailure,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("item does not exist")]
    NotFound,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("cancelled context")]
    CancelledContext,

    #[error("{message}: {source}")]
    Store {
        message: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("{message}: {source}")]
    Upstream {
        message: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("upstream responded with {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    /// An inner error annotated with what the caller was doing.
    #[error("{message}: {source}")]
    Context {
        message: String,
        #[source]
        source: Box<Error>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Kind of the innermost error; context layers are transparent.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound => ErrorKind::NotFound,
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::CancelledContext => ErrorKind::CancelledContext,
            Error::Store { .. } => ErrorKind::StoreFailure,
            Error::Upstream { .. } | Error::UpstreamStatus { .. } => ErrorKind::UpstreamFailure,
            Error::Context { source, .. } => source.kind(),
        }
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
    }

    pub fn context(self, message: impl Into<String>) -> Self {
        Error::Context {
            message: message.into(),
            source: Box::new(self),
        }
    }

    /// Adapter for `map_err` on driver results.
    pub fn store(message: impl Into<String>) -> impl FnOnce(sqlx::Error) -> Error {
        let message = message.into();
        move |source| Error::Store { message, source }
    }

    pub fn upstream(message: impl Into<String>) -> impl FnOnce(reqwest::Error) -> Error {
        let message = message.into();
        move |source| Error::Upstream { message, source }
    }
}
