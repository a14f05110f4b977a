mod from;

use std::fmt::Display;

use thiserror::Error;

use crate::job::{Context, MediaId};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("no item found for key `{0}`")]
    ItemNotFound(String),

    #[error("no restore queue found")]
    QueueNotFound,

    #[error("a restore is already being processed")]
    AlreadyRunning,

    #[error("no images to restore in {0}")]
    NothingToRestore(Context),

    #[error("context `{0}` is invalid")]
    InvalidContext(String),

    #[error("{0} is not available")]
    ContextUnavailable(Context),

    #[error("job is missing an id or a context")]
    InvalidJob,

    #[error("queue is inconsistent: {processed} processed + {remaining} remaining != {total}")]
    InvalidQueue {
        total: u64,
        processed: u64,
        remaining: u64,
    },

    #[error("could not restore {context} item {id}: {message}")]
    Restore {
        id: MediaId,
        context: Context,
        message: String,
    },

    #[error("storage URL `{0}` is invalid")]
    InvalidStorageUrl(String),

    #[error("environment variable `{0}` is not set")]
    MissingEnvVar(String),

    #[error("{0}")]
    Cli(String),

    #[error(transparent)]
    Other(AnyError),
}

#[derive(Error, Debug)]
pub struct AnyError(anyhow::Error);

impl Display for AnyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq for AnyError {
    fn eq(&self, _other: &Self) -> bool {
        false
    }
}

impl Error {
    pub fn other<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Other(AnyError(error.into()))
    }

    pub fn restore<S: ToString>(id: MediaId, context: Context, message: S) -> Self {
        Error::Restore {
            id,
            context,
            message: message.to_string(),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(error: anyhow::Error) -> Self {
        Error::Other(AnyError(error))
    }
}
