use std::env::VarError;

use humantime::DurationError;
use tokio::{sync::AcquireError, task::JoinError};

use super::Error;

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::other(error)
    }
}

impl From<VarError> for Error {
    fn from(error: VarError) -> Self {
        Error::other(error)
    }
}

impl From<bincode::Error> for Error {
    fn from(error: bincode::Error) -> Self {
        Error::other(error)
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::other(error)
    }
}

impl From<JoinError> for Error {
    fn from(error: JoinError) -> Self {
        Error::other(error)
    }
}

impl From<AcquireError> for Error {
    fn from(error: AcquireError) -> Self {
        Error::other(error)
    }
}

impl From<DurationError> for Error {
    fn from(error: DurationError) -> Self {
        Error::other(error)
    }
}
