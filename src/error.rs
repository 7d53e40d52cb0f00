use crate::playground::PlaygroundError;
use std::env::VarError;
use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl<E> From<E> for Error
where
    ErrorKind: From<E>,
{
    fn from(value: E) -> Self {
        Error(Box::new(value.into()))
    }
}

#[derive(Debug, Error)]
#[allow(clippy::enum_variant_names)]
pub enum ErrorKind {
    /// Transport level failures: connection refused, timeouts, undecodable bodies.
    #[error("Error talking to the API:\n{0}")]
    HttpError(#[from] reqwest::Error),
    /// The API answered, but not with a 2xx.
    #[error("The API responded with {status}: {message}")]
    ApiError { status: u16, message: String },
    /// A 401 from the API. The stored token is already gone by the time you see this.
    #[error("Your session has expired, log in again")]
    Unauthorized,
    #[error("You are not logged in")]
    NotLoggedIn,
    #[error("{0}")]
    PlaygroundError(#[from] PlaygroundError),
    #[error("Internal error:\n{0}")]
    InternalError(#[from] InternalError),
    #[error("Could not find environment variable: \n{0}")]
    EnvVarError(#[from] VarError),
    #[error("IO error:\n{0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error:\n{0}")]
    JsonError(#[from] serde_json::Error),
    #[error("CSV error:\n{0}")]
    CsvError(#[from] csv::Error),
    #[error("Error reading data from stdin")]
    DialogueError(#[from] dialoguer::Error),
}

#[derive(Error, Debug)]
pub struct InternalError(pub String);

impl Display for InternalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    pub fn into_inner(self) -> ErrorKind {
        *self.0
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(*self.0, ErrorKind::Unauthorized)
    }
}
