use thiserror::Error;

/// Every failure the sealbox core can report.
///
/// Authentication failures deliberately carry no detail: a wrong password
/// and a corrupted record look identical to the caller.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid key or nonce length")]
    InvalidKeyOrNonceLength,

    #[error("authentication failed")]
    AuthenticationFailure,

    #[error("Invalid password or corrupted data")]
    WrongPasswordOrCorruptData,

    #[error("session is locked")]
    SessionLocked,

    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("record '{0}' not found")]
    RecordNotFound(String),

    #[error("OS random generator unavailable")]
    Random,

    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("background task failed: {0}")]
    Worker(String),
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Worker(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
