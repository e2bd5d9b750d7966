use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenchError {
    /// Image bytes that cannot be fingerprinted (empty or malformed).
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Rejected credentials. Fatal for the whole batch.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Rate limiting, timeouts and other failures worth retrying.
    #[error("Transient error: {0}")]
    Transient(String),

    /// Any other failure reported by the generation API.
    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl BenchError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, BenchError::Auth(_))
    }

    /// Errors the batch loop absorbs into its attempt budget.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BenchError::Transient(_) | BenchError::Generation(_) | BenchError::InvalidImage(_)
        )
    }
}

impl From<zip::result::ZipError> for BenchError {
    fn from(err: zip::result::ZipError) -> Self {
        BenchError::Archive(err.to_string())
    }
}

impl From<std::io::Error> for BenchError {
    fn from(err: std::io::Error) -> Self {
        BenchError::Archive(err.to_string())
    }
}

impl From<serde_json::Error> for BenchError {
    fn from(err: serde_json::Error) -> Self {
        BenchError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;
