use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdvisorError>;

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("Cannot average an empty reading window")]
    EmptyWindow,

    #[error("Invalid reading: {0}")]
    InvalidReading(String),

    #[error("Payload error: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Notification stream closed")]
    StreamClosed,

    #[error("Advice sink error: {0}")]
    Sink(String),
}
