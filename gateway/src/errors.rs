use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Caller input rejected before any backend was contacted.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// A backend answered with a decodable `{error, status_code}` body.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("{service} returned unexpected status {status}")]
    UnexpectedStatus { service: &'static str, status: u16 },

    #[error("{service} unreachable: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed response from {service}: {source}")]
    Decode {
        service: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl Error {
    /// Short label used for logs and the error counter.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::NotFound(_) => "not_found",
            Error::Api { .. } => "structured",
            Error::UnexpectedStatus { .. } => "unexpected_status",
            Error::Transport { source, .. } if source.is_timeout() => "timeout",
            Error::Transport { .. } => "transport",
            Error::Decode { .. } => "decode",
            Error::Database(_) | Error::Migration(_) => "database",
            Error::Config(_) => "config",
            Error::Metrics(_) => "metrics",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
