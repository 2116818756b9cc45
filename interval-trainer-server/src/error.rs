use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid bind address {addr}: {reason}")]
    InvalidAddress { addr: String, reason: String },

    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}
