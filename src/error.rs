use crate::domain::record::Method;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PaymentError>;

/// Errors surfaced to callers of the gateway client.
///
/// Nothing in this crate retries or recovers from these; the checkout flow
/// calling us decides what to show the customer and whether to try again.
#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("No {method} transaction found for token {token}")]
    Lookup { token: String, method: Method },
    #[error("Cannot decode field {field}: {reason}")]
    Decode { field: String, reason: String },
    #[error("Storage error: {0}")]
    Storage(Box<dyn std::error::Error + Send + Sync>),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDB(#[from] rocksdb::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PaymentError {
    pub(crate) fn decode(field: &str, reason: impl Into<String>) -> Self {
        Self::Decode {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Failures talking to the remote processor.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Unable to communicate with the gateway: {0}")]
    Transport(String),
    #[error("Gateway responded with HTTP {status}")]
    Status { status: u16 },
    #[error("Malformed gateway response: {0}")]
    MalformedResponse(String),
    #[error("Error {code} - {message}")]
    Declined {
        code: String,
        message: String,
        correlation_id: Option<String>,
    },
}

impl GatewayError {
    /// Whether a caller may reasonably issue the same call again.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Transport(_) => true,
            GatewayError::Status { status } => *status >= 500,
            _ => false,
        }
    }
}
