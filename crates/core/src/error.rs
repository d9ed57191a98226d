use thiserror::Error;

use crate::types::MediaKind;

/// Failure reported by the remote watch-activity service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(String),

    #[error("remote returned {status}: {message}")]
    Http { status: u16, message: String },

    #[error("unauthorized")]
    Unauthorized,

    #[error("not found: {kind} {id}")]
    NotFound { kind: MediaKind, id: u64 },
}

impl GatewayError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Http { .. } => "http",
            Self::Unauthorized => "unauthorized",
            Self::NotFound { .. } => "not_found",
        }
    }
}

/// Unified error type for the reconciliation and aggregation use cases.
///
/// Cache operations never fail; only calls that reach the gateway (or decode
/// its payloads) produce one of these.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl SyncError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Gateway(e) => e.code(),
            Self::InvalidPayload(_) => "invalid_payload",
        }
    }

    /// Whether retrying the same call later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Gateway(GatewayError::Network(_))
                | Self::Gateway(GatewayError::Http { status: 500..=599, .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
