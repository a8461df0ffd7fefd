use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T, E = GatewayError> = std::result::Result<T, E>;

/// Errors that can occur during gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] crate::config::ValidationError),

    #[error("failed to read request body: {0}")]
    RequestBodyError(String),

    #[error("failed to read response body: {0}")]
    ResponseBodyError(String),

    #[error("upstream request failed for {0}: {1}")]
    UpstreamRequestFailed(String, String),

    #[error("upstream timeout for {0}")]
    UpstreamTimeout(String),

    #[error("redirect engine error: {0}")]
    Engine(#[from] redirector::RedirectError),

    #[error("internal error: {0}")]
    InternalError(String),
}
