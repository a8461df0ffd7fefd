use thiserror::Error;

use crate::reason::Reason;

/// Result type alias for redirect engine operations
pub type Result<T, E = RedirectError> = std::result::Result<T, E>;

/// Rejected input field, surfaced before any decision logic runs.
///
/// A validation failure is a request-construction bug in the caller, never a
/// routing decision.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("request host must not be empty")]
    EmptyHost,

    #[error("unsupported request scheme: {0}")]
    UnsupportedScheme(String),

    #[error("request fullpath must be absolute, got {0:?}")]
    FullpathNotAbsolute(String),

    #[error("request port string must start with ':', got {0:?}")]
    MalformedPortString(String),

    #[error("community ident must not be empty")]
    EmptyIdent,

    #[error("app domain must not be empty")]
    EmptyAppDomain,

    #[error("route name must not be empty")]
    EmptyRouteName,
}

/// Errors that can occur while deciding or building a redirect
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RedirectError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// A community-scoped reason reached the target builder without a
    /// community record. The selector only yields these reasons for present
    /// communities, so hitting this is a programming error.
    #[error("reason {reason:?} requires a community record")]
    MissingCommunity { reason: Reason },

    /// A domain-scoped reason reached the target builder for a community
    /// without a custom domain. Same programmer-error class as above.
    #[error("reason {reason:?} requires a custom domain on the community")]
    MissingDomain { reason: Reason },
}
