//! Error types for hubkit.

use chrono::{DateTime, Utc};

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during GitHub API operations.
///
/// Every resource operation maps a failed status code onto exactly one of
/// these variants, so callers can match on the failure kind. Use
/// [`Error::category`] to group them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A resource call was made before `start()`.
    #[error("the client is not started - call `start()` first")]
    NotStarted,

    /// `start()` was called on a client that is already running.
    #[error("the client is already started")]
    AlreadyStarted,

    /// The transport session was closed or its owning client dropped.
    #[error("the client session is closed")]
    SessionClosed,

    /// The operation needs credentials and none were configured.
    #[error("this action requires authentication - provide a username and token")]
    NoAuthProvided,

    /// The configured credentials were rejected.
    #[error("the token provided is invalid")]
    InvalidToken,

    /// Only one half of a username/token pair was provided.
    #[error("invalid authentication combination: {0}")]
    InvalidAuthCombination(String),

    /// User not found.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// Repository not found, private, or no access.
    #[error("repository is either private or does not exist: {0}")]
    RepositoryNotFound(String),

    /// Issue not found.
    #[error("issue not found: {repo}#{number}")]
    IssueNotFound { repo: String, number: u64 },

    /// Organization not found.
    #[error("organization not found: {0}")]
    OrganizationNotFound(String),

    /// Gist not found.
    #[error("gist not found: {0}")]
    GistNotFound(String),

    /// Repository creation collided with an existing repository.
    #[error("repository already exists: {0}")]
    RepositoryAlreadyExists(String),

    /// File already exists and can only be edited.
    #[error("file already exists: {0}")]
    FileAlreadyExists(String),

    /// The credentials lack permission for the action.
    #[error("you do not have permissions to perform this action")]
    MissingPermissions,

    /// The rate limit is exhausted.
    #[error("{}", ratelimited_message(.reset_at))]
    Ratelimited { reset_at: Option<DateTime<Utc>> },

    /// A batch of requests would exceed the remaining quota.
    #[error(
        "performing this action will exceed the ratelimit, aborting: {remaining} remaining calls, {required} calls to make"
    )]
    WillExceedRatelimit { required: u32, remaining: u32 },

    /// The `Link` header could not be parsed.
    #[error("malformed Link header: {0}")]
    MalformedLinkHeader(String),

    /// A header name or value could not be used.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// Configuration could not be parsed.
    #[error("config error: {0}")]
    Config(String),

    /// Network error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("failed to parse GitHub response: {0}")]
    Parse(#[from] serde_json::Error),

    /// IO error (e.g., reading a gist file or config).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse grouping of [`Error`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Client used out of order.
    Lifecycle,
    /// Missing or rejected credentials.
    Auth,
    /// The requested resource does not exist.
    NotFound,
    /// The resource to create already exists.
    Conflict,
    /// Insufficient permissions.
    Permission,
    /// Rate limit exhausted or about to be.
    Quota,
    /// The response could not be understood.
    Response,
    /// Transport, IO or configuration failure.
    Transport,
}

impl Error {
    /// The category this error belongs to.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::NotStarted | Self::AlreadyStarted | Self::SessionClosed => {
                ErrorCategory::Lifecycle
            }
            Self::NoAuthProvided | Self::InvalidToken | Self::InvalidAuthCombination(_) => {
                ErrorCategory::Auth
            }
            Self::UserNotFound(_)
            | Self::RepositoryNotFound(_)
            | Self::IssueNotFound { .. }
            | Self::OrganizationNotFound(_)
            | Self::GistNotFound(_) => ErrorCategory::NotFound,
            Self::RepositoryAlreadyExists(_) | Self::FileAlreadyExists(_) => {
                ErrorCategory::Conflict
            }
            Self::MissingPermissions => ErrorCategory::Permission,
            Self::Ratelimited { .. } | Self::WillExceedRatelimit { .. } => ErrorCategory::Quota,
            Self::MalformedLinkHeader(_) | Self::Parse(_) => ErrorCategory::Response,
            Self::InvalidHeader(_) | Self::Config(_) | Self::Network(_) | Self::Io(_) => {
                ErrorCategory::Transport
            }
        }
    }

    /// Whether this is one of the resource-not-found errors.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.category(), ErrorCategory::NotFound)
    }
}

fn ratelimited_message(reset_at: &Option<DateTime<Utc>>) -> String {
    reset_at.map_or_else(
        || "we're being ratelimited - authentication raises the ratelimit".to_string(),
        |at| {
            format!(
                "we're being ratelimited, wait until {} - authentication raises the ratelimit",
                at.format("%H:%M:%S %A, %d %b")
            )
        },
    )
}
