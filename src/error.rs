/// Error type returned by this crate.
///
/// Only [`FeatureBaseError::Config`] ever escapes the public API directly;
/// every other variant is folded into a failed [`crate::QueryResult`].
#[derive(Debug, thiserror::Error)]
pub enum FeatureBaseError {
    /// Invalid client configuration detected at construction.
    #[error("config error: {0}")]
    Config(String),
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// Non-success HTTP status code with raw response body.
    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },
    /// SQL error reported by the FeatureBase service.
    #[error("query error: {0}")]
    Query(String),
    /// Response decoding or envelope-shape validation error.
    #[error("decode error: {0}")]
    Decode(String),
    /// A concurrent batch task did not run to completion.
    #[error("task error: {0}")]
    Task(String),
}

impl FeatureBaseError {
    /// Classifies the error for [`crate::QueryResult::failure`].
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Config(_) => FailureKind::Config,
            Self::Transport(err) if err.is_timeout() => FailureKind::Timeout,
            Self::Transport(_) => FailureKind::Transport,
            Self::Http { .. } => FailureKind::Http,
            Self::Query(_) => FailureKind::Query,
            Self::Decode(_) => FailureKind::Decode,
            Self::Task(_) => FailureKind::Task,
        }
    }
}

/// Category of a failed statement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Config,
    /// Connection refused, DNS failure or other request-level error.
    Transport,
    /// The request exceeded the configured timeout.
    Timeout,
    Http,
    /// The service rejected the SQL statement.
    Query,
    Decode,
    Task,
}
