//! Proxy control error types.

/// Local proxy control failed.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// Live counters could not be read.
    #[error("stats: {0}")]
    Stats(String),

    /// Restart command failed to run or exited non-zero.
    #[error("restart: {0}")]
    Restart(String),

    /// Generic controller failure (used by test doubles and wrappers).
    #[error("controller: {0}")]
    Controller(String),
}

impl ProxyError {
    /// Create a stats error from any error type.
    #[inline]
    pub fn stats<E: std::fmt::Display>(err: E) -> Self {
        Self::Stats(err.to_string())
    }
}
