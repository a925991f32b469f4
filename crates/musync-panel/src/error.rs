//! Panel error types.

/// Remote panel call failed.
///
/// Every variant is transient from the agent's point of view: the cycle
/// that hit it is skipped and retried on the next tick.
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    /// Network or transport failure (connect, TLS, timeout).
    #[error("request failed: {0}")]
    Request(String),

    /// Non-success HTTP status.
    #[error("HTTP {0}")]
    Status(u16),

    /// The panel answered but refused the request.
    #[error("panel rejected request: {0}")]
    Rejected(String),

    /// Response body could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),
}

impl PanelError {
    /// Create a request error from any error type.
    #[inline]
    pub fn request<E: std::fmt::Display>(err: E) -> Self {
        Self::Request(err.to_string())
    }

    /// Create a decode error from any error type.
    #[inline]
    pub fn decode<E: std::fmt::Display>(err: E) -> Self {
        Self::Decode(err.to_string())
    }
}
