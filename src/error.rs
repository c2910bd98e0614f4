//! Failure modes of a chat request.
//!
//! The view never shows these to the user; every variant collapses into the
//! same fallback bot message. They exist so the log says what actually broke.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// Connection refused, DNS failure, reset mid-body, etc.
    #[error("transport error: {0}")]
    Transport(String),

    /// The endpoint answered with a non-2xx status.
    #[error("endpoint returned status {0}")]
    Status(u16),

    /// 2xx, but the body was not a JSON object with a string `reply`.
    #[error("malformed response body: {0}")]
    Decode(String),
}

impl ChatError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }
}
