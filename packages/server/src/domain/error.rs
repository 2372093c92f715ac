//! Errors raised at the domain's collaborator seams.

use thiserror::Error;

/// Repository errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    Conflict(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Token verification failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing auth token")]
    MissingToken,

    #[error("token expired")]
    Expired,

    #[error("invalid token: {0}")]
    InvalidToken(String),
}

/// Session registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("connection '{0}' is already bound to an identity")]
    AlreadyBound(String),
}

/// Errors from pushing a frame to a single connection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("connection '{0}' not found")]
    ClientNotFound(String),

    #[error("outbound queue of connection '{0}' is full")]
    QueueFull(String),

    #[error("push failed: {0}")]
    PushFailed(String),
}

/// Errors from the text generation collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextGenerationError {
    #[error("provider request failed: {0}")]
    Request(String),

    #[error("provider returned an unusable response: {0}")]
    InvalidResponse(String),
}
