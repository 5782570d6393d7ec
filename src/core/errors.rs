// src/core/errors.rs

//! Defines the primary error type for the entire application.

use std::sync::Arc;
use thiserror::Error;

/// The main error enum, representing all possible failures within the relay.
/// Using `thiserror` allows for clean error definitions and automatic `From`
/// trait implementations.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Incomplete frame in stream")]
    IncompleteFrame,

    #[error("Frame exceeds the maximum size of {0} bytes")]
    FrameTooLarge(usize),

    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Unknown event '{0}'")]
    UnknownEvent(String),

    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Not connected to the relay")]
    NotConnected,

    #[error("Gave up reconnecting after {0} attempts")]
    ReconnectExhausted(u32),

    #[error("Relay is shutting down")]
    ShuttingDown,

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

// Manual implementation of Clone because `std::io::Error` is not cloneable.
// We wrap it in an Arc to allow for cheap, shared cloning.
impl Clone for RelayError {
    fn clone(&self) -> Self {
        match self {
            RelayError::Io(e) => RelayError::Io(Arc::clone(e)),
            RelayError::IncompleteFrame => RelayError::IncompleteFrame,
            RelayError::FrameTooLarge(n) => RelayError::FrameTooLarge(*n),
            RelayError::MalformedFrame(s) => RelayError::MalformedFrame(s.clone()),
            RelayError::UnknownEvent(s) => RelayError::UnknownEvent(s.clone()),
            RelayError::Handshake(s) => RelayError::Handshake(s.clone()),
            RelayError::NotConnected => RelayError::NotConnected,
            RelayError::ReconnectExhausted(n) => RelayError::ReconnectExhausted(*n),
            RelayError::ShuttingDown => RelayError::ShuttingDown,
            RelayError::Internal(s) => RelayError::Internal(s.clone()),
        }
    }
}

impl PartialEq for RelayError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RelayError::Io(e1), RelayError::Io(e2)) => e1.to_string() == e2.to_string(),
            (RelayError::FrameTooLarge(n1), RelayError::FrameTooLarge(n2)) => n1 == n2,
            (RelayError::MalformedFrame(s1), RelayError::MalformedFrame(s2)) => s1 == s2,
            (RelayError::UnknownEvent(s1), RelayError::UnknownEvent(s2)) => s1 == s2,
            (RelayError::Handshake(s1), RelayError::Handshake(s2)) => s1 == s2,
            (RelayError::ReconnectExhausted(n1), RelayError::ReconnectExhausted(n2)) => n1 == n2,
            (RelayError::Internal(s1), RelayError::Internal(s2)) => s1 == s2,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

// --- From trait implementations for easy error conversion ---

impl From<std::io::Error> for RelayError {
    fn from(e: std::io::Error) -> Self {
        RelayError::Io(Arc::new(e))
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(e: serde_json::Error) -> Self {
        RelayError::MalformedFrame(e.to_string())
    }
}
