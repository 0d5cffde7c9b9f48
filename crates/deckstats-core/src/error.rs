//! Error type shared by every deckstats-core component.

use std::fmt;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DeckError>;

/// Everything that can go wrong between a sensor reading and a device write.
#[derive(Debug)]
pub enum DeckError {
    /// A caller-supplied argument is out of range (zero capacity, zero bucket width, ...).
    InvalidArgument(String),
    /// A key index at or beyond the device's key count.
    InvalidKey { key: u8, key_count: u8 },
    /// Raw pixel data whose length does not match the icon dimensions.
    InvalidGrid { expected: usize, actual: usize },
    /// The display transport reported a failure.
    Transport(String),
    /// The transport accepted fewer bytes than the packet length.
    ShortWrite { expected: usize, written: usize },
    /// The dashboard configuration failed validation.
    Config(String),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for DeckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::InvalidKey { key, key_count } => {
                write!(f, "key index {key} out of range (device has {key_count} keys)")
            }
            Self::InvalidGrid { expected, actual } => {
                write!(f, "pixel grid has {actual} bytes, expected {expected}")
            }
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::ShortWrite { expected, written } => {
                write!(f, "short write: {written} of {expected} bytes accepted")
            }
            Self::Config(msg) => write!(f, "invalid configuration: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Json(e) => write!(f, "failed to parse configuration JSON: {e}"),
        }
    }
}

impl std::error::Error for DeckError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DeckError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for DeckError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
