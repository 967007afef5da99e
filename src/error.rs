//! Error types for RD-03D frame decoding

use thiserror::Error;

/// Result type for RD-03D decoding operations
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Errors reported by the fallible entry points of the decoder.
///
/// The streaming decode cycle never surfaces these: anomalies on the wire
/// are counted in [`SessionStats`](crate::protocol::SessionStats) instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Not enough bytes to read the requested field or frame
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Frame does not start with the `AA FF 03 00` header
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Neither trailer position carries `55 CC`
    #[error("Invalid trailer: {0}")]
    InvalidTrailer(String),

    /// Byte count does not match the frame kind
    #[error("Invalid length: {0}")]
    InvalidLength(String),

    /// Rejected decoder configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Snapshot could not be serialized
    #[cfg(feature = "serde")]
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DecodeError {
    /// Create a new InsufficientData error
    pub fn insufficient_data(msg: impl Into<String>) -> Self {
        DecodeError::InsufficientData(msg.into())
    }

    /// Create a new InvalidHeader error
    pub fn invalid_header(msg: impl Into<String>) -> Self {
        DecodeError::InvalidHeader(msg.into())
    }

    /// Create a new InvalidTrailer error
    pub fn invalid_trailer(msg: impl Into<String>) -> Self {
        DecodeError::InvalidTrailer(msg.into())
    }

    /// Create a new InvalidLength error
    pub fn invalid_length(msg: impl Into<String>) -> Self {
        DecodeError::InvalidLength(msg.into())
    }

    /// Create a new InvalidConfig error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        DecodeError::InvalidConfig(msg.into())
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::Serialization(err.to_string())
    }
}
