//! Error types for geoforge operations.

use thiserror::Error;

/// Result type alias for geoforge operations.
pub type Result<T> = std::result::Result<T, GeoforgeError>;

/// Errors that can occur while constructing or operating on geometries.
///
/// Two situations deliberately do *not* surface as errors:
/// - queries on an uninitialized wrapper answer `None`/`false`, and
/// - operations the native provider cannot perform return `Ok(None)`.
#[derive(Error, Debug)]
pub enum GeoforgeError {
    /// An operand could not be cast to a native-backed geometry, or a
    /// geometry of the wrong kind was supplied where a specific kind is
    /// required.
    #[error("cast failed: {0}")]
    Cast(String),

    /// Invalid input such as a degenerate coordinate sequence.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Malformed well-known text.
    #[error("failed to parse WKT: {0}")]
    WktParse(String),

    /// Malformed well-known binary (raw or hexadecimal form).
    #[error("failed to parse WKB: {0}")]
    WkbParse(String),

    /// Failure while generating a serialized form or snapshotting state.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A native slot was accessed after release. Indicates a handle
    /// accounting bug rather than a caller mistake.
    #[error("native handle already released")]
    HandleReleased,

    /// Catch-all for unexpected conditions.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for GeoforgeError {
    fn from(err: serde_json::Error) -> Self {
        GeoforgeError::Serialization(err.to_string())
    }
}

#[cfg(feature = "toml")]
impl From<toml::de::Error> for GeoforgeError {
    fn from(err: toml::de::Error) -> Self {
        GeoforgeError::Serialization(err.to_string())
    }
}
