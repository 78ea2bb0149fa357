use thiserror::Error;

/// Errors raised by the durable key-value store behind the persistence bridge.
///
/// These never escape `Canvas::commit` or startup loading; they are logged and dropped there.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to serialize store: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Failed to access store: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("Storage write rejected: {0}")]
    WriteRejected(String),

    #[error("Stored payload is not a snapshot: {0}")]
    InvalidPayload(String),
}

/// Errors from placing an image on the system clipboard.
#[derive(Debug, Error)]
pub enum ClipboardError {
    /// The host has no clipboard API, or denied access to it.
    #[error("Clipboard unavailable: {0}")]
    ClipboardUnavailable(String),

    #[error("Clipboard write failed: {0}")]
    WriteFailed(String),

    /// The worker performing the write went away before reporting back.
    #[error("Clipboard write was abandoned")]
    Abandoned,
}

/// Errors from loading the configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Crate-level error for the operations a host can invoke on a canvas.
#[derive(Debug, Error)]
pub enum SketchError {
    #[error("Failed to encode surface: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Failed to decode snapshot: {0}")]
    Decode(String),

    #[error(transparent)]
    Clipboard(#[from] ClipboardError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("Failed to deliver export: {0}")]
    Export(#[from] std::io::Error),
}

/// Result type for canvas operations
pub type SketchResult<T> = Result<T, SketchError>;

/// Result type for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;
