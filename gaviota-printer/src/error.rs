//! Error types for the printer library

use thiserror::Error;

/// Printer error types
///
/// Every variant except `QueueClosed` is fatal to the current job only:
/// the session cleanup path fully resets the connection state, so the
/// next queued job starts fresh.
#[derive(Debug, Error)]
pub enum PrintError {
    /// Network connection error
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for the device
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Transaction could not be opened or closed
    #[error("Transaction failed: {0}")]
    Transaction(String),

    /// Device reported a not-printable status (offline or disconnected)
    #[error("Device not printable: {0}")]
    NotPrintable(String),

    /// Sending the command buffer failed
    #[error("Send failed: {0}")]
    Send(String),

    /// Unexpected status event or unknown driver response
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Target string does not address a device this driver understands
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// IO error during printing
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Job queue is shut down; the submission was not accepted
    #[error("Print queue closed")]
    QueueClosed,
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;
