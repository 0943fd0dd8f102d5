//! Common error types for network operations

use core::fmt;

/// A common error type for network operations.
///
/// Transport implementations report their failures through their own error
/// types; those must convert into this enum so the HTTP layer can tell a
/// retryable condition ([`Error::WouldBlock`]) from a hard failure.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// The operation could not complete now and should be retried.
    WouldBlock,
    /// An error occurred during a write operation.
    WriteError,
    /// An error occurred during a read operation.
    ReadError,
    /// A connection attempt was refused.
    ConnectionRefused,
    /// A transport deadline expired; the request fails without a retry.
    Timeout,
    /// The peer closed the connection.
    ConnectionClosed,
    /// An invalid address was provided.
    InvalidAddress,
    /// The TLS handshake failed.
    HandshakeFailed,
    /// The peer certificate did not verify; carries the verification flags.
    PeerVerificationFailed(u32),
    /// A protocol-specific error occurred.
    ProtocolError,
    /// A response line did not fit the line buffer.
    LineTooLong,
    /// A response body did not fit the caller's buffer.
    BufferTooSmall,
    /// The client was used before it was initialized.
    NotInitialized,
}

impl Error {
    /// Returns true for conditions that only mean "try the same call again".
    pub fn is_would_block(&self) -> bool {
        matches!(self, Error::WouldBlock)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::WouldBlock => f.write_str("operation would block"),
            Error::WriteError => f.write_str("write error"),
            Error::ReadError => f.write_str("read error"),
            Error::ConnectionRefused => f.write_str("connection refused"),
            Error::Timeout => f.write_str("timeout"),
            Error::ConnectionClosed => f.write_str("connection closed by peer"),
            Error::InvalidAddress => f.write_str("invalid address"),
            Error::HandshakeFailed => f.write_str("TLS handshake failed"),
            Error::PeerVerificationFailed(flags) => {
                write!(f, "peer verification failed (flags 0x{:x})", flags)
            }
            Error::ProtocolError => f.write_str("protocol error"),
            Error::LineTooLong => f.write_str("response line too long"),
            Error::BufferTooSmall => f.write_str("response body exceeds buffer"),
            Error::NotInitialized => f.write_str("client not initialized"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::WouldBlock => defmt::write!(f, "WouldBlock"),
            Error::WriteError => defmt::write!(f, "WriteError"),
            Error::ReadError => defmt::write!(f, "ReadError"),
            Error::ConnectionRefused => defmt::write!(f, "ConnectionRefused"),
            Error::Timeout => defmt::write!(f, "Timeout"),
            Error::ConnectionClosed => defmt::write!(f, "ConnectionClosed"),
            Error::InvalidAddress => defmt::write!(f, "InvalidAddress"),
            Error::HandshakeFailed => defmt::write!(f, "HandshakeFailed"),
            Error::PeerVerificationFailed(flags) => {
                defmt::write!(f, "PeerVerificationFailed({=u32:#x})", flags)
            }
            Error::ProtocolError => defmt::write!(f, "ProtocolError"),
            Error::LineTooLong => defmt::write!(f, "LineTooLong"),
            Error::BufferTooSmall => defmt::write!(f, "BufferTooSmall"),
            Error::NotInitialized => defmt::write!(f, "NotInitialized"),
        }
    }
}
