//! Common error types for storage operations

use core::fmt;

/// A common error type for storage operations.
///
/// Device drivers convert their own failures into this enum; the firmware
/// backend adds the session-level conditions on top.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// An operation was attempted on an address that is out of bounds.
    OutOfBounds,
    /// An error occurred during a write operation.
    WriteError,
    /// An error occurred during a read operation.
    ReadError,
    /// An error occurred during an erase operation.
    EraseError,
    /// An operation was attempted without an open update session.
    NotInitialized,
    /// The underlying storage is bad/unusable at a specific location
    StorageFault,
    /// The backend cannot start an update session right now.
    NotReady,
    /// The stored image failed validation.
    ValidationFailed,
    /// The partition layout or block size is unusable.
    InvalidLayout,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::OutOfBounds => f.write_str("address out of bounds"),
            Error::WriteError => f.write_str("write error"),
            Error::ReadError => f.write_str("read error"),
            Error::EraseError => f.write_str("erase error"),
            Error::NotInitialized => f.write_str("no update session"),
            Error::StorageFault => f.write_str("storage fault"),
            Error::NotReady => f.write_str("storage not ready for update"),
            Error::ValidationFailed => f.write_str("image validation failed"),
            Error::InvalidLayout => f.write_str("invalid partition layout"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::OutOfBounds => defmt::write!(f, "OutOfBounds"),
            Error::WriteError => defmt::write!(f, "WriteError"),
            Error::ReadError => defmt::write!(f, "ReadError"),
            Error::EraseError => defmt::write!(f, "EraseError"),
            Error::NotInitialized => defmt::write!(f, "NotInitialized"),
            Error::StorageFault => defmt::write!(f, "StorageFault"),
            Error::NotReady => defmt::write!(f, "NotReady"),
            Error::ValidationFailed => defmt::write!(f, "ValidationFailed"),
            Error::InvalidLayout => defmt::write!(f, "InvalidLayout"),
        }
    }
}
