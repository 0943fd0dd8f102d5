//! A network abstraction layer for embedded systems
//!
//! The update agent never talks to a socket or a TLS library directly. It
//! drives an encrypted session through the small set of traits below, which a
//! board support crate implements on top of its TCP stack and TLS engine
//! (mbedTLS, embedded-tls, rustls, ...).
//!
//! ## Session contract
//!
//! - [`Read::read`] returns `Ok(0)` once the peer has closed the session
//!   (TLS close-notify or TCP FIN). A transport error that converts into
//!   [`error::Error::WouldBlock`] means "no data yet, call again".
//! - [`Write::write`] may accept fewer bytes than offered. `WouldBlock` again
//!   means "call again"; the caller owns retrying the unwritten tail.
//! - [`Close::close`] consumes the session, so a closed session cannot be
//!   touched again.
//! - [`TlsSession::verify_result`] exposes the certificate-verification flags
//!   of the completed handshake; zero means the peer is trusted.

#![deny(unsafe_code)]

/// Common error types for network operations
pub mod error;

/// Application layer protocols driven over a [`TlsSession`].
pub mod application;

/// Re-exports of common traits
pub mod prelude {
    pub use super::{Close, Connect, Connection, Read, TlsSession, Write};
}

use error::Error;

/// Byte source side of a session.
pub trait Read {
    /// Associated error type
    type Error: core::fmt::Debug + Into<Error>;
    /// Read data from the connection. `Ok(0)` means the peer closed it.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// Byte sink side of a session.
pub trait Write {
    /// Associated error type
    type Error: core::fmt::Debug + Into<Error>;
    /// Write data to the connection, returning how many bytes were accepted.
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error>;
    /// Flush the write buffer
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Session teardown.
pub trait Close {
    /// Associated error type
    type Error: core::fmt::Debug + Into<Error>;
    /// Close the connection
    fn close(self) -> Result<(), Self::Error>;
}

/// A synchronous connection
pub trait Connection: Read + Write + Close {}

/// An encrypted connection whose handshake is driven by the caller.
pub trait TlsSession: Connection {
    /// Advance the TLS handshake.
    ///
    /// Returning an error that converts into [`Error::WouldBlock`] asks the
    /// caller to invoke `handshake` again.
    fn handshake(&mut self) -> Result<(), <Self as Read>::Error>;

    /// Certificate-verification flags of the completed handshake (0 = verified).
    fn verify_result(&self) -> u32;
}

/// Opens encrypted sessions to a remote host.
pub trait Connect {
    /// Associated connection type
    type Connection: TlsSession;
    /// Associated error type
    type Error: core::fmt::Debug + Into<Error>;

    /// One-time preparation of the TLS context (trust anchors, RNG seeding,
    /// SNI hostname). Called once before the first [`Connect::connect`].
    fn init(&mut self, _host: &str, _port: u16) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Open a connection
    fn connect(&mut self, host: &str, port: u16) -> Result<Self::Connection, Self::Error>;
}
