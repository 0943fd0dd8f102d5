//! CRLF line reader over a session.
//!
//! Response heads are consumed one byte at a time so that nothing past the
//! end of the header block is ever pulled out of the session: the body must
//! still be sitting in the transport when the parser reaches it. Bytes are
//! consumed irreversibly, there is no pushback.

use core::fmt;

use crate::network::Read;
use crate::network::error::Error;

/// Why a line could not be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineError {
    /// The buffer filled up before a CR LF pair was seen.
    Truncated,
    /// The peer closed the session mid-line.
    PeerClosed,
    /// The transport reported a hard error.
    Transport(Error),
}

impl From<LineError> for Error {
    fn from(err: LineError) -> Self {
        match err {
            LineError::Truncated => Error::LineTooLong,
            LineError::PeerClosed => Error::ConnectionClosed,
            LineError::Transport(e) => e,
        }
    }
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineError::Truncated => f.write_str("line exceeds buffer"),
            LineError::PeerClosed => f.write_str("peer closed mid-line"),
            LineError::Transport(e) => write!(f, "transport error: {}", e),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LineError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            LineError::Truncated => defmt::write!(f, "Truncated"),
            LineError::PeerClosed => defmt::write!(f, "PeerClosed"),
            LineError::Transport(e) => defmt::write!(f, "Transport({})", e),
        }
    }
}

/// Pulls a single byte out of the session, spinning on `WouldBlock`.
pub(crate) fn read_byte<R: Read + ?Sized>(session: &mut R) -> Result<u8, LineError> {
    let mut byte = [0u8; 1];
    loop {
        match session.read(&mut byte) {
            Ok(0) => return Err(LineError::PeerClosed),
            Ok(_) => return Ok(byte[0]),
            Err(e) => match Into::<Error>::into(e) {
                Error::WouldBlock => continue,
                Error::ConnectionClosed => return Err(LineError::PeerClosed),
                other => return Err(LineError::Transport(other)),
            },
        }
    }
}

/// A line buffer whose capacity `N` (terminator included) is fixed at
/// compile time.
///
/// A line of up to `N - 2` bytes followed by CR LF fits. On success the CR
/// LF pair is replaced by NUL bytes, so the line is always NUL-terminated
/// inside the buffer.
#[derive(Debug, Clone)]
pub struct LineBuffer<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> LineBuffer<N> {
    /// Creates an empty line buffer.
    pub const fn new() -> Self {
        const { assert!(N >= 2, "a line buffer must hold at least CR LF") };
        Self { buf: [0; N], len: 0 }
    }

    /// Reads the next CR LF terminated line from `session`.
    ///
    /// Fails with [`LineError::Truncated`] if `N` bytes arrive without a
    /// terminator; the partial line is discarded rather than returned.
    pub fn read_from<R: Read + ?Sized>(&mut self, session: &mut R) -> Result<&[u8], LineError> {
        self.buf.fill(0);
        self.len = 0;

        let mut filled = 0;
        while filled < N {
            self.buf[filled] = read_byte(session)?;
            filled += 1;

            if filled >= 2 && self.buf[filled - 2] == b'\r' && self.buf[filled - 1] == b'\n' {
                self.buf[filled - 2] = 0;
                self.buf[filled - 1] = 0;
                self.len = filled - 2;
                return Ok(&self.buf[..self.len]);
            }
        }

        Err(LineError::Truncated)
    }

    /// The last line read, without terminator.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Length of the last line read.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for the empty line separating headers from body.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<const N: usize> Default for LineBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
