//! Request serialization straight onto the session.
//!
//! Requests are written piece by piece instead of being assembled in a
//! buffer first; every piece goes through [`write_all`], which keeps
//! offering the unwritten tail until the transport has taken all of it.

use core::fmt::Write as _;

use heapless::String;

use crate::network::Write;
use crate::network::error::Error;

/// The only content type the update service accepts.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Writes all of `bytes`, retrying partial writes and `WouldBlock`.
pub fn write_all<W: Write + ?Sized>(session: &mut W, bytes: &[u8]) -> Result<(), Error> {
    let mut remaining = bytes;
    while !remaining.is_empty() {
        match session.write(remaining) {
            Ok(0) => {
                error!("http: transport accepted no bytes");
                return Err(Error::WriteError);
            }
            Ok(n) => remaining = &remaining[n.min(remaining.len())..],
            Err(e) => match Into::<Error>::into(e) {
                Error::WouldBlock => continue,
                other => {
                    error!("http: write failed: {:?}", other);
                    return Err(other);
                }
            },
        }
    }
    Ok(())
}

/// Flushes the session, retrying `WouldBlock`.
pub fn flush<W: Write + ?Sized>(session: &mut W) -> Result<(), Error> {
    loop {
        match session.flush().map_err(Into::<Error>::into) {
            Err(Error::WouldBlock) => continue,
            Err(e) => {
                error!("http: flush failed: {:?}", e);
                return Err(e);
            }
            Ok(()) => return Ok(()),
        }
    }
}

/// Writes `line` followed by CR LF.
pub fn write_line<W: Write + ?Sized>(session: &mut W, line: &str) -> Result<(), Error> {
    write_all(session, line.as_bytes())?;
    write_all(session, b"\r\n")
}

/// Writes a complete `POST` request carrying a JSON body.
///
/// ```text
/// POST {path} HTTP/1.1
/// Host: {host}
/// Content-Type: application/json
/// Content-Length: {body.len()}
///
/// {body}
/// ```
pub fn write_post_json<W: Write + ?Sized>(
    session: &mut W,
    path: &str,
    host: &str,
    body: &str,
) -> Result<(), Error> {
    let mut content_length: String<20> = String::new();
    write!(content_length, "{}", body.len()).map_err(|_| Error::WriteError)?;

    write_all(session, b"POST ")?;
    write_all(session, path.as_bytes())?;
    write_all(session, b" HTTP/1.1\r\n")?;

    write_all(session, b"Host: ")?;
    write_line(session, host)?;

    write_all(session, b"Content-Type: ")?;
    write_line(session, CONTENT_TYPE_JSON)?;

    write_all(session, b"Content-Length: ")?;
    write_line(session, &content_length)?;

    write_all(session, b"\r\n")?;
    write_all(session, body.as_bytes())?;

    flush(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Accepts at most `max_chunk` bytes per call and stalls every other call.
    struct Trickle {
        written: std::vec::Vec<u8>,
        max_chunk: usize,
        calls: usize,
        fail_after: Option<usize>,
        flush_stalls: u32,
        flushes: u32,
    }

    impl Trickle {
        fn new(max_chunk: usize) -> Self {
            Self {
                written: std::vec::Vec::new(),
                max_chunk,
                calls: 0,
                fail_after: None,
                flush_stalls: 0,
                flushes: 0,
            }
        }
    }

    impl Write for Trickle {
        type Error = Error;

        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            self.calls += 1;
            if let Some(limit) = self.fail_after {
                if self.written.len() >= limit {
                    return Err(Error::WriteError);
                }
            }
            if self.calls % 2 == 0 {
                return Err(Error::WouldBlock);
            }
            let n = buf.len().min(self.max_chunk);
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            self.flushes += 1;
            if self.flush_stalls > 0 {
                self.flush_stalls -= 1;
                return Err(Error::WouldBlock);
            }
            Ok(())
        }
    }

    #[test]
    fn stalled_flush_is_retried() {
        let mut session = Trickle::new(64);
        session.flush_stalls = 3;
        write_post_json(&mut session, "/p", "h", "{}").unwrap();
        assert_eq!(session.flushes, 4);
        assert!(session.written.ends_with(b"\r\n\r\n{}"));
    }

    #[test]
    fn writes_exact_wire_format_through_partial_writes() {
        let mut session = Trickle::new(3);
        let body = r#"{"currFwUuid":"abc"}"#;
        write_post_json(&mut session, "/v1/devs/checkforupdate", "api.example.net", body).unwrap();

        let expected = "POST /v1/devs/checkforupdate HTTP/1.1\r\n\
                        Host: api.example.net\r\n\
                        Content-Type: application/json\r\n\
                        Content-Length: 20\r\n\
                        \r\n\
                        {\"currFwUuid\":\"abc\"}";
        assert_eq!(std::str::from_utf8(&session.written).unwrap(), expected);
    }

    #[test]
    fn hard_write_error_stops_the_request() {
        let mut session = Trickle::new(64);
        session.fail_after = Some(10);
        assert_eq!(
            write_post_json(&mut session, "/p", "h", "{}"),
            Err(Error::WriteError)
        );
    }

    #[test]
    fn zero_byte_write_is_an_error() {
        struct Stuck;
        impl Write for Stuck {
            type Error = Error;
            fn write(&mut self, _buf: &[u8]) -> Result<usize, Self::Error> {
                Ok(0)
            }
            fn flush(&mut self) -> Result<(), Self::Error> {
                Ok(())
            }
        }
        assert_eq!(write_all(&mut Stuck, b"x"), Err(Error::WriteError));
        assert_eq!(write_all(&mut Stuck, b""), Ok(()));
    }
}
