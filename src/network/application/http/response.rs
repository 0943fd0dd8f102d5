//! Streaming HTTP/1.1 response parser.
//!
//! The parser walks the response head line by line and then copies exactly
//! `Content-Length` body bytes straight from the session into a caller
//! buffer. The whole response is never held in memory at once.

use super::line::{LineBuffer, LineError};
use crate::network::Read;
use crate::network::error::Error;

/// Capacity of the line buffer used for the status line and headers.
pub const RESPONSE_LINE_LEN: usize = 92;

const HTTP_PREFIX: &[u8] = b"HTTP";
const CONTENT_LENGTH_PREFIX: &[u8] = b"Content-Length:";

/// Space-separated, non-empty tokens of a line.
fn tokens(line: &[u8]) -> impl Iterator<Item = &[u8]> {
    line.split(|&b| b == b' ').filter(|t| !t.is_empty())
}

/// Parses a whole token as a base-10 integer, rejecting trailing garbage.
fn parse_decimal<T: core::str::FromStr>(token: &[u8]) -> Result<T, Error> {
    core::str::from_utf8(token)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .ok_or(Error::ProtocolError)
}

/// Extracts the status code from a status line such as `HTTP/1.1 200 OK`.
pub fn parse_status_code(line: &[u8]) -> Result<u16, Error> {
    let mut parts = tokens(line);
    let version = parts.next().ok_or(Error::ProtocolError)?;
    if !version.starts_with(HTTP_PREFIX) {
        return Err(Error::ProtocolError);
    }
    let code = parts.next().ok_or(Error::ProtocolError)?;
    parse_decimal(code)
}

/// Extracts the value of a `Content-Length: N` header line.
pub fn parse_content_length_value(line: &[u8]) -> Result<usize, Error> {
    if !line.starts_with(CONTENT_LENGTH_PREFIX) {
        return Err(Error::ProtocolError);
    }
    let mut parts = tokens(line);
    parts.next();
    let value = parts.next().ok_or(Error::ProtocolError)?;
    parse_decimal(value)
}

/// Reads a response head and body from a session, in wire order.
///
/// The caller must invoke [`parse_status_line`](Self::parse_status_line),
/// [`parse_content_length`](Self::parse_content_length),
/// [`skip_to_body`](Self::skip_to_body) and [`read_body`](Self::read_body)
/// in that order; each consumes its part of the stream.
#[derive(Debug)]
pub struct ResponseParser<'s, R: Read + ?Sized> {
    session: &'s mut R,
    line: LineBuffer<RESPONSE_LINE_LEN>,
}

impl<'s, R: Read + ?Sized> ResponseParser<'s, R> {
    /// Wraps an open session positioned at the start of a response.
    pub fn new(session: &'s mut R) -> Self {
        Self {
            session,
            line: LineBuffer::new(),
        }
    }

    fn next_line(&mut self) -> Result<&[u8], Error> {
        self.line.read_from(self.session).map_err(|e| {
            if e == LineError::Truncated {
                warn!("http: response line exceeds {} bytes", RESPONSE_LINE_LEN);
            }
            Error::from(e)
        })
    }

    /// Reads the status line and returns the status code.
    pub fn parse_status_line(&mut self) -> Result<u16, Error> {
        let line = self.next_line()?;
        parse_status_code(line)
    }

    /// Reads header lines until `Content-Length:` is found.
    ///
    /// Reaching the end of the header block first is a protocol error; a
    /// response without `Content-Length` cannot be framed by this client.
    pub fn parse_content_length(&mut self) -> Result<usize, Error> {
        loop {
            let line = self.next_line()?;
            if line.is_empty() {
                warn!("http: no Content-Length before end of headers");
                return Err(Error::ProtocolError);
            }
            if line.starts_with(CONTENT_LENGTH_PREFIX) {
                return parse_content_length_value(line);
            }
        }
    }

    /// Discards the remaining header lines up to and including the blank
    /// separator line.
    pub fn skip_to_body(&mut self) -> Result<(), Error> {
        loop {
            if self.next_line()?.is_empty() {
                return Ok(());
            }
        }
    }

    /// Copies exactly `content_length` body bytes into `body` and writes a
    /// NUL at `body[content_length]`.
    ///
    /// `body` must hold at least `content_length + 1` bytes. After a failure
    /// the contents of `body` are unspecified.
    pub fn read_body(&mut self, content_length: usize, body: &mut [u8]) -> Result<usize, Error> {
        let needed = content_length.checked_add(1).ok_or(Error::BufferTooSmall)?;
        if needed > body.len() {
            return Err(Error::BufferTooSmall);
        }

        body[..needed].fill(0);
        let mut received = 0;
        while received < content_length {
            match self.session.read(&mut body[received..content_length]) {
                Ok(0) => {
                    debug!("http: peer closed after {} of {} body bytes", received, content_length);
                    return Err(Error::ConnectionClosed);
                }
                Ok(n) => received += n.min(content_length - received),
                Err(e) => match Into::<Error>::into(e) {
                    Error::WouldBlock => continue,
                    other => {
                        error!("http: body read failed: {:?}", other);
                        return Err(other);
                    }
                },
            }
        }
        body[content_length] = 0;

        Ok(content_length)
    }

    /// Gives the session back once the response has been consumed.
    pub fn into_inner(self) -> &'s mut R {
        self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Wire {
        data: std::vec::Vec<u8>,
        pos: usize,
        chunk: usize,
    }

    impl Wire {
        fn new(data: &[u8], chunk: usize) -> Self {
            Self { data: data.to_vec(), pos: 0, chunk }
        }
    }

    impl Read for Wire {
        type Error = Error;

        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            let n = buf.len().min(self.chunk).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn status_code_parsing() {
        assert_eq!(parse_status_code(b"HTTP/1.1 200 OK"), Ok(200));
        assert_eq!(parse_status_code(b"HTTP/1.0 404 Not Found"), Ok(404));
        assert_eq!(parse_status_code(b"HTTP/1.1  503"), Ok(503));
        assert_eq!(parse_status_code(b"HTTPS 200"), Ok(200));
        assert_eq!(parse_status_code(b"FTP/1.1 200 OK"), Err(Error::ProtocolError));
        assert_eq!(parse_status_code(b"HTTP/1.1 2x0 OK"), Err(Error::ProtocolError));
        assert_eq!(parse_status_code(b"HTTP/1.1 200OK"), Err(Error::ProtocolError));
        assert_eq!(parse_status_code(b"HTTP/1.1"), Err(Error::ProtocolError));
        assert_eq!(parse_status_code(b""), Err(Error::ProtocolError));
    }

    #[test]
    fn content_length_value_parsing() {
        assert_eq!(parse_content_length_value(b"Content-Length: 512"), Ok(512));
        assert_eq!(parse_content_length_value(b"Content-Length:   0"), Ok(0));
        assert_eq!(parse_content_length_value(b"Content-Length:512"), Err(Error::ProtocolError));
        assert_eq!(parse_content_length_value(b"Content-Length: 5a"), Err(Error::ProtocolError));
        assert_eq!(parse_content_length_value(b"content-length: 5"), Err(Error::ProtocolError));
    }

    #[test]
    fn parses_full_response_in_order() {
        let mut wire = Wire::new(
            b"HTTP/1.1 200 OK\r\nServer: x\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhelloEXTRA",
            3,
        );
        let mut parser = ResponseParser::new(&mut wire);
        assert_eq!(parser.parse_status_line(), Ok(200));
        assert_eq!(parser.parse_content_length(), Ok(5));
        parser.skip_to_body().unwrap();

        let mut body = [0xAAu8; 8];
        assert_eq!(parser.read_body(5, &mut body), Ok(5));
        assert_eq!(&body[..6], b"hello\0");
        // nothing beyond Content-Length was consumed
        assert_eq!(wire.pos, wire.data.len() - 5);
    }

    #[test]
    fn content_length_as_last_header() {
        let mut wire = Wire::new(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nhi", 64);
        let mut parser = ResponseParser::new(&mut wire);
        parser.parse_status_line().unwrap();
        assert_eq!(parser.parse_content_length(), Ok(2));
        parser.skip_to_body().unwrap();
        let mut body = [0u8; 3];
        assert_eq!(parser.read_body(2, &mut body), Ok(2));
        assert_eq!(&body, b"hi\0");
    }

    #[test]
    fn missing_content_length_is_protocol_error() {
        let mut wire = Wire::new(b"HTTP/1.1 200 OK\r\nServer: x\r\n\r\nhello", 64);
        let mut parser = ResponseParser::new(&mut wire);
        parser.parse_status_line().unwrap();
        assert_eq!(parser.parse_content_length(), Err(Error::ProtocolError));
    }

    #[test]
    fn body_needs_room_for_terminator() {
        let mut wire = Wire::new(b"abcd", 64);
        let mut parser = ResponseParser::new(&mut wire);
        let mut body = [0u8; 4];
        assert_eq!(parser.read_body(4, &mut body), Err(Error::BufferTooSmall));
        assert_eq!(wire.pos, 0);
    }

    #[test]
    fn premature_close_in_body_fails() {
        let mut wire = Wire::new(b"abc", 64);
        let mut parser = ResponseParser::new(&mut wire);
        let mut body = [0u8; 16];
        assert_eq!(parser.read_body(10, &mut body), Err(Error::ConnectionClosed));
    }

    #[test]
    fn zero_length_body() {
        let mut wire = Wire::new(b"", 64);
        let mut parser = ResponseParser::new(&mut wire);
        let mut body = [0xFFu8; 1];
        assert_eq!(parser.read_body(0, &mut body), Ok(0));
        assert_eq!(body[0], 0);
    }

    #[test]
    fn overlong_header_line_fails() {
        let mut data = std::vec::Vec::from(&b"HTTP/1.1 200 OK\r\nX-Long: "[..]);
        data.extend(core::iter::repeat(b'a').take(RESPONSE_LINE_LEN));
        data.extend_from_slice(b"\r\nContent-Length: 1\r\n\r\nx");
        let mut wire = Wire::new(&data, 64);
        let mut parser = ResponseParser::new(&mut wire);
        parser.parse_status_line().unwrap();
        assert_eq!(parser.parse_content_length(), Err(Error::LineTooLong));
    }
}
