use heapless::String;

use super::request::write_post_json;
use super::response::ResponseParser;
use crate::network::error::Error;
use crate::network::{Close, Connect, TlsSession};

/// Longest hostname the client stores.
pub const MAX_HOSTNAME_LEN: usize = 128;

/// Status line and framing of a response whose body was copied into the
/// caller's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    /// Numeric status code from the status line.
    pub status_code: u16,
    /// Number of body bytes written to the caller's buffer.
    pub content_length: usize,
}

impl Response {
    /// True for `200 OK`, the only status the update service treats as success.
    pub fn is_ok(&self) -> bool {
        self.status_code == 200
    }

    /// The body bytes inside the buffer that was passed to
    /// [`Client::post_json`].
    pub fn body<'b>(&self, buffer: &'b [u8]) -> &'b [u8] {
        &buffer[..self.content_length.min(buffer.len())]
    }
}

/// HTTP/1.1 client speaking to a single host.
///
/// Every call opens a fresh session, performs exactly one request/response
/// exchange and closes the session again: no keep-alive, no pipelining.
pub struct Client<N: Connect> {
    connector: N,
    host: String<MAX_HOSTNAME_LEN>,
    port: u16,
    initialized: bool,
}

impl<N: Connect> core::fmt::Debug for Client<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.host.as_str())
            .field("port", &self.port)
            .field("initialized", &self.initialized)
            .finish()
    }
}

impl<N: Connect> Client<N> {
    /// Creates a client for `host:port`. The TLS context is prepared later by
    /// [`init`](Self::init).
    pub fn new(connector: N, host: &str, port: u16) -> Result<Self, Error> {
        if host.is_empty() || port == 0 {
            return Err(Error::InvalidAddress);
        }
        let host = String::try_from(host).map_err(|_| Error::InvalidAddress)?;
        Ok(Self {
            connector,
            host,
            port,
            initialized: false,
        })
    }

    /// Prepares the connector's TLS context. Safe to call again after a
    /// failure.
    pub fn init(&mut self) -> Result<(), Error> {
        self.initialized = false;
        debug!("http: initializing TLS context for {}", self.host.as_str());
        self.connector
            .init(&self.host, self.port)
            .map_err(|e| {
                let e: Error = e.into();
                error!("http: TLS context initialization failed: {:?}", e);
                e
            })?;
        self.initialized = true;
        Ok(())
    }

    /// Whether [`init`](Self::init) has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Remote host name.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Remote port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Gives the connector back.
    pub fn into_inner(self) -> N {
        self.connector
    }

    /// Posts `json_body` to `path` and copies the response body into
    /// `body_out`.
    ///
    /// `body_out` must have room for the body plus a NUL terminator; a larger
    /// body fails the request with [`Error::BufferTooSmall`] without reading
    /// it. The session is closed on every path out of this function.
    pub fn post_json(
        &mut self,
        path: &str,
        json_body: &str,
        body_out: &mut [u8],
    ) -> Result<Response, Error> {
        if !self.initialized {
            error!("http: client not initialized");
            return Err(Error::NotInitialized);
        }

        info!("http: connecting to {}:{}", self.host.as_str(), self.port);
        let mut session = self.connector.connect(&self.host, self.port).map_err(|e| {
            let e: Error = e.into();
            error!("http: connect failed: {:?}", e);
            e
        })?;

        let result = self.exchange(&mut session, path, json_body, body_out);

        if let Err(e) = session.close() {
            debug!("http: close reported {:?}", Into::<Error>::into(e));
        }

        result
    }

    fn exchange(
        &self,
        session: &mut N::Connection,
        path: &str,
        json_body: &str,
        body_out: &mut [u8],
    ) -> Result<Response, Error> {
        debug!("http: performing TLS handshake");
        loop {
            match session.handshake() {
                Ok(()) => break,
                Err(e) => match Into::<Error>::into(e) {
                    Error::WouldBlock => continue,
                    other => {
                        error!("http: handshake failed: {:?}", other);
                        return Err(Error::HandshakeFailed);
                    }
                },
            }
        }

        debug!("http: verifying peer certificate");
        let flags = session.verify_result();
        if flags != 0 {
            error!("http: peer verification failed, flags {}", flags);
            return Err(Error::PeerVerificationFailed(flags));
        }

        debug!("http: writing request");
        write_post_json(session, path, &self.host, json_body)?;

        debug!("http: reading response");
        let mut parser = ResponseParser::new(session);
        let status_code = parser.parse_status_line().inspect_err(|e| {
            error!("http: failed to read status line: {:?}", e);
        })?;
        debug!("http: status {}", status_code);

        let content_length = parser.parse_content_length().inspect_err(|e| {
            error!("http: failed to read content length: {:?}", e);
        })?;
        debug!("http: content length {}", content_length);

        parser.skip_to_body()?;

        if content_length >= body_out.len() {
            error!(
                "http: body of {} bytes does not fit buffer of {}",
                content_length,
                body_out.len()
            );
            return Err(Error::BufferTooSmall);
        }

        parser.read_body(content_length, body_out)?;
        debug!("http: response complete");

        Ok(Response {
            status_code,
            content_length,
        })
    }
}
