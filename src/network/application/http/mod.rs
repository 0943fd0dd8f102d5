//! HTTP/1.1 protocol implementation for embedded systems.
//!
//! This module implements the narrow slice of HTTP/1.1 that the update
//! service speaks: a JSON `POST` per session and a `Content-Length` framed
//! response. It never allocates and never buffers a whole response.
//!
//! # Layers
//!
//! - [`line`]: bounded CR LF line reader over a session
//! - [`response`]: status line / `Content-Length` / body parser built on it
//! - [`request`]: request writer with partial-write retry
//! - [`client`]: one full round trip (`connect → handshake → verify →
//!   write → parse → close`)
//!
//! # Usage
//!
//! ```rust,no_run
//! use libota::network::application::http::Client;
//! # use libota::network::error::Error;
//! # use libota::network::{Close, Connect, Connection, Read, TlsSession, Write};
//! # struct Session;
//! # impl Read for Session {
//! #     type Error = Error;
//! #     fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Error> { Ok(0) }
//! # }
//! # impl Write for Session {
//! #     type Error = Error;
//! #     fn write(&mut self, buf: &[u8]) -> Result<usize, Error> { Ok(buf.len()) }
//! #     fn flush(&mut self) -> Result<(), Error> { Ok(()) }
//! # }
//! # impl Close for Session {
//! #     type Error = Error;
//! #     fn close(self) -> Result<(), Error> { Ok(()) }
//! # }
//! # impl Connection for Session {}
//! # impl TlsSession for Session {
//! #     fn handshake(&mut self) -> Result<(), Error> { Ok(()) }
//! #     fn verify_result(&self) -> u32 { 0 }
//! # }
//! # struct Tls;
//! # impl Connect for Tls {
//! #     type Connection = Session;
//! #     type Error = Error;
//! #     fn connect(&mut self, _host: &str, _port: u16) -> Result<Session, Error> { Ok(Session) }
//! # }
//!
//! let mut client = Client::new(Tls, "api.otaupdate.net", 443).unwrap();
//! client.init().unwrap();
//!
//! let mut body = [0u8; 64];
//! if let Ok(response) = client.post_json("/v1/ping", "{}", &mut body) {
//!     let _payload = response.body(&body);
//! }
//! ```

/// HTTP client implementation and supporting types.
pub mod client;

/// CR LF line reader.
pub mod line;

/// Request writer.
pub mod request;

/// Streaming response parser.
pub mod response;

pub use client::{Client, Response};
