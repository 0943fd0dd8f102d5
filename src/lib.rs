//! # libota - firmware-update agent for embedded devices
//!
//! `libota` keeps a device's firmware current: it periodically asks an
//! update service whether a newer image exists, downloads it in fixed-size
//! blocks over an HTTP-over-TLS session, and commits it to persistent storage,
//! switching the boot image only after the whole image has been received and
//! validated. The library is `no_std`, never allocates, and runs on a single
//! cooperative execution context.
//!
//! ## Features
//!
//! ### Network
//! - Transport capability traits the board implements on its TLS stack
//! - Minimal HTTP/1.1 client: bounded line reader, streaming response
//!   parser, partial-write safe request writer
//!
//! ### Update agent
//! - Update-check protocol and block download engine with a global
//!   failed-attempt budget
//! - Poller with lazy client initialization and synchronous listeners
//!
//! ### Storage
//! - Generic storage device traits
//! - Firmware storage contract plus an A/B partition backend with CRC-32
//!   validation
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! libota = "0.1.0"
//! ```
//!
//! ### Checking for an update by hand
//!
//! ```rust,no_run
//! use libota::network::application::http::Client;
//! use libota::ota::{check::check_for_update, CheckOutcome, Config, DeviceIdentity};
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
//! let config = Config::default();
//! let identity = DeviceIdentity::new("11111111-1111-1111-1111-111111111111", "SN-0042").unwrap();
//! let mut client = Client::new(Tls, config.hostname, config.port).unwrap();
//! client.init().unwrap();
//!
//! match check_for_update(&mut client, &config, &identity) {
//!     CheckOutcome::Available(update) => { /* hand it to a BlockDownloader */ }
//!     CheckOutcome::UpToDate => {}
//!     CheckOutcome::Error(_) => { /* try again next period */ }
//! }
//! ```
//!
//! ## Platform Support
//!
//! This library is designed to work on:
//! - Embedded microcontrollers (ARM Cortex-M, RISC-V, Xtensa)
//! - Linux-based devices, with the `std` feature for host time sources
//! - Any platform supporting Rust's `core` library
//!
//! ## Optional Features
//!
//! - `std`: Host implementations of the system traits (default: disabled)
//! - `defmt`: Log through `defmt` and derive `defmt::Format` for errors
//! - `log`: Log through the `log` facade

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

#[macro_use]
mod fmt;

/// Network abstraction layer and the HTTP client built on it.
///
/// Boards plug in their TCP/TLS stack by implementing the session traits;
/// the HTTP layer drives one request/response exchange per session.
pub mod network;

/// Storage abstraction layer for firmware images.
///
/// Provides the generic device traits, the firmware storage contract used
/// by the download engine, and an A/B partition backend.
pub mod storage;

/// Time, sleep and reset services borrowed from the host.
pub mod system;

/// Over-the-air update agent combining the network and storage layers.
pub mod ota;
