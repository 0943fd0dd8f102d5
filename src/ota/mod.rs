#![deny(unsafe_code)]

//! # Over-the-Air (OTA) Update Agent
//!
//! The agent periodically posts the device identity to an update service.
//! When the service names a newer image, the agent downloads it block by
//! block into an [`OtaStorage`](crate::storage::ota::OtaStorage) backend,
//! lets the backend validate it, and reboots into it.
//!
//! ## Flow
//!
//! ```text
//! Agent::iterate
//!   └─ check_for_update ──▶ UpToDate | Error ─▶ wait for next period
//!        └─ Available(uuid, size)
//!             ├─ listeners: on_update_available
//!             ├─ listeners: on_will_update
//!             └─ BlockDownloader::download ─▶ end_and_validate ─▶ reboot
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use libota::ota::{Agent, Config, DeviceIdentity};
//! # use libota::network::error::Error;
//! # use libota::network::{Close, Connect, Connection, Read, TlsSession, Write};
//! # use libota::storage::{error::Error as StorageError, ota::OtaStorage};
//! # use libota::system::{Clock, Delay};
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
//! # struct Flash;
//! # impl OtaStorage for Flash {
//! #     type Error = StorageError;
//! #     fn begin(&mut self) -> Result<usize, StorageError> { Ok(512) }
//! #     fn write_block(&mut self, _data: &[u8]) -> Result<(), StorageError> { Ok(()) }
//! #     fn end_and_validate(&mut self) -> Result<(), StorageError> { Ok(()) }
//! #     fn abort(&mut self) {}
//! #     fn reboot(&mut self) {}
//! # }
//! # struct Ticks;
//! # impl Clock for Ticks { fn now_ms(&self) -> u64 { 0 } }
//! # impl Delay for Ticks { fn delay_ms(&mut self, _ms: u32) {} }
//!
//! let identity = DeviceIdentity::new("11111111-1111-1111-1111-111111111111", "SN-0042").unwrap();
//! let mut agent: Agent<'_, _, _, _, _> =
//!     Agent::new(Config::default(), identity, Tls, Flash, Ticks, Ticks).unwrap();
//!
//! loop {
//!     agent.iterate();
//!     // ... the rest of the main loop
//! }
//! ```

/// Poller owning the agent's state.
pub mod agent;

/// Check-in request and response interpretation.
pub mod check;

/// Configuration and endpoint paths.
pub mod config;

/// Block download engine.
pub mod download;

/// Device identity.
pub mod identity;

/// Update listeners.
pub mod listener;

pub use agent::{Agent, Cycle};
pub use check::{CheckError, CheckOutcome, UpdateInfo};
pub use config::{Config, ConfigError};
pub use download::{BlockDownloader, DownloadError, DownloadReport};
pub use identity::{DeviceIdentity, IdentityError};
pub use listener::{ListenerError, Listeners, UpdateListener};
