//! # Application Layer Network Protocols
//!
//! Application layer (OSI Layer 7) protocols spoken by the update agent.
//! Every implementation works over any session implementing
//! [`TlsSession`](crate::network::TlsSession), never allocates, and keeps
//! its working memory in caller-provided or fixed-size buffers.
//!
//! ## Available Protocols
//!
//! - **[`http`]**: the minimal HTTP/1.1 subset used to talk to the update
//!   service (JSON `POST`, `Content-Length` framed responses)

/// HTTP client implementation.
///
/// Provides the streaming HTTP/1.1 `POST` client used for update checks and
/// block fetches.
pub mod http;
