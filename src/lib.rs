// src/lib.rs

//! reliq - reliable request and push client primitives over pluggable
//! message-queue transports.
//!
//! The crate layers a small set of convenience operations (connect, bind,
//! send, push, synchronous request/reply, and a bounded non-blocking retry
//! request) over an injected [`Transport`]. The transport supplies sockets
//! with fixed roles; this layer never touches wire framing or polling and
//! treats payloads as opaque bytes.
//!
//! # Example
//! ```
//! use reliq::{Client, InprocTransport, Msg, SocketRole};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), reliq::ReliqError> {
//! let transport = InprocTransport::new();
//! let client = Client::new(transport.clone());
//!
//! let replier = client.bind("inproc://greeter", SocketRole::Replier).await?;
//! tokio::spawn(async move {
//!   use reliq::{BlockingMode, TransportSocket};
//!   let request = replier.recv(BlockingMode::Blocking).await.unwrap();
//!   replier.send(request, BlockingMode::Blocking).await.unwrap();
//! });
//!
//! let reply = client.request("inproc://greeter", Msg::from_static(b"hello")).await?;
//! assert_eq!(reply.data(), Some(&b"hello"[..]));
//! # Ok(())
//! # }
//! ```

// Declare modules that make up the library.

/// Defines the `Client`, the entry point for all operations.
pub mod client;
/// Defines custom error types used throughout the library.
pub mod error;
/// Contains types related to message representation.
pub mod message;
/// Retry policies and outcomes for the bounded-retry request operation.
pub mod retry;
/// The transport abstraction and the built-in in-process transport.
pub mod transport;

pub(crate) mod endpoint;

// Re-export core types for user convenience, making them accessible directly
// from the crate root (e.g., `reliq::Client`, `reliq::ReliqError`).
pub use client::Client;
pub use error::{LastError, ReliqError};
pub use message::Msg;
pub use retry::{Backoff, RetryOutcome, RetryPolicy};
pub use transport::inproc::InprocTransport;
pub use transport::{BlockingMode, SocketRole, Transport, TransportSocket};

// Cancellation handle for long retry sequences, re-exported so callers do not
// need a direct tokio-util dependency.
pub use tokio_util::sync::CancellationToken;
