// src/transport/mod.rs

//! The transport abstraction the client is built against.
//!
//! A [`Transport`] hands out capability-scoped sockets; the socket's
//! [`SocketRole`] is fixed at creation and determines which of send/receive
//! are valid. Implementations own all resource cleanup: dropping a socket
//! releases whatever the transport allocated for it.

use crate::error::ReliqError;
use crate::message::Msg;
use async_trait::async_trait;

pub mod inproc;

/// The messaging role a socket is created with, fixed for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketRole {
  /// Sends requests and receives paired replies, one at a time.
  Requester,
  /// Receives requests and sends paired replies, one at a time.
  Replier,
  /// Fire-and-forget sender; deliveries are distributed across receivers
  /// by the transport.
  Pusher,
  /// Receive-only counterpart of `Pusher`.
  Puller,
}

impl SocketRole {
  /// Whether sockets of this role may send at all.
  pub fn can_send(&self) -> bool {
    !matches!(self, SocketRole::Puller)
  }

  /// Whether sockets of this role may receive at all.
  pub fn can_recv(&self) -> bool {
    !matches!(self, SocketRole::Pusher)
  }
}

/// Whether a send/receive attempt may park the caller, or must signal
/// [`ReliqError::WouldBlock`] when it cannot complete immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockingMode {
  Blocking,
  NonBlocking,
}

/// Factory for transport sockets.
///
/// Implemented by the external messaging layer and injected into
/// [`Client`](crate::Client), which lets tests substitute a scripted fake
/// without any global state.
#[async_trait]
pub trait Transport: Send + Sync {
  type Socket: TransportSocket;

  /// Creates a fresh, unconnected socket of the given role.
  async fn socket(&self, role: SocketRole) -> Result<Self::Socket, ReliqError>;
}

/// A single channel created by a [`Transport`].
///
/// Non-blocking send/receive must report the would-block condition as
/// `Err(ReliqError::WouldBlock)`, distinct from every hard fault; the
/// client's retry loop depends on that distinction.
#[async_trait]
pub trait TransportSocket: Send + Sync {
  /// Initiates an outbound connection to `endpoint`.
  async fn connect(&self, endpoint: &str) -> Result<(), ReliqError>;

  /// Binds (listens) at `endpoint`.
  async fn bind(&self, endpoint: &str) -> Result<(), ReliqError>;

  /// Sends one opaque payload according to the socket's role.
  async fn send(&self, msg: Msg, mode: BlockingMode) -> Result<(), ReliqError>;

  /// Receives one opaque payload according to the socket's role.
  async fn recv(&self, mode: BlockingMode) -> Result<Msg, ReliqError>;
}
