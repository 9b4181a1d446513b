// src/error.rs

use std::io;
use thiserror::Error;

/// Errors surfaced by client operations and transport implementations.
#[derive(Error, Debug)]
#[non_exhaustive] // Allows adding more variants later without breaking change
pub enum ReliqError {
  // --- I/O Errors ---
  #[error("I/O error: {0}")]
  Io(#[from] io::Error), // Allows easy conversion from std::io::Error

  // --- Connection/Binding Errors ---
  #[error("Connection to {endpoint} failed: {reason}")]
  ConnectionFailed { endpoint: String, reason: String },
  #[error("Connection refused by peer: {0}")]
  ConnectionRefused(String), // Endpoint string
  #[error("Address already in use: {0}")]
  AddrInUse(String), // Endpoint string
  #[error("Connection closed by peer or transport")]
  ConnectionClosed,

  // --- Endpoint Errors ---
  #[error("Invalid endpoint format: {0}")]
  InvalidEndpoint(String),
  #[error("Transport scheme not supported: {0}")]
  UnsupportedTransport(String),

  // --- Send/Receive Errors ---
  #[error("Send failed: {0}")]
  SendFailed(String),
  #[error("Receive failed: {0}")]
  RecvFailed(String),

  /// A non-blocking attempt could not complete immediately (EAGAIN
  /// equivalent). Retryable only: the client consumes this internally to
  /// drive its retry loop and never returns it as a terminal failure.
  #[error("Operation would block")]
  WouldBlock,

  // --- State Errors ---
  #[error("Operation is invalid for the socket role ({0})")]
  InvalidRole(&'static str),
  #[error("Operation is invalid for the current socket state: {0}")]
  InvalidState(&'static str),

  // --- Internal Errors ---
  #[error("Internal library error: {0}")]
  Internal(String),
}

impl ReliqError {
  /// True for the transient would-block signal, false for every hard fault.
  pub fn is_would_block(&self) -> bool {
    matches!(self, ReliqError::WouldBlock)
  }
}

/// Snapshot of the most recently recorded failure, kept by the client for
/// inspection via [`Client::last_error`](crate::Client::last_error).
///
/// The per-call `Result` is authoritative; this snapshot exists for callers
/// of the boolean-returning operations (e.g. `push`) that want the cause
/// after the fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastError {
  /// Human-readable cause, rendered from the underlying error.
  pub cause: String,
  /// OS error code, when the fault originated from an I/O error.
  pub code: Option<i32>,
}

impl From<&ReliqError> for LastError {
  fn from(err: &ReliqError) -> Self {
    let code = match err {
      ReliqError::Io(e) => e.raw_os_error(),
      _ => None,
    };
    Self {
      cause: err.to_string(),
      code,
    }
  }
}
