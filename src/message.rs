// src/message.rs

use bytes::Bytes;
use std::fmt;

/// A single opaque message payload.
///
/// Payloads pass through the client unmodified; `Bytes` keeps clones cheap
/// (reference counted), which the retry loop relies on when it has to resend
/// the same request.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Msg {
  data: Option<Bytes>,
}

impl Msg {
  /// Creates an empty message with no data.
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates a message from a `Vec<u8>`, taking ownership.
  pub fn from_vec(data: Vec<u8>) -> Self {
    Self {
      data: Some(Bytes::from(data)),
    }
  }

  /// Creates a message from `bytes::Bytes`.
  pub fn from_bytes(data: Bytes) -> Self {
    Self { data: Some(data) }
  }

  /// Creates a message from a static byte slice (zero-copy).
  pub fn from_static(data: &'static [u8]) -> Self {
    Self {
      data: Some(Bytes::from_static(data)),
    }
  }

  /// Returns a reference to the message payload bytes, if any.
  pub fn data(&self) -> Option<&[u8]> {
    self.data.as_deref()
  }

  /// Returns the size of the message payload in bytes.
  pub fn size(&self) -> usize {
    self.data.as_ref().map_or(0, |d| d.len())
  }

  /// Returns the internal `Bytes` object if data is present.
  pub fn into_bytes(self) -> Option<Bytes> {
    self.data
  }
}

impl fmt::Debug for Msg {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Msg").field("size", &self.size()).finish()
  }
}

impl From<Vec<u8>> for Msg {
  fn from(data: Vec<u8>) -> Self {
    Msg::from_vec(data)
  }
}

impl From<&'static [u8]> for Msg {
  fn from(data: &'static [u8]) -> Self {
    Msg::from_static(data)
  }
}
