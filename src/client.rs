// src/client.rs

//! The client: convenience operations over an injected [`Transport`].
//!
//! Every public operation converts transport faults into its own `Result`;
//! nothing unwinds into the caller. As a convenience the client also keeps a
//! per-instance snapshot of the most recent failure, cleared at the start of
//! every operation and readable through [`Client::last_error`]. The snapshot
//! is a single slot, overwritten by each operation, so the `Result` is the
//! authoritative error channel when calls are interleaved.

use crate::error::{LastError, ReliqError};
use crate::message::Msg;
use crate::retry::{RetryOutcome, RetryPolicy};
use crate::transport::{BlockingMode, SocketRole, Transport, TransportSocket};
use std::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

/// Phase of the bounded-retry request loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
  Sending,
  Receiving,
}

/// Stateless messaging operations over a transport.
///
/// Sockets are created per operation, never pooled or reused across calls,
/// and released by `Drop` on every exit path. The transport is injected, so
/// tests substitute a scripted fake without any global patching.
pub struct Client<T: Transport> {
  transport: T,
  last_error: Mutex<Option<LastError>>,
}

impl<T: Transport> Client<T> {
  pub fn new(transport: T) -> Self {
    Self {
      transport,
      last_error: Mutex::new(None),
    }
  }

  /// The injected transport.
  pub fn transport(&self) -> &T {
    &self.transport
  }

  /// Snapshot of the most recent failure: `None` if the last completed
  /// operation succeeded. Reading does not consume it; the next operation
  /// overwrites it.
  pub fn last_error(&self) -> Option<LastError> {
    self.slot().clone()
  }

  /// Creates a socket of `role` and connects it to `endpoint`.
  pub async fn connect(&self, endpoint: &str, role: SocketRole) -> Result<T::Socket, ReliqError> {
    self.clear_last_error();
    let result = self.open(endpoint, role, false).await;
    self.finish(endpoint, "connect", result)
  }

  /// Creates a socket of `role` and binds it at `endpoint`.
  pub async fn bind(&self, endpoint: &str, role: SocketRole) -> Result<T::Socket, ReliqError> {
    self.clear_last_error();
    let result = self.open(endpoint, role, true).await;
    self.finish(endpoint, "bind", result)
  }

  /// Connects as a Requester and performs one non-blocking send of `msg`.
  ///
  /// Returns the open socket so the caller can receive on it later. On
  /// failure the partially-created socket is dropped. A would-block signal
  /// from the transport is reported as a send failure here; only
  /// [`request_with_retry`](Self::request_with_retry) treats it as retryable.
  pub async fn send(&self, endpoint: &str, msg: Msg) -> Result<T::Socket, ReliqError> {
    self.send_as(endpoint, msg, SocketRole::Requester).await
  }

  /// Like [`send`](Self::send) with a caller-supplied role.
  pub async fn send_as(&self, endpoint: &str, msg: Msg, role: SocketRole) -> Result<T::Socket, ReliqError> {
    self.clear_last_error();
    let result = async {
      let socket = self.open(endpoint, role, false).await?;
      match socket.send(msg, BlockingMode::NonBlocking).await {
        Ok(()) => Ok(socket),
        Err(ReliqError::WouldBlock) => Err(ReliqError::SendFailed("transport not ready to accept the message".into())),
        Err(err) => Err(err),
      }
    }
    .await;
    self.finish(endpoint, "send", result)
  }

  /// Connects as a Pusher and performs one blocking send of `msg`.
  ///
  /// Fire-and-forget: the socket is dropped either way and `true` means the
  /// transport accepted the payload. On `false`, [`last_error`](Self::last_error)
  /// holds the cause.
  pub async fn push(&self, endpoint: &str, msg: Msg) -> bool {
    self.clear_last_error();
    let result = async {
      let socket = self.open(endpoint, SocketRole::Pusher, false).await?;
      socket.send(msg, BlockingMode::Blocking).await
    }
    .await;
    self.finish(endpoint, "push", result).is_ok()
  }

  /// Synchronous RPC-style call: one request, one blocking receive, no
  /// retry. The reply payload is returned verbatim.
  ///
  /// "The remote failed" and "no reply arrived" are indistinguishable here;
  /// use [`request_with_retry`](Self::request_with_retry) when that
  /// distinction matters.
  pub async fn request(&self, endpoint: &str, msg: Msg) -> Result<Msg, ReliqError> {
    self.clear_last_error();
    let result = async {
      let socket = self.open(endpoint, SocketRole::Requester, false).await?;
      match socket.send(msg, BlockingMode::NonBlocking).await {
        Ok(()) => {}
        Err(ReliqError::WouldBlock) => {
          return Err(ReliqError::SendFailed("transport not ready to accept the message".into()))
        }
        Err(err) => return Err(err),
      }
      socket.recv(BlockingMode::Blocking).await
    }
    .await;
    self.finish(endpoint, "request", result)
  }

  /// Non-blocking request with a bounded retry budget.
  ///
  /// See [`request_with_retry_cancellable`](Self::request_with_retry_cancellable);
  /// this variant runs with a token that never fires.
  pub async fn request_with_retry(
    &self,
    endpoint: &str,
    msg: Msg,
    policy: &RetryPolicy,
  ) -> Result<RetryOutcome, ReliqError> {
    self
      .request_with_retry_cancellable(endpoint, msg, policy, &CancellationToken::new())
      .await
  }

  /// Non-blocking request with a bounded retry budget and a cancellation
  /// hook.
  ///
  /// Two phases. Sending: non-blocking send, retried while the transport
  /// signals would-block. Receiving: non-blocking receive, retried the same
  /// way. A single budget of `policy.max_retries` waits covers both phases;
  /// exhausting it yields [`RetryOutcome::TimedOut`], which is not an error.
  /// Any hard transport fault is terminal immediately, regardless of the
  /// remaining budget.
  ///
  /// Connect failures are terminal and outside the retry budget: the budget
  /// covers only the send/receive phases.
  pub async fn request_with_retry_cancellable(
    &self,
    endpoint: &str,
    msg: Msg,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
  ) -> Result<RetryOutcome, ReliqError> {
    self.clear_last_error();
    let result = self.retry_loop(endpoint, msg, policy, cancel).await;
    self.finish(endpoint, "request_with_retry", result)
  }

  async fn retry_loop(
    &self,
    endpoint: &str,
    msg: Msg,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
  ) -> Result<RetryOutcome, ReliqError> {
    let socket = self.open(endpoint, SocketRole::Requester, false).await?;

    let mut phase = Phase::Sending;
    let mut attempts: u32 = 0;
    loop {
      if cancel.is_cancelled() {
        tracing::debug!(endpoint, attempts, "retry request cancelled");
        return Ok(RetryOutcome::Cancelled);
      }

      // `None` marks a completed send, `Some` a received reply.
      let step = match phase {
        Phase::Sending => socket.send(msg.clone(), BlockingMode::NonBlocking).await.map(|()| None),
        Phase::Receiving => socket.recv(BlockingMode::NonBlocking).await.map(Some),
      };

      match step {
        Ok(None) => {
          tracing::trace!(endpoint, attempts, "request accepted by transport");
          phase = Phase::Receiving;
        }
        Ok(Some(reply)) => {
          tracing::trace!(endpoint, attempts, size = reply.size(), "reply received");
          return Ok(RetryOutcome::Reply(reply));
        }
        Err(ReliqError::WouldBlock) => {
          if attempts >= policy.max_retries {
            tracing::debug!(endpoint, attempts, ?phase, "retry budget exhausted");
            return Ok(RetryOutcome::TimedOut { attempts });
          }
          let wait = policy.interval_for(attempts);
          attempts += 1;
          tokio::select! {
            _ = cancel.cancelled() => {
              tracing::debug!(endpoint, attempts, "retry request cancelled during wait");
              return Ok(RetryOutcome::Cancelled);
            }
            _ = tokio::time::sleep(wait) => {}
          }
        }
        Err(err) => return Err(err),
      }
    }
  }

  async fn open(&self, endpoint: &str, role: SocketRole, bind: bool) -> Result<T::Socket, ReliqError> {
    let socket = self.transport.socket(role).await?;
    if bind {
      socket.bind(endpoint).await?;
    } else {
      socket.connect(endpoint).await?;
    }
    Ok(socket)
  }

  fn finish<V>(&self, endpoint: &str, op: &'static str, result: Result<V, ReliqError>) -> Result<V, ReliqError> {
    if let Err(err) = &result {
      tracing::debug!(endpoint, op, error = %err, "operation failed");
      *self.slot() = Some(LastError::from(err));
    }
    result
  }

  fn clear_last_error(&self) {
    *self.slot() = None;
  }

  fn slot(&self) -> MutexGuard<'_, Option<LastError>> {
    match self.last_error.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    }
  }
}
