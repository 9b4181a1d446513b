// src/transport/inproc.rs

//! In-process transport backed by bounded channels.
//!
//! Endpoints use the `inproc://<name>` scheme. A bind registers a bounded
//! queue under `<name>`; connects look the name up in the shared registry.
//! Requester deliveries carry a capacity-1 reply channel so a Replier can
//! answer the exact request it dequeued; Pusher deliveries carry none.
//!
//! The bounded queue is what produces the would-block signals the client's
//! retry loop consumes: a full queue makes a non-blocking send return
//! `WouldBlock`, an empty one does the same for a non-blocking receive.

use crate::endpoint::split_endpoint;
use crate::error::ReliqError;
use crate::message::Msg;
use crate::transport::{BlockingMode, SocketRole, Transport, TransportSocket};
use async_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Default per-endpoint queue depth. Matches the order of magnitude a small
/// intra-process worker pool needs without letting senders run far ahead.
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// One queued payload, carrying the reply channel when the sender expects a
/// paired answer.
struct Delivery {
  payload: Msg,
  reply_tx: Option<Sender<Msg>>,
}

#[derive(Clone)]
struct Binding {
  role: SocketRole,
  queue_tx: Sender<Delivery>,
}

#[derive(Default)]
struct Registry {
  bindings: Mutex<HashMap<String, Binding>>,
}

impl Registry {
  fn lock(&self) -> MutexGuard<'_, HashMap<String, Binding>> {
    match self.bindings.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    }
  }
}

fn compatible(connector: SocketRole, binder: SocketRole) -> bool {
  matches!(
    (connector, binder),
    (SocketRole::Requester, SocketRole::Replier) | (SocketRole::Pusher, SocketRole::Puller)
  )
}

/// In-process [`Transport`] implementation.
///
/// Cloning is cheap and every clone shares the same endpoint registry, so a
/// test (or an embedder wiring intra-process services) can hand one clone to
/// the binding side and another to the [`Client`](crate::Client).
#[derive(Clone)]
pub struct InprocTransport {
  registry: Arc<Registry>,
  capacity: usize,
}

impl InprocTransport {
  /// Creates a transport with the default queue capacity.
  pub fn new() -> Self {
    Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
  }

  /// Creates a transport whose bound endpoints queue at most `capacity`
  /// deliveries. A capacity of zero is treated as one.
  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      registry: Arc::new(Registry::default()),
      capacity: capacity.max(1),
    }
  }
}

impl Default for InprocTransport {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl Transport for InprocTransport {
  type Socket = InprocSocket;

  async fn socket(&self, role: SocketRole) -> Result<InprocSocket, ReliqError> {
    Ok(InprocSocket {
      role,
      capacity: self.capacity,
      registry: Arc::clone(&self.registry),
      state: Mutex::new(SocketState::default()),
    })
  }
}

#[derive(Default)]
struct SocketState {
  // Connect side.
  peer_tx: Option<Sender<Delivery>>,
  /// Requester only: reply channel of the in-flight request.
  pending_reply: Option<Receiver<Msg>>,
  // Bind side.
  queue_rx: Option<Receiver<Delivery>>,
  bound_name: Option<String>,
  /// Replier only: reply sender of the last dequeued request.
  pending_reply_tx: Option<Sender<Msg>>,
}

/// A socket created by [`InprocTransport`].
///
/// The state mutex is never held across an await; channel handles are cloned
/// out before any blocking operation.
pub struct InprocSocket {
  role: SocketRole,
  capacity: usize,
  registry: Arc<Registry>,
  state: Mutex<SocketState>,
}

impl InprocSocket {
  fn state_lock(&self) -> MutexGuard<'_, SocketState> {
    match self.state.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    }
  }

  fn parse(&self, endpoint: &str) -> Result<String, ReliqError> {
    let (scheme, name) = split_endpoint(endpoint)?;
    if scheme != "inproc" {
      return Err(ReliqError::UnsupportedTransport(scheme.to_string()));
    }
    Ok(name.to_string())
  }

  fn peer(&self) -> Result<Sender<Delivery>, ReliqError> {
    self
      .state_lock()
      .peer_tx
      .clone()
      .ok_or(ReliqError::InvalidState("socket is not connected"))
  }

  async fn send_request(&self, msg: Msg, mode: BlockingMode) -> Result<(), ReliqError> {
    let peer = self.peer()?;
    if self.state_lock().pending_reply.is_some() {
      return Err(ReliqError::InvalidState(
        "Requester must receive the reply before sending again",
      ));
    }
    let (reply_tx, reply_rx) = bounded(1);
    deliver(
      &peer,
      Delivery {
        payload: msg,
        reply_tx: Some(reply_tx),
      },
      mode,
    )
    .await?;
    self.state_lock().pending_reply = Some(reply_rx);
    Ok(())
  }

  async fn push_out(&self, msg: Msg, mode: BlockingMode) -> Result<(), ReliqError> {
    let peer = self.peer()?;
    deliver(
      &peer,
      Delivery {
        payload: msg,
        reply_tx: None,
      },
      mode,
    )
    .await
  }

  /// Answers the request last dequeued by `recv`. The reply channel has
  /// capacity 1 and is dedicated to that request, so blocking mode is
  /// immaterial here.
  async fn send_reply(&self, msg: Msg) -> Result<(), ReliqError> {
    let reply_tx = self.state_lock().pending_reply_tx.take().ok_or(ReliqError::InvalidState(
      "Replier must receive a request before sending a reply",
    ))?;
    reply_tx.try_send(msg).map_err(|e| match e {
      TrySendError::Full(_) => ReliqError::SendFailed("reply already sent".into()),
      TrySendError::Closed(_) => ReliqError::ConnectionClosed,
    })
  }

  async fn recv_reply(&self, mode: BlockingMode) -> Result<Msg, ReliqError> {
    let reply_rx = self.state_lock().pending_reply.clone().ok_or(ReliqError::InvalidState(
      "Requester must send a request before receiving",
    ))?;
    let msg = match mode {
      BlockingMode::NonBlocking => reply_rx.try_recv().map_err(|e| match e {
        TryRecvError::Empty => ReliqError::WouldBlock,
        // The peer dropped the request without answering it.
        TryRecvError::Closed => ReliqError::ConnectionClosed,
      })?,
      BlockingMode::Blocking => reply_rx.recv().await.map_err(|_| ReliqError::ConnectionClosed)?,
    };
    self.state_lock().pending_reply = None;
    Ok(msg)
  }

  async fn recv_delivery(&self, mode: BlockingMode) -> Result<Msg, ReliqError> {
    let queue_rx = self
      .state_lock()
      .queue_rx
      .clone()
      .ok_or(ReliqError::InvalidState("socket is not bound"))?;
    let delivery = match mode {
      BlockingMode::NonBlocking => queue_rx.try_recv().map_err(|e| match e {
        TryRecvError::Empty => ReliqError::WouldBlock,
        TryRecvError::Closed => ReliqError::ConnectionClosed,
      })?,
      BlockingMode::Blocking => queue_rx.recv().await.map_err(|_| ReliqError::ConnectionClosed)?,
    };
    if self.role == SocketRole::Replier {
      self.state_lock().pending_reply_tx = delivery.reply_tx;
    }
    Ok(delivery.payload)
  }
}

async fn deliver(queue: &Sender<Delivery>, delivery: Delivery, mode: BlockingMode) -> Result<(), ReliqError> {
  match mode {
    BlockingMode::NonBlocking => queue.try_send(delivery).map_err(|e| match e {
      TrySendError::Full(_) => ReliqError::WouldBlock,
      TrySendError::Closed(_) => ReliqError::ConnectionClosed,
    }),
    BlockingMode::Blocking => queue.send(delivery).await.map_err(|_| ReliqError::ConnectionClosed),
  }
}

#[async_trait]
impl TransportSocket for InprocSocket {
  async fn connect(&self, endpoint: &str) -> Result<(), ReliqError> {
    let name = self.parse(endpoint)?;
    if !matches!(self.role, SocketRole::Requester | SocketRole::Pusher) {
      return Err(ReliqError::InvalidRole("only Requester and Pusher sockets connect"));
    }
    let binding = self
      .registry
      .lock()
      .get(&name)
      .cloned()
      .ok_or_else(|| ReliqError::ConnectionRefused(endpoint.to_string()))?;
    if !compatible(self.role, binding.role) {
      return Err(ReliqError::ConnectionFailed {
        endpoint: endpoint.to_string(),
        reason: format!("bound peer role {:?} does not accept {:?}", binding.role, self.role),
      });
    }
    tracing::debug!(endpoint, role = ?self.role, "inproc connect");
    self.state_lock().peer_tx = Some(binding.queue_tx);
    Ok(())
  }

  async fn bind(&self, endpoint: &str) -> Result<(), ReliqError> {
    let name = self.parse(endpoint)?;
    if !matches!(self.role, SocketRole::Replier | SocketRole::Puller) {
      return Err(ReliqError::InvalidRole("only Replier and Puller sockets bind"));
    }
    let (queue_tx, queue_rx) = bounded(self.capacity);
    {
      let mut bindings = self.registry.lock();
      if bindings.contains_key(&name) {
        return Err(ReliqError::AddrInUse(endpoint.to_string()));
      }
      bindings.insert(
        name.clone(),
        Binding {
          role: self.role,
          queue_tx,
        },
      );
    }
    tracing::debug!(endpoint, role = ?self.role, "inproc bind");
    let mut state = self.state_lock();
    state.queue_rx = Some(queue_rx);
    state.bound_name = Some(name);
    Ok(())
  }

  async fn send(&self, msg: Msg, mode: BlockingMode) -> Result<(), ReliqError> {
    match self.role {
      SocketRole::Requester => self.send_request(msg, mode).await,
      SocketRole::Pusher => self.push_out(msg, mode).await,
      SocketRole::Replier => self.send_reply(msg).await,
      SocketRole::Puller => Err(ReliqError::InvalidRole("Puller sockets cannot send")),
    }
  }

  async fn recv(&self, mode: BlockingMode) -> Result<Msg, ReliqError> {
    match self.role {
      SocketRole::Requester => self.recv_reply(mode).await,
      SocketRole::Replier | SocketRole::Puller => self.recv_delivery(mode).await,
      SocketRole::Pusher => Err(ReliqError::InvalidRole("Pusher sockets cannot receive")),
    }
  }
}

impl Drop for InprocSocket {
  fn drop(&mut self) {
    // Unbind on drop so the endpoint name becomes reusable.
    let name = self.state_lock().bound_name.take();
    if let Some(name) = name {
      self.registry.lock().remove(&name);
      tracing::trace!(name = %name, "inproc unbind");
    }
  }
}
