// tests/common.rs
#![allow(dead_code)] // Not every test binary uses every helper

use async_trait::async_trait;
use reliq::{BlockingMode, Msg, ReliqError, SocketRole, Transport, TransportSocket};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

static INPROC_ENDPOINT_COUNTER: AtomicUsize = AtomicUsize::new(0);

// Use std::sync::Once for one-time initialization
static TRACING_INIT: Once = Once::new();

// Setup function to initialize tracing
pub fn setup_tracing() {
  TRACING_INIT.call_once(|| {
    // Default level filter, overridable via RUST_LOG
    let default_filter = "reliq=trace,debug";
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let subscriber = FmtSubscriber::builder()
      .with_env_filter(env_filter)
      .with_target(true)
      .with_test_writer()
      .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set global tracing subscriber");
  });
}

// Helper to generate unique inproc endpoints so parallel tests never collide
pub fn unique_inproc_endpoint() -> String {
  let count = INPROC_ENDPOINT_COUNTER.fetch_add(1, Ordering::Relaxed);
  format!("inproc://reliq_test_{}_{}", std::process::id(), count)
}

/// Convenience: `n` would-block send steps for a mock script.
pub fn would_block_sends(n: usize) -> Vec<Result<(), ReliqError>> {
  (0..n).map(|_| Err(ReliqError::WouldBlock)).collect()
}

/// Convenience: `n` would-block receive steps for a mock script.
pub fn would_block_recvs(n: usize) -> Vec<Result<Msg, ReliqError>> {
  (0..n).map(|_| Err(ReliqError::WouldBlock)).collect()
}

/// Scripted transport for exercising the client deterministically.
///
/// Send and receive pop pre-queued results first; once a script runs dry,
/// sends succeed and receives echo the last successfully sent payload.
#[derive(Clone, Default)]
pub struct MockTransport {
  state: Arc<MockState>,
}

#[derive(Default)]
struct MockState {
  connect_error: Mutex<Option<ReliqError>>,
  send_script: Mutex<VecDeque<Result<(), ReliqError>>>,
  recv_script: Mutex<VecDeque<Result<Msg, ReliqError>>>,
  last_sent: Mutex<Option<Msg>>,
  send_attempts: AtomicU32,
  recv_attempts: AtomicU32,
  created_roles: Mutex<Vec<SocketRole>>,
}

impl MockTransport {
  pub fn new() -> Self {
    Self::default()
  }

  /// The next connect on any socket fails with `err`.
  pub fn fail_connect(self, err: ReliqError) -> Self {
    *self.state.connect_error.lock().unwrap() = Some(err);
    self
  }

  pub fn script_send(self, steps: impl IntoIterator<Item = Result<(), ReliqError>>) -> Self {
    self.state.send_script.lock().unwrap().extend(steps);
    self
  }

  pub fn script_recv(self, steps: impl IntoIterator<Item = Result<Msg, ReliqError>>) -> Self {
    self.state.recv_script.lock().unwrap().extend(steps);
    self
  }

  pub fn send_attempts(&self) -> u32 {
    self.state.send_attempts.load(Ordering::SeqCst)
  }

  pub fn recv_attempts(&self) -> u32 {
    self.state.recv_attempts.load(Ordering::SeqCst)
  }

  pub fn created_roles(&self) -> Vec<SocketRole> {
    self.state.created_roles.lock().unwrap().clone()
  }
}

pub struct MockSocket {
  state: Arc<MockState>,
  role: SocketRole,
}

#[async_trait]
impl Transport for MockTransport {
  type Socket = MockSocket;

  async fn socket(&self, role: SocketRole) -> Result<MockSocket, ReliqError> {
    self.state.created_roles.lock().unwrap().push(role);
    Ok(MockSocket {
      state: Arc::clone(&self.state),
      role,
    })
  }
}

#[async_trait]
impl TransportSocket for MockSocket {
  async fn connect(&self, _endpoint: &str) -> Result<(), ReliqError> {
    match self.state.connect_error.lock().unwrap().take() {
      Some(err) => Err(err),
      None => Ok(()),
    }
  }

  async fn bind(&self, _endpoint: &str) -> Result<(), ReliqError> {
    Ok(())
  }

  async fn send(&self, msg: Msg, _mode: BlockingMode) -> Result<(), ReliqError> {
    assert!(self.role.can_send(), "mock sent on a receive-only role");
    self.state.send_attempts.fetch_add(1, Ordering::SeqCst);
    let step = self.state.send_script.lock().unwrap().pop_front();
    match step {
      Some(Err(err)) => Err(err),
      Some(Ok(())) | None => {
        *self.state.last_sent.lock().unwrap() = Some(msg);
        Ok(())
      }
    }
  }

  async fn recv(&self, _mode: BlockingMode) -> Result<Msg, ReliqError> {
    assert!(self.role.can_recv(), "mock received on a send-only role");
    self.state.recv_attempts.fetch_add(1, Ordering::SeqCst);
    let step = self.state.recv_script.lock().unwrap().pop_front();
    match step {
      Some(result) => result,
      // Script exhausted: echo the last accepted payload.
      None => self
        .state
        .last_sent
        .lock()
        .unwrap()
        .clone()
        .ok_or_else(|| ReliqError::RecvFailed("nothing sent yet".into())),
    }
  }
}
