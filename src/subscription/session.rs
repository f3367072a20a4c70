use super::protocol::{SubscribeRequest, CONNECTION_ACK, CONNECTION_INIT};
use super::transport::{Connector, Transport, TransportError};
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on a best-effort close of a broken transport.
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("connection timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("did not receive connection ack from server, got: {received}")]
    Handshake { received: String },

    #[error("failed to encode subscribe message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("transport panicked: {0}")]
    Panicked(String),

    #[error("cancelled")]
    Cancelled,
}

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("transport panicked: {0}")]
    Panicked(String),

    #[error("close timed out after {0:?}")]
    CloseTimeout(Duration),

    #[error("session is {0}, not subscribed")]
    NotSubscribed(SessionState),

    #[error("cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Connecting,
    HandshakeSent,
    Acked,
    Subscribed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Closed => "closed",
            SessionState::Connecting => "connecting",
            SessionState::HandshakeSent => "handshake-sent",
            SessionState::Acked => "acked",
            SessionState::Subscribed => "subscribed",
        };
        f.write_str(s)
    }
}

/// A transport call that did not complete normally.
enum Interrupted {
    Panicked(String),
    Cancelled,
}

impl From<Interrupted> for ConnectError {
    fn from(i: Interrupted) -> Self {
        match i {
            Interrupted::Panicked(msg) => ConnectError::Panicked(msg),
            Interrupted::Cancelled => ConnectError::Cancelled,
        }
    }
}

impl From<Interrupted> for StreamError {
    fn from(i: Interrupted) -> Self {
        match i {
            Interrupted::Panicked(msg) => StreamError::Panicked(msg),
            Interrupted::Cancelled => StreamError::Cancelled,
        }
    }
}

/// Run a transport call so that a panic inside it, or cancellation of the
/// run, comes back as an ordinary value.
async fn guarded<F: Future>(fut: F, cancel: &CancellationToken) -> Result<F::Output, Interrupted> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Interrupted::Cancelled),
        result = AssertUnwindSafe(fut).catch_unwind() => result.map_err(|p| Interrupted::Panicked(panic_message(p))),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// One live subscription: connect, handshake, subscribe, then read frames
/// until the transport fails.
///
/// A session is never reused after a failure; the supervisor opens a new one.
pub struct Session {
    transport: Option<Box<dyn Transport>>,
    state: SessionState,
}

impl Session {
    /// Connect, perform the `connection_init`/`connection_ack` handshake and
    /// send the subscribe envelope for `request`.
    pub async fn open(
        connector: &dyn Connector,
        request: &SubscribeRequest,
        cancel: &CancellationToken,
    ) -> Result<Self, ConnectError> {
        let subscribe = request.encode()?;

        let mut session = Self {
            transport: None,
            state: SessionState::Connecting,
        };

        let connected = guarded(tokio::time::timeout(CONNECT_TIMEOUT, connector.connect()), cancel)
            .await?
            .map_err(|_| ConnectError::Timeout(CONNECT_TIMEOUT))?;
        session.transport = Some(connected?);

        if let Err(e) = session.subscribe(subscribe, cancel).await {
            let _ = session.close().await;
            return Err(e);
        }

        Ok(session)
    }

    async fn subscribe(&mut self, subscribe: String, cancel: &CancellationToken) -> Result<(), ConnectError> {
        let transport = self
            .transport
            .as_mut()
            .ok_or(ConnectError::Transport(TransportError::Closed(None)))?;

        guarded(transport.send_text(CONNECTION_INIT.to_string()), cancel).await??;
        self.state = SessionState::HandshakeSent;

        let ack = guarded(transport.recv(), cancel).await??;
        if ack != CONNECTION_ACK {
            return Err(ConnectError::Handshake {
                received: String::from_utf8_lossy(&ack).into_owned(),
            });
        }
        self.state = SessionState::Acked;

        guarded(transport.send_text(subscribe), cancel).await??;
        self.state = SessionState::Subscribed;

        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Next inbound frame, verbatim.
    pub async fn read(&mut self, cancel: &CancellationToken) -> Result<Vec<u8>, StreamError> {
        if self.state != SessionState::Subscribed {
            return Err(StreamError::NotSubscribed(self.state));
        }

        let transport = self
            .transport
            .as_mut()
            .ok_or(StreamError::NotSubscribed(self.state))?;

        let frame = guarded(transport.recv(), cancel).await??;
        Ok(frame)
    }

    /// Close the underlying transport. Safe to call more than once and on a
    /// transport that is already broken; a close that hangs is abandoned
    /// after [`CLOSE_TIMEOUT`].
    pub async fn close(&mut self) -> Result<(), StreamError> {
        self.state = SessionState::Closed;

        let Some(mut transport) = self.transport.take() else {
            return Ok(());
        };

        let closing = AssertUnwindSafe(transport.close()).catch_unwind();
        match tokio::time::timeout(CLOSE_TIMEOUT, closing).await {
            Ok(Ok(result)) => result.map_err(StreamError::from),
            Ok(Err(payload)) => Err(StreamError::Panicked(panic_message(payload))),
            Err(_) => Err(StreamError::CloseTimeout(CLOSE_TIMEOUT)),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("state", &self.state).finish()
    }
}
