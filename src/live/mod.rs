//! Live update channel
//!
//! A dedicated task holds a WebSocket connection to the vendor's update
//! stream and merges every inbound status fragment into the shared
//! snapshot. Connection drops are recovered with a bounded exponential
//! backoff; only the caller can park the channel in `Closed`.

mod listener;

use std::sync::Arc;

use tokio::sync::{watch, RwLock};

use crate::config::ListenConfig;
use crate::error::Error;
use crate::models::Status;
use crate::TokenProvider;

/// State of the live update channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// No connection; either never started, between reconnect attempts, or
    /// parked after the reconnect budget ran out.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// Receiving updates.
    Connected,
    /// Shut down by the caller. Terminal.
    Closed,
}

impl std::fmt::Display for ChannelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelState::Disconnected => write!(f, "disconnected"),
            ChannelState::Connecting => write!(f, "connecting"),
            ChannelState::Connected => write!(f, "connected"),
            ChannelState::Closed => write!(f, "closed"),
        }
    }
}

pub(crate) type UpdateCallback = Arc<dyn Fn(Status) + Send + Sync>;
pub(crate) type ErrorCallback = Arc<dyn Fn(Error) + Send + Sync>;

/// Everything the listener task needs, detached from the client's lifetime.
pub(crate) struct ListenerContext {
    pub(crate) endpoint: String,
    pub(crate) token: Arc<dyn TokenProvider>,
    pub(crate) status: Arc<RwLock<Option<Status>>>,
    pub(crate) on_update: UpdateCallback,
    pub(crate) on_error: ErrorCallback,
    pub(crate) config: ListenConfig,
    pub(crate) state: Arc<watch::Sender<ChannelState>>,
}

impl ListenerContext {
    fn set_state(&self, state: ChannelState) {
        let _ = self.state.send(state);
    }
}

/// Running listener task plus its shutdown signal.
pub(crate) struct ListenerHandle {
    shutdown: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

impl ListenerHandle {
    pub(crate) fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal the task and wait for it to wind down.
    pub(crate) async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }

    /// Hard stop, for drop paths where awaiting is not possible.
    pub(crate) fn abort(self) {
        self.task.abort();
    }
}

/// Spawn the listener task for the given context.
pub(crate) fn spawn(context: ListenerContext) -> ListenerHandle {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(listener::run(context, shutdown_rx));
    ListenerHandle {
        shutdown: shutdown_tx,
        task,
    }
}

/// Convert an HTTP/HTTPS base URL to its WS/WSS counterpart.
pub(crate) fn websocket_url(url: &str) -> Option<String> {
    if let Some(rest) = url.strip_prefix("https://") {
        Some(format!("wss://{rest}"))
    } else if let Some(rest) = url.strip_prefix("http://") {
        Some(format!("ws://{rest}"))
    } else if url.starts_with("ws://") || url.starts_with("wss://") {
        Some(url.to_string())
    } else {
        None
    }
}
