//! Listener task for the live update channel

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::{ChannelState, ListenerContext};
use crate::error::{Error, Result};
use crate::models::StatusUpdate;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

enum PumpEnd {
    Shutdown,
    ConnectionLost,
}

pub(super) async fn run(context: ListenerContext, mut shutdown: watch::Receiver<bool>) {
    let mut attempts: u32 = 0;
    let mut backoff = Duration::from_millis(context.config.initial_backoff_ms);

    loop {
        if *shutdown.borrow() {
            context.set_state(ChannelState::Closed);
            return;
        }

        context.set_state(ChannelState::Connecting);

        let socket = tokio::select! {
            biased;
            _ = shutdown.changed() => {
                context.set_state(ChannelState::Closed);
                return;
            }
            connected = connect(&context) => match connected {
                Ok(socket) => socket,
                Err(e) => {
                    attempts += 1;
                    context.set_state(ChannelState::Disconnected);

                    if attempts >= context.config.max_reconnect_attempts {
                        tracing::error!(
                            "live update channel gave up after {attempts} attempts: {e}"
                        );
                        // reported once; the task parks in Disconnected and
                        // only an explicit shutdown moves it to Closed
                        (context.on_error)(Error::Connection { attempts });
                        return;
                    }

                    tracing::warn!(
                        "live update connection failed (attempt {attempts}): {e}, \
                         retrying in {backoff:?}"
                    );
                    tokio::select! {
                        biased;
                        _ = shutdown.changed() => {
                            context.set_state(ChannelState::Closed);
                            return;
                        }
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    backoff = next_backoff(backoff, &context.config);
                    continue;
                }
            }
        };

        tracing::info!("live update channel connected to {}", context.endpoint);
        attempts = 0;
        backoff = Duration::from_millis(context.config.initial_backoff_ms);
        context.set_state(ChannelState::Connected);

        match pump(socket, &context, &mut shutdown).await {
            PumpEnd::Shutdown => {
                context.set_state(ChannelState::Closed);
                return;
            }
            PumpEnd::ConnectionLost => {
                tracing::warn!("live update channel lost, reconnecting");
                context.set_state(ChannelState::Disconnected);
            }
        }
    }
}

/// Open the stream with a fresh bearer token.
async fn connect(context: &ListenerContext) -> Result<Socket> {
    let token = context.token.access_token().await?;

    let mut request = context
        .endpoint
        .as_str()
        .into_client_request()
        .map_err(|e| Error::Transport(format!("invalid stream endpoint: {e}")))?;

    let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| Error::Transport(format!("invalid bearer token: {e}")))?;
    request.headers_mut().insert("Authorization", bearer);

    let (socket, _response) = connect_async(request)
        .await
        .map_err(|e| Error::Transport(e.to_string()))?;
    Ok(socket)
}

/// Read frames until the connection drops or shutdown is requested.
/// Shutdown wins races against buffered inbound messages.
async fn pump(
    mut socket: Socket,
    context: &ListenerContext,
    shutdown: &mut watch::Receiver<bool>,
) -> PumpEnd {
    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => return PumpEnd::Shutdown,
            message = socket.next() => match message {
                Some(Ok(Message::Text(text))) => handle_frame(&text, context).await,
                Some(Ok(Message::Ping(payload))) => {
                    let _ = socket.send(Message::Pong(payload)).await;
                }
                Some(Ok(Message::Close(_))) => {
                    tracing::info!("live update stream closed by remote");
                    return PumpEnd::ConnectionLost;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!("live update read error: {e}");
                    return PumpEnd::ConnectionLost;
                }
                None => return PumpEnd::ConnectionLost,
            }
        }
    }
}

/// Merge one inbound frame into the snapshot and notify the subscriber.
/// Malformed frames are dropped without touching the connection state.
async fn handle_frame(text: &str, context: &ListenerContext) {
    let update: StatusUpdate = match serde_json::from_str(text) {
        Ok(update) => update,
        Err(e) => {
            tracing::warn!("dropping malformed live update: {e}");
            return;
        }
    };

    let merged = {
        let mut guard = context.status.write().await;
        match guard.as_mut() {
            Some(status) => {
                status.apply(update);
                Some(status.clone())
            }
            None => None,
        }
    };

    if let Some(status) = merged {
        (context.on_update)(status);
    }
}

fn next_backoff(current: Duration, config: &crate::config::ListenConfig) -> Duration {
    std::cmp::min(current * 2, Duration::from_millis(config.max_backoff_ms))
}
