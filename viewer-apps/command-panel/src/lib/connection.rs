//! ## Connection Manager
//!
//! Owns the single WebSocket link with the backend.
//!
//! The link is driven by one task running `connect → read → close → wait → connect` in
//! sequence, so at most one connection is ever live. Every close, whether clean, caused by a
//! transport error or by a failed connection attempt, is reported as
//! [`ConnectionEvent::Closed`] and followed by a fixed reconnect delay. There is no backoff
//! and no retry limit.
//!
//! Cancelling the manager's token closes the live socket once and also cancels a pending
//! reconnect, so nothing reconnects after teardown.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use apollo_apps::task_manager::TaskManager;
use async_channel::Sender;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Upper bound on the close handshake during teardown.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Lifecycle and data events forwarded to the panel's main loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// The WebSocket handshake completed.
    Opened,
    /// A text frame arrived.
    Text(String),
    /// A binary frame arrived.
    Binary(Vec<u8>),
    /// The link is down; the next attempt starts after `retry_in`.
    Closed { reason: String, retry_in: Duration },
}

enum LinkOutcome {
    /// The backend or the transport ended the connection.
    Lost(String),
    /// The manager was cancelled or the main loop went away.
    TornDown,
}

/// Single persistent connection to the backend, with unconditional reconnect.
#[derive(Clone)]
pub struct ConnectionManager {
    url: String,
    reconnect_delay: Duration,
    event_sender: Sender<ConnectionEvent>,
    cancellation_token: CancellationToken,
    attempts: Arc<AtomicU64>,
}

#[cfg_attr(not(test), hotpath::measure_all)]
impl ConnectionManager {
    /// Creates a manager for `url`. Nothing connects until [`Self::start`] or [`Self::run`].
    pub fn new(
        url: impl Into<String>,
        reconnect_delay: Duration,
        event_sender: Sender<ConnectionEvent>,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            url: url.into(),
            reconnect_delay,
            event_sender,
            cancellation_token,
            attempts: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of connection attempts made so far.
    pub fn connection_attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }

    /// Closes the live connection, if any, and stops reconnecting.
    pub fn shutdown(&self) {
        if !self.cancellation_token.is_cancelled() {
            info!("Connection manager shutdown requested");
            self.cancellation_token.cancel();
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }

    /// Spawns [`Self::run`] on the task manager.
    pub fn start(&self, task_manager: &TaskManager) {
        task_manager.spawn(self.clone().run());
    }

    /// Connect/reconnect loop. Returns once the manager is shut down.
    pub async fn run(self) {
        info!("Connecting to backend at {}", self.url);

        loop {
            if self.cancellation_token.is_cancelled() {
                break;
            }
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            debug!("Connection attempt {attempt} to {}", self.url);

            let reason = tokio::select! {
                _ = self.cancellation_token.cancelled() => break,
                result = tokio_tungstenite::connect_async(self.url.as_str()) => match result {
                    Ok((stream, _response)) => {
                        info!("Link with backend established ({})", self.url);
                        if self.event_sender.send(ConnectionEvent::Opened).await.is_err() {
                            break;
                        }
                        match self.pump(stream).await {
                            LinkOutcome::Lost(reason) => reason,
                            LinkOutcome::TornDown => break,
                        }
                    }
                    Err(e) => format!("connection attempt failed: {e}"),
                },
            };

            warn!(
                "Link with backend lost ({reason}), reconnecting in {:?}",
                self.reconnect_delay
            );
            let closed = ConnectionEvent::Closed {
                reason,
                retry_in: self.reconnect_delay,
            };
            if self.event_sender.send(closed).await.is_err() {
                break;
            }

            tokio::select! {
                _ = self.cancellation_token.cancelled() => break,
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }

        info!("Connection manager stopped");
    }

    // Forwards frames until the link drops or the manager is cancelled.
    async fn pump(&self, stream: WebSocketStream<MaybeTlsStream<TcpStream>>) -> LinkOutcome {
        let (mut write, mut read) = stream.split();

        loop {
            let event = tokio::select! {
                _ = self.cancellation_token.cancelled() => {
                    debug!("Closing backend connection");
                    match tokio::time::timeout(CLOSE_TIMEOUT, write.close()).await {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => debug!("Close handshake failed: {e}"),
                        Err(_) => debug!("Close handshake timed out"),
                    }
                    return LinkOutcome::TornDown;
                }
                message = read.next() => match message {
                    Some(Ok(Message::Text(text))) => ConnectionEvent::Text(text.to_string()),
                    Some(Ok(Message::Binary(bytes))) => ConnectionEvent::Binary(bytes.to_vec()),
                    Some(Ok(Message::Close(frame))) => {
                        let reason = match frame {
                            Some(frame) => format!("closed by backend: {} {}", frame.code, frame.reason),
                            None => "closed by backend".to_string(),
                        };
                        return LinkOutcome::Lost(reason);
                    }
                    // Ping/pong are answered by tungstenite
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return LinkOutcome::Lost(e.to_string()),
                    None => return LinkOutcome::Lost("stream ended".to_string()),
                },
            };

            if self.event_sender.send(event).await.is_err() {
                let _ = tokio::time::timeout(CLOSE_TIMEOUT, write.close()).await;
                return LinkOutcome::TornDown;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_channel::unbounded;
    use tokio::net::TcpListener;

    async fn unused_local_url() -> String {
        // Bind and drop so the port is very likely closed.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("ws://{addr}/ws/data")
    }

    #[tokio::test]
    async fn test_failed_attempt_reports_close_with_retry_delay() {
        let (tx, rx) = unbounded();
        let token = CancellationToken::new();
        let manager = ConnectionManager::new(
            unused_local_url().await,
            Duration::from_secs(5),
            tx,
            token.clone(),
        );
        let handle = tokio::spawn(manager.clone().run());

        match rx.recv().await.unwrap() {
            ConnectionEvent::Closed { retry_in, .. } => {
                assert_eq!(retry_in, Duration::from_secs(5))
            }
            other => panic!("unexpected event {other:?}"),
        }

        // The reconnect is pending; teardown must cancel it.
        manager.shutdown();
        handle.await.unwrap();
        assert_eq!(manager.connection_attempts(), 1);
        assert!(manager.is_shut_down());
    }

    #[tokio::test]
    async fn test_retries_without_limit() {
        let (tx, rx) = unbounded();
        let token = CancellationToken::new();
        let manager = ConnectionManager::new(
            unused_local_url().await,
            Duration::from_millis(10),
            tx,
            token.clone(),
        );
        let handle = tokio::spawn(manager.clone().run());

        for _ in 0..4 {
            assert!(matches!(
                rx.recv().await.unwrap(),
                ConnectionEvent::Closed { .. }
            ));
        }
        token.cancel();
        handle.await.unwrap();
        assert!(manager.connection_attempts() >= 4);
    }

    #[tokio::test]
    async fn test_next_attempt_waits_for_reconnect_delay() {
        let (tx, rx) = unbounded();
        let token = CancellationToken::new();
        let delay = Duration::from_millis(400);
        let manager = ConnectionManager::new(unused_local_url().await, delay, tx, token.clone());
        let handle = tokio::spawn(manager.clone().run());

        assert!(matches!(
            rx.recv().await.unwrap(),
            ConnectionEvent::Closed { .. }
        ));
        let first_close = tokio::time::Instant::now();
        assert!(matches!(
            rx.recv().await.unwrap(),
            ConnectionEvent::Closed { .. }
        ));
        assert!(first_close.elapsed() >= delay);
        assert_eq!(manager.connection_attempts(), 2);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_before_start_never_connects() {
        let (tx, rx) = unbounded();
        let token = CancellationToken::new();
        token.cancel();
        let manager =
            ConnectionManager::new(unused_local_url().await, Duration::from_secs(5), tx, token);
        manager.clone().run().await;
        assert_eq!(manager.connection_attempts(), 0);
        assert!(rx.try_recv().is_err());
    }
}
