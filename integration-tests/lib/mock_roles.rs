use async_channel::{Receiver, Sender};
use futures_util::{SinkExt, StreamExt};
use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::net::TcpListener;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{info, warn};

/// One scripted action of the mock backend, applied to the current client.
#[derive(Debug, Clone)]
pub enum BackendStep {
    Text(String),
    Binary(Vec<u8>),
    /// Sends a close frame and waits for the next client.
    Close,
}

/// WebSocket server standing in for the telemetry backend.
///
/// Accepts one client at a time and plays the steps pushed through the sender returned by
/// [`MockBackend::start`]. Steps queued while no client is connected are played to the next one.
pub struct MockBackend {
    listening_address: SocketAddr,
}

#[derive(Clone)]
pub struct MockBackendHandle {
    pub address: SocketAddr,
    accepted: Arc<AtomicUsize>,
    steps: Sender<BackendStep>,
}

impl MockBackendHandle {
    pub fn url(&self) -> String {
        format!("ws://{}/ws/data", self.address)
    }

    /// Number of WebSocket handshakes completed so far.
    pub fn accepted_connections(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    pub async fn send_text(&self, text: impl Into<String>) {
        self.steps
            .send(BackendStep::Text(text.into()))
            .await
            .expect("MockBackend task stopped");
    }

    pub async fn send_binary(&self, bytes: Vec<u8>) {
        self.steps
            .send(BackendStep::Binary(bytes))
            .await
            .expect("MockBackend task stopped");
    }

    pub async fn close_client(&self) {
        self.steps
            .send(BackendStep::Close)
            .await
            .expect("MockBackend task stopped");
    }

    /// Waits until at least `count` clients have connected, panicking after `timeout`.
    pub async fn wait_for_connections(&self, count: usize, timeout: Duration) {
        tokio::time::timeout(timeout, async {
            while self.accepted_connections() < count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| {
            panic!(
                "MockBackend: expected {count} connections, saw {}",
                self.accepted_connections()
            )
        });
    }
}

impl MockBackend {
    pub fn new(listening_address: SocketAddr) -> Self {
        Self { listening_address }
    }

    pub async fn start(self) -> MockBackendHandle {
        let listener = TcpListener::bind(self.listening_address)
            .await
            .expect("MockBackend: failed to bind");
        let address = listener.local_addr().expect("MockBackend: no local address");
        let accepted = Arc::new(AtomicUsize::new(0));
        let (steps_sender, steps_receiver) = async_channel::unbounded::<BackendStep>();

        let accepted_cl = accepted.clone();
        tokio::spawn(async move {
            while let Ok((stream, peer)) = listener.accept().await {
                let ws = match accept_async(stream).await {
                    Ok(ws) => ws,
                    Err(e) => {
                        warn!("MockBackend: handshake with {peer} failed: {e}");
                        continue;
                    }
                };
                accepted_cl.fetch_add(1, Ordering::SeqCst);
                info!("MockBackend: client {peer} connected");
                if !serve_client(ws, &steps_receiver).await {
                    break;
                }
            }
        });

        MockBackendHandle {
            address,
            accepted,
            steps: steps_sender,
        }
    }
}

// Returns false once the step sender is gone.
async fn serve_client<S>(
    mut ws: tokio_tungstenite::WebSocketStream<S>,
    steps: &Receiver<BackendStep>,
) -> bool
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            step = steps.recv() => match step {
                Ok(BackendStep::Text(text)) => {
                    if ws.send(Message::text(text)).await.is_err() {
                        return true;
                    }
                }
                Ok(BackendStep::Binary(bytes)) => {
                    if ws.send(Message::binary(bytes)).await.is_err() {
                        return true;
                    }
                }
                Ok(BackendStep::Close) => {
                    info!("MockBackend: closing client");
                    let _ = ws.close(None).await;
                    return true;
                }
                Err(_) => return false,
            },
            incoming = ws.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                    info!("MockBackend: client disconnected");
                    return true;
                }
                Some(Ok(msg)) => info!("MockBackend: unexpected client message {msg:?}"),
            },
        }
    }
}
