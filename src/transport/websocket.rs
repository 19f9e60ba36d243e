//! WebSocket transport backed by tokio-tungstenite

use super::{Endpoint, TransportChannel, TransportStatus};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc as std_mpsc, Arc};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Commands for the background connection task
#[derive(Debug)]
enum Outbound {
    Text(String),
    Close,
}

/// WebSocket client that runs a background task for the connection.
///
/// Connects once; there is no reconnect. Messages sent before the
/// connection opens, or after it closes, are dropped.
pub struct WebSocketTransport {
    outbound_tx: mpsc::UnboundedSender<Outbound>,
    status_rx: std_mpsc::Receiver<TransportStatus>,
    open: Arc<AtomicBool>,
}

impl WebSocketTransport {
    /// Spawn the connection task on `runtime` and return immediately
    pub fn connect(endpoint: &Endpoint, runtime: &Handle) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = std_mpsc::channel();
        let open = Arc::new(AtomicBool::new(false));

        runtime.spawn(connection_task(
            endpoint.as_str().to_string(),
            outbound_rx,
            status_tx,
            Arc::clone(&open),
        ));

        Self {
            outbound_tx,
            status_rx,
            open,
        }
    }
}

impl TransportChannel for WebSocketTransport {
    fn send(&self, message: String) {
        if !self.is_open() {
            debug!("websocket not open, dropping message");
            return;
        }
        if self.outbound_tx.send(Outbound::Text(message)).is_err() {
            debug!("websocket task gone, dropping message");
        }
    }

    fn try_recv_status(&self) -> Option<TransportStatus> {
        self.status_rx.try_recv().ok()
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn close(&mut self) {
        let _ = self.outbound_tx.send(Outbound::Close);
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        let _ = self.outbound_tx.send(Outbound::Close);
    }
}

/// Background task that owns the WebSocket stream
async fn connection_task(
    url: String,
    mut outbound_rx: mpsc::UnboundedReceiver<Outbound>,
    status_tx: std_mpsc::Sender<TransportStatus>,
    open: Arc<AtomicBool>,
) {
    info!("websocket: connecting to {}", url);
    let stream = match connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            warn!("websocket: connection to {} failed: {}", url, e);
            let _ = status_tx.send(TransportStatus::Error(e.to_string()));
            let _ = status_tx.send(TransportStatus::Closed);
            return;
        }
    };

    open.store(true, Ordering::Release);
    let _ = status_tx.send(TransportStatus::Opened);
    info!("websocket: connected to {}", url);

    let (mut sink, mut stream) = stream.split();

    loop {
        tokio::select! {
            command = outbound_rx.recv() => match command {
                Some(Outbound::Text(text)) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        warn!("websocket: send failed: {}", e);
                        let _ = status_tx.send(TransportStatus::Error(e.to_string()));
                        break;
                    }
                }
                Some(Outbound::Close) | None => {
                    debug!("websocket: closing");
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    let _ = status_tx.send(TransportStatus::Message(text));
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("websocket: receive failed: {}", e);
                    let _ = status_tx.send(TransportStatus::Error(e.to_string()));
                    break;
                }
            },
        }
    }

    open.store(false, Ordering::Release);
    let _ = status_tx.send(TransportStatus::Closed);
    info!("websocket: disconnected from {}", url);
}
