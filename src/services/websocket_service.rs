use std::time::Duration;

use axum::{
    body::Bytes,
    extract::ws::{Message, WebSocket},
};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use tokio::{
    sync::{broadcast::error::RecvError, mpsc},
    task::JoinHandle,
    time::{Instant, interval_at},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::state::{ClientConnection, SharedState};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Serve one display/kiosk client: initial snapshot, then every broadcast until it leaves.
///
/// Clients are pinged every [`HEARTBEAT_INTERVAL`]; one that has not answered the previous
/// ping by the next heartbeat is dropped.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let id = Uuid::new_v4();
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    // Subscribe before the initial snapshot so no change slips in between.
    let mut updates = state.hub().subscribe();

    state.clients().insert(
        id,
        ClientConnection {
            connected_at: Utc::now(),
        },
    );
    info!(%id, clients = state.clients().len(), "websocket client connected");

    if send_snapshot(&state, &outbound_tx).await.is_err() {
        disconnect(&state, id, writer_task, outbound_tx).await;
        return;
    }

    let mut heartbeat = interval_at(Instant::now() + HEARTBEAT_INTERVAL, HEARTBEAT_INTERVAL);
    let mut alive = true;

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(payload) => {
                    if outbound_tx.send(Message::Text(payload.into())).is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(%id, skipped, "client lagged behind broadcasts; resending snapshot");
                    if send_snapshot(&state, &outbound_tx).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Closed) => break,
            },
            _ = heartbeat.tick() => {
                if !alive {
                    info!(%id, "terminating inactive websocket connection");
                    break;
                }
                alive = false;
                if outbound_tx.send(Message::Ping(Bytes::new())).is_err() {
                    break;
                }
            }
            inbound = receiver.next() => match inbound {
                Some(Ok(Message::Pong(_))) => alive = true,
                Some(Ok(Message::Ping(payload))) => {
                    let _ = outbound_tx.send(Message::Pong(payload));
                }
                Some(Ok(Message::Close(frame))) => {
                    let _ = outbound_tx.send(Message::Close(frame));
                    break;
                }
                Some(Ok(Message::Text(text))) => {
                    debug!(%id, payload = %text.as_str(), "ignoring inbound websocket message");
                }
                Some(Ok(Message::Binary(_))) => {}
                Some(Err(err)) => {
                    warn!(%id, error = %err, "websocket error");
                    break;
                }
                None => break,
            },
        }
    }

    disconnect(&state, id, writer_task, outbound_tx).await;
}

async fn send_snapshot(
    state: &SharedState,
    outbound_tx: &mpsc::UnboundedSender<Message>,
) -> Result<(), ()> {
    let lists = state.queue().snapshot().await;
    let snapshot = state.snapshot_with(&lists).await;
    let payload = serde_json::to_string(&snapshot).map_err(|err| {
        warn!(error = %err, "failed to serialize queue snapshot");
    })?;
    outbound_tx
        .send(Message::Text(payload.into()))
        .map_err(|_| ())
}

async fn disconnect(
    state: &SharedState,
    id: Uuid,
    writer_task: JoinHandle<()>,
    outbound_tx: mpsc::UnboundedSender<Message>,
) {
    let connected_secs = state
        .clients()
        .remove(&id)
        .map(|(_, client)| (Utc::now() - client.connected_at).num_seconds());
    info!(
        %id,
        connected_secs,
        remaining = state.clients().len(),
        "websocket client disconnected"
    );
    drop(outbound_tx);
    let _ = writer_task.await;
}
