//! Shared application state: file-backed stores, broadcast hub, client registry and the
//! auto-dequeue engine.

pub mod hub;
pub mod polling;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::{
        models::QueueLists, queue_store::QueueStore, referee_store::RefereeStore,
        settings_store::SettingsStore, storage::StorageResult,
    },
    dto::ws::QueueSnapshot,
    services::auto_dequeue::AutoDequeue,
};

pub use self::hub::QueueHub;

/// Reference-counted handle passed to every handler and background task.
pub type SharedState = Arc<AppState>;

const HUB_CAPACITY: usize = 32;

/// Bookkeeping for a connected display/kiosk WebSocket.
#[derive(Debug, Clone)]
pub struct ClientConnection {
    /// When the socket was accepted.
    pub connected_at: DateTime<Utc>,
}

/// Central application state: the file-backed stores, the broadcast hub and the
/// auto-dequeue engine.
pub struct AppState {
    config: Arc<AppConfig>,
    queue: QueueStore,
    settings: SettingsStore,
    referee: RefereeStore,
    hub: QueueHub,
    clients: DashMap<Uuid, ClientConnection>,
    auto_dequeue: AutoDequeue,
}

impl AppState {
    /// Load every store from the configured data directory.
    pub async fn load(config: AppConfig) -> StorageResult<SharedState> {
        let queue = QueueStore::load(config.queue_path()).await?;
        let settings = SettingsStore::load(config.settings_path()).await?;
        let referee = RefereeStore::load(config.referee_path()).await?;
        Ok(Self::from_parts(config, queue, settings, referee))
    }

    /// Assemble the state from already-loaded stores.
    pub fn from_parts(
        config: AppConfig,
        queue: QueueStore,
        settings: SettingsStore,
        referee: RefereeStore,
    ) -> SharedState {
        Arc::new(Self {
            config: Arc::new(config),
            queue,
            settings,
            referee,
            hub: QueueHub::new(HUB_CAPACITY),
            clients: DashMap::new(),
            auto_dequeue: AutoDequeue::new(),
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> Arc<AppConfig> {
        self.config.clone()
    }

    /// Queue lists and their lock.
    pub fn queue(&self) -> &QueueStore {
        &self.queue
    }

    /// Registration window settings.
    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Referee violation log.
    pub fn referee(&self) -> &RefereeStore {
        &self.referee
    }

    /// Broadcast hub used by the WebSocket fan-out.
    pub fn hub(&self) -> &QueueHub {
        &self.hub
    }

    /// Registry of connected WebSocket clients keyed by their generated identifier.
    pub fn clients(&self) -> &DashMap<Uuid, ClientConnection> {
        &self.clients
    }

    /// Skills poller driving automatic dequeues.
    pub fn auto_dequeue(&self) -> &AutoDequeue {
        &self.auto_dequeue
    }

    /// Full payload sent to display clients, built around `lists`.
    pub async fn snapshot_with(&self, lists: &QueueLists) -> QueueSnapshot {
        QueueSnapshot {
            now_serving: lists.now_serving.clone(),
            queue: lists.queue.clone(),
            violations: self.referee.violations().await,
            queue_settings: self.settings.get().await,
        }
    }

    /// Push `lists` (plus violations and settings) to every connected client.
    ///
    /// Callers holding the queue guard pass the guarded lists so the broadcast
    /// reflects exactly what was persisted.
    pub async fn broadcast_queue(&self, lists: &QueueLists) {
        let snapshot = self.snapshot_with(lists).await;
        match serde_json::to_string(&snapshot) {
            Ok(payload) => {
                let reached = self.hub.broadcast(payload);
                debug!(clients = reached, "broadcasted queue data");
            }
            Err(err) => warn!(error = %err, "failed to serialize queue snapshot"),
        }
    }

    /// Broadcast the current queue after a change that did not touch the lists.
    ///
    /// The queue guard is held until the payload is sent so this broadcast cannot carry
    /// older lists than a queue mutation that finished before it.
    pub async fn broadcast_current(&self) {
        let lists = self.queue.lock().await;
        self.broadcast_queue(&lists).await;
    }
}
