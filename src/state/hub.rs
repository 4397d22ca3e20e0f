use tokio::sync::broadcast;

/// Fan-out channel carrying serialized queue snapshots to WebSocket clients.
pub struct QueueHub {
    sender: broadcast::Sender<String>,
}

impl QueueHub {
    /// Construct a hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent payloads.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.sender.subscribe()
    }

    /// Send a payload to all current subscribers, returning how many were reached.
    pub fn broadcast(&self, payload: String) -> usize {
        self.sender.send(payload).unwrap_or(0)
    }
}
