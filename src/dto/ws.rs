use serde::Serialize;
use utoipa::ToSchema;

use crate::dao::models::{QueueEntry, QueueSettings, Violation};

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Full state pushed to display and kiosk clients on connect and after every change.
pub struct QueueSnapshot {
    pub now_serving: Vec<QueueEntry>,
    pub queue: Vec<QueueEntry>,
    pub violations: Vec<Violation>,
    pub queue_settings: QueueSettings,
}
