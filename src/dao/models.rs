use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Team identifier as displayed by the tournament manager (e.g. `"502A"`).
pub type TeamId = String;

/// Single team waiting in the queue or occupying a field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct QueueEntry {
    /// Team number.
    pub number: TeamId,
    /// When the team was first called to a field.
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
    /// Field the team was sent to, when the operator picked one.
    #[serde(default)]
    pub field: Option<u32>,
}

impl QueueEntry {
    /// Fresh entry for a team that just registered at the kiosk.
    pub fn waiting(number: impl Into<TeamId>) -> Self {
        Self {
            number: number.into(),
            at: None,
            field: None,
        }
    }
}

/// Which lists a team was removed from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Removal {
    /// The team was occupying a field.
    pub now_serving: bool,
    /// The team was waiting in line.
    pub queue: bool,
}

impl Removal {
    /// True when the team was found in at least one list.
    pub fn any(&self) -> bool {
        self.now_serving || self.queue
    }
}

/// Persisted shape of `queue_data.json`.
///
/// A team number appears at most once across both lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueueLists {
    /// Teams currently running on a field.
    #[serde(default)]
    pub now_serving: Vec<QueueEntry>,
    /// Teams waiting, in call order.
    #[serde(default)]
    pub queue: Vec<QueueEntry>,
}

impl QueueLists {
    /// Whether the team is serving or waiting.
    pub fn contains(&self, team: &str) -> bool {
        self.now_serving.iter().any(|entry| entry.number == team)
            || self.queue.iter().any(|entry| entry.number == team)
    }

    /// Drop the team from both lists, reporting where it was found.
    pub fn remove_team(&mut self, team: &str) -> Removal {
        let serving_before = self.now_serving.len();
        let queue_before = self.queue.len();
        self.now_serving.retain(|entry| entry.number != team);
        self.queue.retain(|entry| entry.number != team);
        Removal {
            now_serving: self.now_serving.len() != serving_before,
            queue: self.queue.len() != queue_before,
        }
    }

    /// Sizes consumed by the capacity calculator.
    pub fn sizes(&self) -> QueueSizes {
        QueueSizes {
            now_serving: self.now_serving.len(),
            queue: self.queue.len(),
        }
    }
}

/// Occupancy of the two queue lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueSizes {
    /// Number of teams on a field.
    pub now_serving: usize,
    /// Number of teams waiting.
    pub queue: usize,
}

impl QueueSizes {
    /// Combined occupancy counted against capacity.
    pub fn total(&self) -> usize {
        self.now_serving + self.queue
    }
}

/// Registration window configuration persisted in `queue_settings.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct QueueSettings {
    /// Registration deadline, `M/D h:mm AM|PM` in server-local time.
    pub skills_cutoff_time: String,
    /// Estimated minutes one team occupies one field.
    pub skills_turnover_time: u32,
    /// Operator override keeping registration open.
    pub skills_queue_manually_open: bool,
    /// Sticky flag set once the queue filled up or the cutoff passed.
    pub skills_queue_closed: bool,
    /// Number of skills fields running in parallel.
    pub number_of_fields: u32,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            skills_cutoff_time: "12:00 PM".into(),
            skills_turnover_time: 5,
            skills_queue_manually_open: false,
            skills_queue_closed: false,
            number_of_fields: 4,
        }
    }
}

/// Partial settings update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    /// New cutoff string.
    pub skills_cutoff_time: Option<String>,
    /// New turnover estimate.
    pub skills_turnover_time: Option<u32>,
    /// New manual override value.
    pub skills_queue_manually_open: Option<bool>,
    /// New closed flag.
    pub skills_queue_closed: Option<bool>,
    /// New field count.
    pub number_of_fields: Option<u32>,
}

impl QueueSettings {
    /// Shallow-merge a patch into these settings.
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(cutoff) = patch.skills_cutoff_time {
            self.skills_cutoff_time = cutoff;
        }
        if let Some(turnover) = patch.skills_turnover_time {
            self.skills_turnover_time = turnover;
        }
        if let Some(open) = patch.skills_queue_manually_open {
            self.skills_queue_manually_open = open;
        }
        if let Some(closed) = patch.skills_queue_closed {
            self.skills_queue_closed = closed;
        }
        if let Some(fields) = patch.number_of_fields {
            self.number_of_fields = fields;
        }
    }
}

/// Rule violation logged by a referee.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// Offending team.
    pub number: TeamId,
    /// Game manual rule identifier (e.g. `"SG3"`).
    pub rule_id: String,
    /// Free-form severity label (`minor`, `major`, ...).
    pub severity: String,
}

/// Persisted shape of `referee_data.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefereeLog {
    /// Logged violations.
    #[serde(default)]
    pub violations: Vec<Violation>,
}

/// Roster row from the tournament manager or the offline roster file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct TeamInfo {
    /// Team number.
    pub number: TeamId,
    /// School or club the team belongs to.
    pub organization: String,
}
