//! Last-known skills attempt counts per team, with increase detection.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;

use crate::dao::models::TeamId;

/// One scraped row of the skills table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamSkills {
    /// Team number.
    pub team: TeamId,
    /// Autonomous skills attempts.
    pub autonomous: i64,
    /// Driving skills attempts.
    pub driving: i64,
}

/// Stored attempt counts for a team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamSkillsRecord {
    /// Autonomous skills attempts.
    pub autonomous: i64,
    /// Driving skills attempts.
    pub driving: i64,
    /// Last time either count increased (or the team was first seen).
    pub last_updated_at: DateTime<Utc>,
}

/// Pair of attempt counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttemptCounts {
    /// Autonomous skills attempts.
    pub autonomous: i64,
    /// Driving skills attempts.
    pub driving: i64,
}

/// Increase detected for a team between two scrapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillsChange {
    /// Autonomous count went up.
    pub autonomous_increased: bool,
    /// Driving count went up.
    pub driving_increased: bool,
    /// Counts before this scrape.
    pub previous: AttemptCounts,
    /// Counts reported by this scrape.
    pub current: AttemptCounts,
}

/// A [`SkillsChange`] attributed to its team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamChange {
    /// Team whose counts increased.
    pub team: TeamId,
    /// What changed.
    pub change: SkillsChange,
}

/// Summary exposed on the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackerSummary {
    /// Number of teams seen so far.
    pub teams_tracked: usize,
    /// When the last scrape finished, successfully or not.
    pub last_fetch_timestamp: Option<DateTime<Utc>>,
    /// Outcome of the last scrape.
    pub last_fetch_success: bool,
}

/// In-memory attempt table. Records are never removed except by [`SkillsTracker::reset`].
#[derive(Debug, Default)]
pub struct SkillsTracker {
    teams: IndexMap<TeamId, TeamSkillsRecord>,
    last_fetch_timestamp: Option<DateTime<Utc>>,
    last_fetch_success: bool,
}

impl SkillsTracker {
    /// Empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record counts for a team, returning a change when either count increased.
    ///
    /// The first sighting of a team only seeds the table. Equal or lower counts are
    /// ignored and leave the stored record as is.
    pub fn update(&mut self, team: &str, autonomous: i64, driving: i64) -> Option<SkillsChange> {
        let now = Utc::now();

        if !self.teams.contains_key(team) {
            self.teams.insert(
                team.to_string(),
                TeamSkillsRecord {
                    autonomous,
                    driving,
                    last_updated_at: now,
                },
            );
            return None;
        }

        let stored = self.teams.get_mut(team)?;

        let autonomous_increased = stored.autonomous < autonomous;
        let driving_increased = stored.driving < driving;
        if !autonomous_increased && !driving_increased {
            return None;
        }

        let previous = AttemptCounts {
            autonomous: stored.autonomous,
            driving: stored.driving,
        };
        *stored = TeamSkillsRecord {
            autonomous,
            driving,
            last_updated_at: now,
        };

        Some(SkillsChange {
            autonomous_increased,
            driving_increased,
            previous,
            current: AttemptCounts {
                autonomous,
                driving,
            },
        })
    }

    /// Apply a whole successful scrape, returning the increases in input order.
    pub fn bulk_update(&mut self, rows: &[TeamSkills]) -> Vec<TeamChange> {
        let changes = rows
            .iter()
            .filter_map(|row| {
                self.update(&row.team, row.autonomous, row.driving)
                    .map(|change| TeamChange {
                        team: row.team.clone(),
                        change,
                    })
            })
            .collect();

        self.last_fetch_timestamp = Some(Utc::now());
        self.last_fetch_success = true;
        changes
    }

    /// Record a failed scrape without touching team records.
    pub fn mark_fetch_failed(&mut self) {
        self.last_fetch_success = false;
        self.last_fetch_timestamp = Some(Utc::now());
    }

    /// Forget every team and the fetch metadata.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Stored record for a team.
    pub fn record(&self, team: &str) -> Option<&TeamSkillsRecord> {
        self.teams.get(team)
    }

    /// Counters for the status endpoint.
    pub fn summary(&self) -> TrackerSummary {
        TrackerSummary {
            teams_tracked: self.teams.len(),
            last_fetch_timestamp: self.last_fetch_timestamp,
            last_fetch_success: self.last_fetch_success,
        }
    }
}
