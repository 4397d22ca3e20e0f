//! Queue mutations shared by the HTTP handlers and the auto-dequeue engine.
//!
//! Every mutation holds the queue guard across read, modify, persist and broadcast so
//! concurrent callers never interleave on `nowServing`/`queue`. Operator actions only
//! change the lists once the write succeeded; automatic dequeues keep the removal in
//! memory even when the write fails.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::{
    dao::models::{QueueEntry, QueueLists, QueueSettings, Removal, SettingsPatch},
    error::ServiceError,
    services::{
        auto_dequeue::tracker::SkillsChange,
        capacity::{self, CapacityDecision},
    },
    state::SharedState,
};

async fn close_permanently(state: &SharedState, decision: &CapacityDecision) {
    let patch = SettingsPatch {
        skills_queue_closed: Some(true),
        ..SettingsPatch::default()
    };
    match state.settings().update(patch).await {
        Ok(_) => info!(reason = ?decision.reason, "skills queue permanently closed"),
        Err(err) => warn!(error = %err, "failed to persist permanent queue close"),
    }
}

/// Register a team at the back of the line if registration is open.
pub async fn add_team(state: &SharedState, team: &str) -> Result<QueueEntry, ServiceError> {
    let mut lists = state.queue().lock().await;
    let settings = state.settings().get().await;

    let decision = capacity::compute_status_now(&settings, lists.sizes());
    if decision.should_permanently_close {
        close_permanently(state, &decision).await;
    }
    if !decision.is_open {
        debug!(team, reason = ?decision.reason, "registration refused");
        return Err(ServiceError::QueueClosed {
            reason: decision.reason.as_str().into(),
        });
    }

    if lists.contains(team) {
        return Err(ServiceError::AlreadyQueued(team.into()));
    }

    let entry = QueueEntry::waiting(team);
    lists.update(|lists| lists.queue.push(entry.clone())).await?;

    let after = capacity::compute_status_now(&settings, lists.sizes());
    if after.should_permanently_close {
        close_permanently(state, &after).await;
    }

    info!(team, waiting = lists.queue.len(), "team added to queue");
    state.broadcast_queue(&lists).await;
    Ok(entry)
}

/// Move the head of the line onto a field.
pub async fn serve_next(
    state: &SharedState,
    field: Option<u32>,
) -> Result<QueueEntry, ServiceError> {
    let mut lists = state.queue().lock().await;
    if lists.queue.is_empty() {
        return Err(ServiceError::InvalidState("queue is empty".into()));
    }

    let entry = lists
        .update(|lists| {
            let mut entry = lists.queue.remove(0);
            entry.at.get_or_insert_with(Utc::now);
            entry.field = field.filter(|field| *field > 0);
            lists.now_serving.push(entry.clone());
            entry
        })
        .await?;

    info!(team = %entry.number, field = ?entry.field, "team called to field");
    state.broadcast_queue(&lists).await;
    Ok(entry)
}

/// Send a served team back into the line at 1-based position `amount` (head by default).
pub async fn unserve(
    state: &SharedState,
    team: &str,
    amount: Option<usize>,
) -> Result<QueueEntry, ServiceError> {
    let mut lists = state.queue().lock().await;
    if lists.now_serving.is_empty() {
        return Err(ServiceError::InvalidState("no team is being served".into()));
    }

    let position = lists
        .now_serving
        .iter()
        .position(|entry| entry.number == team)
        .ok_or_else(|| ServiceError::NotFound(format!("team {team} is not being served")))?;

    let (entry, index) = lists
        .update(|lists| {
            let entry = lists.now_serving.remove(position);
            let index = amount.unwrap_or(0).saturating_sub(1).min(lists.queue.len());
            lists.queue.insert(index, entry.clone());
            (entry, index)
        })
        .await?;

    info!(team, index, "team sent back to queue");
    state.broadcast_queue(&lists).await;
    Ok(entry)
}

/// Drop a team from both lists. Absent teams are not an error.
pub async fn remove_team(state: &SharedState, team: &str) -> Result<Removal, ServiceError> {
    let mut lists = state.queue().lock().await;
    let removal = lists.update(|lists| lists.remove_team(team)).await?;

    info!(team, found = removal.any(), "team removed by operator");
    state.broadcast_queue(&lists).await;
    Ok(removal)
}

/// Automatic removal after the team's skills attempt counts went up.
///
/// A team that is no longer queued is a no-op: nothing is written or broadcast.
pub async fn dequeue_team(
    state: &SharedState,
    team: &str,
    change: &SkillsChange,
) -> Result<Removal, ServiceError> {
    let mut lists = state.queue().lock().await;
    let removal = lists.remove_team(team);
    if !removal.any() {
        debug!(team, "team not queued; nothing to dequeue");
        return Ok(removal);
    }

    lists.persist().await?;
    info!(
        team,
        from_now_serving = removal.now_serving,
        from_queue = removal.queue,
        autonomous_increased = change.autonomous_increased,
        driving_increased = change.driving_increased,
        previous = ?change.previous,
        current = ?change.current,
        "auto-dequeued team"
    );
    state.broadcast_queue(&lists).await;
    Ok(removal)
}

/// Current lists.
pub async fn snapshot(state: &SharedState) -> QueueLists {
    state.queue().snapshot().await
}

/// Capacity decision for the current lists and settings.
pub async fn queue_status(state: &SharedState) -> CapacityDecision {
    let sizes = state.queue().snapshot().await.sizes();
    let settings = state.settings().get().await;
    capacity::compute_status_now(&settings, sizes)
}

/// Current registration settings.
pub async fn get_settings(state: &SharedState) -> QueueSettings {
    state.settings().get().await
}

/// Merge a settings patch, persist it and notify clients.
///
/// Turning the manual override on also clears the permanent-close flag. Turning it
/// off never reopens a closed queue.
pub async fn update_settings(
    state: &SharedState,
    mut patch: SettingsPatch,
) -> Result<QueueSettings, ServiceError> {
    if patch.skills_turnover_time == Some(0) {
        return Err(ServiceError::InvalidInput("turnover time must be >= 1".into()));
    }
    if patch.number_of_fields == Some(0) {
        return Err(ServiceError::InvalidInput("number of fields must be >= 1".into()));
    }
    if patch.skills_queue_manually_open == Some(true) {
        patch.skills_queue_closed = Some(false);
    }

    let settings = state.settings().update(patch).await?;
    info!(settings = ?settings, "queue settings updated");
    state.broadcast_current().await;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            queue_store::QueueStore, referee_store::RefereeStore, settings_store::SettingsStore,
        },
        services::{auto_dequeue::tracker::AttemptCounts, capacity::CapacityReason},
        state::AppState,
    };

    fn lists_of(serving: &[&str], waiting: &[&str]) -> QueueLists {
        QueueLists {
            now_serving: serving.iter().map(|n| QueueEntry::waiting(*n)).collect(),
            queue: waiting.iter().map(|n| QueueEntry::waiting(*n)).collect(),
        }
    }

    async fn state_with(
        serving: &[&str],
        waiting: &[&str],
        settings: QueueSettings,
    ) -> (tempfile::TempDir, SharedState) {
        let dir = tempfile::tempdir().unwrap();
        let queue_path = AppConfig::with_data_dir(dir.path()).queue_path();
        let state = state_at(&dir, queue_path, lists_of(serving, waiting), settings).await;
        (dir, state)
    }

    /// State whose queue file lives at `queue_path`; settings and referee data stay in `dir`.
    async fn state_at(
        dir: &tempfile::TempDir,
        queue_path: std::path::PathBuf,
        lists: QueueLists,
        settings: QueueSettings,
    ) -> SharedState {
        let config = AppConfig::with_data_dir(dir.path());
        let queue = QueueStore::with_lists(queue_path, lists);
        let settings = SettingsStore::with_settings(config.settings_path(), settings);
        let referee = RefereeStore::load(config.referee_path()).await.unwrap();
        AppState::from_parts(config, queue, settings, referee)
    }

    fn numbers(entries: &[QueueEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.number.as_str()).collect()
    }

    fn change() -> SkillsChange {
        SkillsChange {
            autonomous_increased: false,
            driving_increased: true,
            previous: AttemptCounts {
                autonomous: 0,
                driving: 0,
            },
            current: AttemptCounts {
                autonomous: 0,
                driving: 1,
            },
        }
    }

    #[tokio::test]
    async fn add_team_appends_and_rejects_duplicates() {
        let (_dir, state) = state_with(&["1A"], &["2B"], QueueSettings::default()).await;

        let entry = add_team(&state, "3C").await.unwrap();
        assert_eq!(entry, QueueEntry::waiting("3C"));
        assert_eq!(numbers(&snapshot(&state).await.queue), vec!["2B", "3C"]);

        for team in ["1A", "2B", "3C"] {
            assert!(matches!(
                add_team(&state, team).await,
                Err(ServiceError::AlreadyQueued(_))
            ));
        }
    }

    #[tokio::test]
    async fn add_team_refused_when_permanently_closed() {
        let settings = QueueSettings {
            skills_queue_closed: true,
            ..QueueSettings::default()
        };
        let (_dir, state) = state_with(&[], &[], settings).await;

        let err = add_team(&state, "1A").await.unwrap_err();
        assert!(matches!(err, ServiceError::QueueClosed { ref reason } if reason == "permanently_closed"));
        assert!(snapshot(&state).await.queue.is_empty());
    }

    #[tokio::test]
    async fn add_team_past_cutoff_closes_queue_for_good() {
        let settings = QueueSettings {
            skills_cutoff_time: "1/1 12:00 AM".into(),
            ..QueueSettings::default()
        };
        let (_dir, state) = state_with(&[], &[], settings).await;

        let err = add_team(&state, "1A").await.unwrap_err();
        assert!(matches!(err, ServiceError::QueueClosed { ref reason } if reason == "past_cutoff"));
        assert!(get_settings(&state).await.skills_queue_closed);

        let status = queue_status(&state).await;
        assert_eq!(status.reason, CapacityReason::PermanentlyClosed);
    }

    #[tokio::test]
    async fn manual_open_admits_even_when_closed() {
        let settings = QueueSettings {
            skills_queue_manually_open: true,
            skills_queue_closed: true,
            ..QueueSettings::default()
        };
        let (_dir, state) = state_with(&[], &[], settings).await;

        assert!(add_team(&state, "1A").await.is_ok());
    }

    #[tokio::test]
    async fn serve_next_stamps_time_and_field() {
        let (_dir, state) = state_with(&[], &["1A", "2B"], QueueSettings::default()).await;

        let served = serve_next(&state, Some(2)).await.unwrap();
        assert_eq!(served.number, "1A");
        assert_eq!(served.field, Some(2));
        assert!(served.at.is_some());

        let served = serve_next(&state, Some(0)).await.unwrap();
        assert_eq!(served.field, None);

        let lists = snapshot(&state).await;
        assert_eq!(numbers(&lists.now_serving), vec!["1A", "2B"]);
        assert!(matches!(
            serve_next(&state, None).await,
            Err(ServiceError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn unserve_reinserts_at_requested_position() {
        let (_dir, state) = state_with(&["1A", "2B"], &["3C", "4D"], QueueSettings::default()).await;

        unserve(&state, "1A", None).await.unwrap();
        assert_eq!(numbers(&snapshot(&state).await.queue), vec!["1A", "3C", "4D"]);

        unserve(&state, "2B", Some(3)).await.unwrap();
        let lists = snapshot(&state).await;
        assert_eq!(numbers(&lists.queue), vec!["1A", "3C", "2B", "4D"]);
        assert!(lists.now_serving.is_empty());
    }

    #[tokio::test]
    async fn unserve_clamps_position_and_reports_errors() {
        let (_dir, state) = state_with(&["1A"], &["2B"], QueueSettings::default()).await;

        assert!(matches!(
            unserve(&state, "9Z", None).await,
            Err(ServiceError::NotFound(_))
        ));

        unserve(&state, "1A", Some(50)).await.unwrap();
        assert_eq!(numbers(&snapshot(&state).await.queue), vec!["2B", "1A"]);

        assert!(matches!(
            unserve(&state, "1A", None).await,
            Err(ServiceError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn remove_team_is_idempotent() {
        let (_dir, state) = state_with(&["1A"], &["2B"], QueueSettings::default()).await;

        assert!(remove_team(&state, "1A").await.unwrap().now_serving);
        assert!(!remove_team(&state, "1A").await.unwrap().any());
        assert_eq!(numbers(&snapshot(&state).await.queue), vec!["2B"]);
    }

    #[tokio::test]
    async fn failed_write_leaves_lists_unchanged_and_silent() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let lists = lists_of(&["1A"], &["2B"]);
        let state = state_at(
            &dir,
            blocker.join("queue_data.json"),
            lists.clone(),
            QueueSettings::default(),
        )
        .await;
        let mut receiver = state.hub().subscribe();

        for _ in 0..2 {
            assert!(matches!(
                add_team(&state, "3C").await,
                Err(ServiceError::Storage(_))
            ));
        }
        assert!(matches!(
            serve_next(&state, Some(1)).await,
            Err(ServiceError::Storage(_))
        ));
        assert!(matches!(
            unserve(&state, "1A", None).await,
            Err(ServiceError::Storage(_))
        ));
        assert!(matches!(
            remove_team(&state, "2B").await,
            Err(ServiceError::Storage(_))
        ));

        assert_eq!(snapshot(&state).await, lists);
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn dequeue_only_touches_the_list_holding_the_team() {
        let (_dir, state) =
            state_with(&["1A", "2B"], &["3C", "4D"], QueueSettings::default()).await;

        let removal = dequeue_team(&state, "3C", &change()).await.unwrap();
        assert!(removal.queue && !removal.now_serving);
        let lists = snapshot(&state).await;
        assert_eq!(numbers(&lists.now_serving), vec!["1A", "2B"]);
        assert_eq!(numbers(&lists.queue), vec!["4D"]);

        let removal = dequeue_team(&state, "2B", &change()).await.unwrap();
        assert!(removal.now_serving && !removal.queue);
        let lists = snapshot(&state).await;
        assert_eq!(numbers(&lists.now_serving), vec!["1A"]);
        assert_eq!(numbers(&lists.queue), vec!["4D"]);
    }

    #[tokio::test]
    async fn dequeue_of_absent_team_is_silent_noop() {
        let (_dir, state) = state_with(&["1A"], &["2B"], QueueSettings::default()).await;
        let mut receiver = state.hub().subscribe();

        let removal = dequeue_team(&state, "9Z", &change()).await.unwrap();
        assert!(!removal.any());
        assert_eq!(snapshot(&state).await.sizes().total(), 2);
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn manual_open_clears_closed_flag_but_closing_override_does_not_reopen() {
        let settings = QueueSettings {
            skills_queue_closed: true,
            ..QueueSettings::default()
        };
        let (_dir, state) = state_with(&[], &[], settings).await;

        let updated = update_settings(
            &state,
            SettingsPatch {
                skills_queue_manually_open: Some(false),
                ..SettingsPatch::default()
            },
        )
        .await
        .unwrap();
        assert!(updated.skills_queue_closed);

        let updated = update_settings(
            &state,
            SettingsPatch {
                skills_queue_manually_open: Some(true),
                ..SettingsPatch::default()
            },
        )
        .await
        .unwrap();
        assert!(updated.skills_queue_manually_open);
        assert!(!updated.skills_queue_closed);
    }

    #[tokio::test]
    async fn update_settings_rejects_zero_values() {
        let (_dir, state) = state_with(&[], &[], QueueSettings::default()).await;

        for patch in [
            SettingsPatch {
                skills_turnover_time: Some(0),
                ..SettingsPatch::default()
            },
            SettingsPatch {
                number_of_fields: Some(0),
                ..SettingsPatch::default()
            },
        ] {
            assert!(matches!(
                update_settings(&state, patch).await,
                Err(ServiceError::InvalidInput(_))
            ));
        }
        assert_eq!(get_settings(&state).await, QueueSettings::default());
    }
}
