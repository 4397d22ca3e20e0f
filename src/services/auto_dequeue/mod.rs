//! Automatic dequeue of teams whose skills attempt counts went up.
//!
//! A monitoring loop samples `nowServing` every second and drives a
//! [`PollingPhase`]: while at least one team is on a field, a poll loop scrapes the
//! tournament manager, diffs the counts in a [`SkillsTracker`], and removes every
//! team whose count increased from both queue lists.

pub mod skills_scraper;
pub mod tracker;

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;

use crate::{
    services::queue_service,
    state::{
        SharedState,
        polling::{LoopHandle, PollingEvent, PollingPhase, PollingTransition, spawn_loop},
    },
};

use self::{
    skills_scraper::{SkillsSource, TournamentClient},
    tracker::{SkillsTracker, TeamChange, TrackerSummary},
};

/// Default delay between two scrapes while polling.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5_000);
/// Period of the `nowServing` sampling loop.
pub const MONITOR_INTERVAL: Duration = Duration::from_secs(1);

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DequeueConfig {
    /// Tournament manager root URL.
    pub base_url: Option<String>,
    /// Delay between scrapes while polling, in milliseconds.
    pub poll_interval_ms: u64,
    /// No tournament manager available; the engine stays fully inert.
    pub offline_mode: bool,
}

impl Default for DequeueConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            offline_mode: false,
        }
    }
}

impl DequeueConfig {
    fn poll_interval(&self) -> Duration {
        if self.poll_interval_ms == 0 {
            DEFAULT_POLL_INTERVAL
        } else {
            Duration::from_millis(self.poll_interval_ms)
        }
    }
}

/// Operational snapshot served by `/api/auto-dequeue/status`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AutoDequeueStatus {
    /// The engine was started.
    pub enabled: bool,
    /// The poll loop is currently running.
    pub is_polling_active: bool,
    /// Scrapes attempted since polling last started.
    pub poll_count: u64,
    /// Configuration the engine was initialised with.
    pub config: DequeueConfig,
    /// Tracker counters.
    pub skills_state: TrackerSummary,
}

/// Skills poller and its bookkeeping, owned by the application state.
pub struct AutoDequeue {
    config: RwLock<DequeueConfig>,
    enabled: AtomicBool,
    poll_count: AtomicU64,
    tracker: Mutex<SkillsTracker>,
    phase: Mutex<PollingPhase>,
    monitor: Mutex<Option<LoopHandle>>,
}

impl Default for AutoDequeue {
    fn default() -> Self {
        Self::new()
    }
}

impl AutoDequeue {
    /// Engine in its disabled, idle state.
    pub fn new() -> Self {
        Self {
            config: RwLock::new(DequeueConfig::default()),
            enabled: AtomicBool::new(false),
            poll_count: AtomicU64::new(0),
            tracker: Mutex::new(SkillsTracker::new()),
            phase: Mutex::new(PollingPhase::Idle),
            monitor: Mutex::new(None),
        }
    }

    /// Configure the engine and start monitoring, scraping the configured tournament manager.
    ///
    /// Offline mode, a missing base URL, or an unusable HTTP client leave the engine
    /// disabled; the return value tells whether it started.
    pub async fn initialize(&self, state: &SharedState, config: DequeueConfig) -> bool {
        *self.config.write().await = config.clone();

        if config.offline_mode {
            info!("offline mode; auto-dequeue disabled");
            return false;
        }

        let Some(base_url) = config.base_url.as_deref().filter(|url| !url.trim().is_empty())
        else {
            error!("no tournament manager URL configured; auto-dequeue disabled");
            return false;
        };

        match TournamentClient::new(base_url) {
            Ok(client) => self.start(state, config, Arc::new(client)).await,
            Err(err) => {
                error!(error = %err, "failed to build tournament manager client; auto-dequeue disabled");
                false
            }
        }
    }

    /// Start monitoring with an explicit skills source.
    pub async fn start(
        &self,
        state: &SharedState,
        config: DequeueConfig,
        source: Arc<dyn SkillsSource>,
    ) -> bool {
        let mut monitor = self.monitor.lock().await;
        if monitor.is_some() {
            warn!("auto-dequeue already running; ignoring start request");
            return true;
        }

        *self.config.write().await = config.clone();
        self.tracker.lock().await.reset();
        self.enabled.store(true, Ordering::SeqCst);

        let poll_interval = config.poll_interval();
        let state = state.clone();
        *monitor = Some(spawn_loop(MONITOR_INTERVAL, move || {
            let state = state.clone();
            let source = source.clone();
            async move { monitor_tick(&state, source, poll_interval).await }
        }));

        info!(
            base_url = ?config.base_url,
            poll_interval_ms = poll_interval.as_millis() as u64,
            "auto-dequeue monitoring started"
        );
        true
    }

    /// Current engine state for operational visibility.
    pub async fn status(&self) -> AutoDequeueStatus {
        AutoDequeueStatus {
            enabled: self.enabled.load(Ordering::SeqCst),
            is_polling_active: self.phase.lock().await.is_polling(),
            poll_count: self.poll_count.load(Ordering::SeqCst),
            config: self.config.read().await.clone(),
            skills_state: self.tracker.lock().await.summary(),
        }
    }

    /// Stop both loops, letting an in-flight poll cycle finish.
    pub async fn shutdown(&self) {
        let monitor = self.monitor.lock().await.take();
        if let Some(monitor) = monitor {
            monitor.stop().await;
        }

        let polling = self.phase.lock().await.stop().ok();
        if let Some(polling) = polling {
            polling.stop().await;
        }

        info!(
            polls = self.poll_count.load(Ordering::SeqCst),
            "auto-dequeue shut down"
        );
    }
}

/// One sample of the monitoring loop: start or stop polling on `nowServing` edges.
pub async fn monitor_tick(
    state: &SharedState,
    source: Arc<dyn SkillsSource>,
    poll_interval: Duration,
) {
    let occupied = !state.queue().lock().await.now_serving.is_empty();
    let event = if occupied {
        PollingEvent::NowServingOccupied
    } else {
        PollingEvent::NowServingEmpty
    };

    let engine = state.auto_dequeue();
    let mut phase = engine.phase.lock().await;
    let transition = phase.transition_for(event);
    match transition {
        Some(PollingTransition::Start) => {
            engine.poll_count.store(0, Ordering::SeqCst);
            let state = state.clone();
            let started = phase.start(|| {
                spawn_loop(poll_interval, move || {
                    let state = state.clone();
                    let source = source.clone();
                    async move { run_poll_cycle(&state, source.as_ref()).await }
                })
            });
            match started {
                Ok(()) => info!(
                    interval_ms = poll_interval.as_millis() as u64,
                    "skills polling started"
                ),
                Err(err) => warn!(error = %err, "skills polling start rejected"),
            }
        }
        Some(PollingTransition::Stop) => {
            let stopped = phase.stop();
            drop(phase);
            match stopped {
                Ok(handle) => {
                    handle.stop().await;
                    info!(
                        polls = engine.poll_count.load(Ordering::SeqCst),
                        "skills polling stopped"
                    );
                }
                Err(err) => warn!(error = %err, "skills polling stop rejected"),
            }
        }
        None => {}
    }
}

/// Scrape once, update the tracker, and dequeue every team whose attempts increased.
///
/// Failures are logged and recorded on the tracker; they never escape the cycle.
pub async fn run_poll_cycle(state: &SharedState, source: &dyn SkillsSource) {
    let engine = state.auto_dequeue();
    let poll = engine.poll_count.fetch_add(1, Ordering::SeqCst) + 1;

    let rows = match source.fetch_skills().await {
        Ok(rows) => rows,
        Err(err) => {
            warn!(poll, error = %err, "skills poll failed");
            engine.tracker.lock().await.mark_fetch_failed();
            return;
        }
    };

    let changes = engine.tracker.lock().await.bulk_update(&rows);
    if changes.is_empty() {
        debug!(poll, teams = rows.len(), "no skills attempts changed");
        return;
    }

    info!(poll, teams = changes.len(), "detected increased skills attempts");
    for TeamChange { team, change } in changes {
        if let Err(err) = queue_service::dequeue_team(state, &team, &change).await {
            error!(team = %team, error = %err, "failed to dequeue team");
        }
    }
}
