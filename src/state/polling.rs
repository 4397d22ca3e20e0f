//! Two-state machine deciding whether the skills poller runs.

use std::{future::Future, time::Duration};

use thiserror::Error;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::warn;

/// Handle on a periodic background loop started by [`spawn_loop`].
#[derive(Debug)]
pub struct LoopHandle {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl LoopHandle {
    /// Ask the loop to stop and wait for it to exit.
    ///
    /// A tick that is already running is allowed to finish.
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        if let Err(err) = self.handle.await {
            warn!(error = %err, "background loop ended abnormally");
        }
    }
}

/// Run `tick` every `period`, starting immediately.
///
/// Ticks never overlap: the next one is scheduled only after the previous one
/// returned, and late ticks are delayed rather than bunched up.
pub fn spawn_loop<F, Fut>(period: Duration, mut tick: F) -> LoopHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (stop_tx, mut stop_rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *stop_rx.borrow() {
                break;
            }
            tokio::select! {
                biased;
                _ = stop_rx.changed() => break,
                _ = ticker.tick() => tick().await,
            }
        }
    });

    LoopHandle {
        stop: stop_tx,
        handle,
    }
}

/// Whether the skills poller is running.
#[derive(Debug, Default)]
pub enum PollingPhase {
    /// Nobody is on a field; no scraping.
    #[default]
    Idle,
    /// At least one team is being served; the poll loop runs.
    Polling(LoopHandle),
}

/// Observation fed to the machine by the monitoring loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollingEvent {
    /// `nowServing` has at least one team.
    NowServingOccupied,
    /// `nowServing` is empty.
    NowServingEmpty,
}

/// Transition the monitoring loop must carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollingTransition {
    /// Idle -> Polling.
    Start,
    /// Polling -> Idle.
    Stop,
}

/// Transition requested from the wrong phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PollingTransitionError {
    /// The poll loop is already running.
    #[error("polling is already active")]
    AlreadyPolling,
    /// There is no poll loop to stop.
    #[error("polling is not active")]
    NotPolling,
}

impl PollingPhase {
    /// Whether the poll loop is running.
    pub fn is_polling(&self) -> bool {
        matches!(self, PollingPhase::Polling(_))
    }

    /// Transition implied by `event`, if any.
    pub fn transition_for(&self, event: PollingEvent) -> Option<PollingTransition> {
        match (self, event) {
            (PollingPhase::Idle, PollingEvent::NowServingOccupied) => Some(PollingTransition::Start),
            (PollingPhase::Polling(_), PollingEvent::NowServingEmpty) => {
                Some(PollingTransition::Stop)
            }
            _ => None,
        }
    }

    /// Enter `Polling`, spawning the loop only when currently idle.
    pub fn start(
        &mut self,
        spawn: impl FnOnce() -> LoopHandle,
    ) -> Result<(), PollingTransitionError> {
        if self.is_polling() {
            return Err(PollingTransitionError::AlreadyPolling);
        }
        *self = PollingPhase::Polling(spawn());
        Ok(())
    }

    /// Return to `Idle`, handing back the loop so the caller can stop it.
    pub fn stop(&mut self) -> Result<LoopHandle, PollingTransitionError> {
        match std::mem::take(self) {
            PollingPhase::Polling(handle) => Ok(handle),
            PollingPhase::Idle => Err(PollingTransitionError::NotPolling),
        }
    }
}
