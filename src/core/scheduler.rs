//! Background refresh driver.
//!
//! Three triggers feed the same refresh routine: the initial load, a
//! fixed-interval heartbeat, and change notifications from the store.

use super::session::{ChecklistSession, RefreshOutcome, SessionView};
use crate::errors::AppResult;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Initial,
    Heartbeat,
    StorageChange,
}

enum Wake {
    Shutdown { closed: bool },
    Change { closed: bool },
    Heartbeat,
}

async fn next_change(
    changes: &mut Option<watch::Receiver<u64>>,
) -> Result<(), watch::error::RecvError> {
    match changes {
        Some(rx) => rx.changed().await,
        None => std::future::pending().await,
    }
}

pub struct SyncScheduler {
    heartbeat: Duration,
}

impl SyncScheduler {
    pub fn new(heartbeat: Duration) -> Self {
        Self { heartbeat }
    }

    pub fn heartbeat(&self) -> Duration {
        self.heartbeat
    }

    /// Run until `shutdown` flips to true (or its sender is dropped).
    ///
    /// `on_refresh` is called after every successful refresh. A failed fetch
    /// is logged and retried on the next tick.
    pub async fn run<F>(
        &self,
        session: &mut ChecklistSession,
        mut shutdown: watch::Receiver<bool>,
        mut on_refresh: F,
    ) -> AppResult<()>
    where
        F: FnMut(Trigger, &RefreshOutcome, &SessionView),
    {
        let mut changes = session.store().subscribe();

        if *shutdown.borrow() {
            return Ok(());
        }
        Self::tick(session, Trigger::Initial, &mut on_refresh).await;

        let mut heartbeat = time::interval_at(Instant::now() + self.heartbeat, self.heartbeat);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let wake = tokio::select! {
                biased;
                res = shutdown.changed() => Wake::Shutdown { closed: res.is_err() },
                res = next_change(&mut changes) => Wake::Change { closed: res.is_err() },
                _ = heartbeat.tick() => Wake::Heartbeat,
            };

            let trigger = match wake {
                Wake::Shutdown { closed } => {
                    if closed || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                Wake::Change { closed: true } => {
                    // Store handle gone: heartbeat only from now on.
                    changes = None;
                    continue;
                }
                Wake::Change { closed: false } => Trigger::StorageChange,
                Wake::Heartbeat => Trigger::Heartbeat,
            };

            Self::tick(session, trigger, &mut on_refresh).await;
        }

        log::debug!("sync scheduler stopped");
        Ok(())
    }

    async fn tick<F>(session: &mut ChecklistSession, trigger: Trigger, on_refresh: &mut F)
    where
        F: FnMut(Trigger, &RefreshOutcome, &SessionView),
    {
        match session.refresh().await {
            Ok(outcome) => {
                log::debug!("{trigger:?} refresh: {outcome:?}");
                on_refresh(trigger, &outcome, &session.view());
            }
            Err(e) => log::warn!("{trigger:?} refresh failed, retrying on next tick: {e}"),
        }
    }
}
