//! Periodic store snapshot polling.
//!
//! The store has no change notification, so the session identity and schedule
//! are re-read on a fixed cadence and republished through a watch channel.
//! Receivers only wake when the decoded snapshot actually changes.

use log::{debug, info};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::accessor::ScheduleStoreAccessor;
use crate::api::SessionSnapshot;

/// Polls the store and publishes [`SessionSnapshot`]s.
pub struct SessionPoller {
    accessor: ScheduleStoreAccessor,
    interval: Duration,
}

impl SessionPoller {
    pub fn new(accessor: ScheduleStoreAccessor, interval: Duration) -> Self {
        Self { accessor, interval }
    }

    /// Read once and publish if the snapshot changed.
    ///
    /// Returns `true` when subscribers were notified.
    pub async fn poll_once(&self, tx: &watch::Sender<SessionSnapshot>) -> bool {
        let snapshot = self.accessor.snapshot().await;
        publish(tx, snapshot)
    }

    /// Spawn the polling loop.
    ///
    /// The first read happens immediately. The loop ends when `shutdown`
    /// flips to `true` (or its sender is dropped); a read that completes after
    /// shutdown is not published.
    pub fn spawn(
        self,
        tx: watch::Sender<SessionSnapshot>,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Session poller started ({:?} cadence)", self.interval);
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        let snapshot = self.accessor.snapshot().await;
                        if *shutdown.borrow() {
                            break;
                        }
                        if publish(&tx, snapshot) {
                            debug!("Session snapshot changed");
                        }
                    }
                }
            }
            info!("Session poller stopped");
        })
    }
}

fn publish(tx: &watch::Sender<SessionSnapshot>, snapshot: SessionSnapshot) -> bool {
    tx.send_if_modified(|current| {
        if *current == snapshot {
            false
        } else {
            *current = snapshot;
            true
        }
    })
}
