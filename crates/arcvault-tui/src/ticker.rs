//! Fixed-period timer driving the simulated loading progress.
//!
//! At most one ticker runs at a time. It is tied to the handler instance
//! that started it and is aborted on stop, on replacement and on drop.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use crate::action::Action;

pub struct ProgressTicker {
    period: Duration,
    running: Option<(Uuid, JoinHandle<()>)>,
}

impl ProgressTicker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            running: None,
        }
    }

    /// Start ticking for `instance`, replacing any running timer.
    pub fn start(&mut self, instance: Uuid, tx: mpsc::UnboundedSender<Action>) {
        self.stop();
        let period = self.period;
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if tx.send(Action::ProgressTick(instance)).is_err() {
                    break;
                }
            }
        });
        debug!(%instance, "Progress ticker started");
        self.running = Some((instance, handle));
    }

    /// Stop the timer if it belongs to `instance`.
    pub fn stop_for(&mut self, instance: Uuid) {
        if self.instance() == Some(instance) {
            self.stop();
        }
    }

    pub fn stop(&mut self) {
        if let Some((instance, handle)) = self.running.take() {
            handle.abort();
            debug!(%instance, "Progress ticker stopped");
        }
    }

    pub fn instance(&self) -> Option<Uuid> {
        self.running.as_ref().map(|(id, _)| *id)
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.stop();
    }
}
