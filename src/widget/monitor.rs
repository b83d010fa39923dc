//! Periodic health probing that drives the connected/disconnected status.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{Instant, MissedTickBehavior};

use crate::client::ChatBackend;
use crate::error::Result;
use crate::observability::{HEALTH_POLL_FAILURES, HEALTH_POLLS};

use super::controller::{Event, Widget};
use super::render::Renderer;
use super::task::{TaskGuard, bounded};

/// A running health-poll loop.
#[derive(Debug)]
pub(crate) struct Monitor {
    pub(crate) id: u64,
    task: TaskGuard,
}

impl Monitor {
    pub(crate) fn is_running(&self) -> bool {
        !self.task.is_cancelled()
    }

    fn stop(&mut self) {
        self.task.cancel();
    }
}

fn spawn_poller<B: ChatBackend>(
    backend: Arc<B>,
    events: UnboundedSender<Event>,
    monitor: u64,
    interval: Duration,
    timeout: Duration,
) -> TaskGuard {
    let interval = interval.max(Duration::from_millis(1));
    TaskGuard::spawn(move |token| async move {
        let mut ticks = tokio::time::interval_at(Instant::now() + interval, interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticks.tick() => {}
            }
            HEALTH_POLLS.click();
            let outcome: Result<()> = tokio::select! {
                _ = token.cancelled() => break,
                outcome = bounded(timeout, "health probe", backend.health()) => outcome,
            };
            if events.send(Event::HealthPolled { monitor, outcome }).is_err() {
                break;
            }
        }
    })
}

impl<B: ChatBackend> Widget<B> {
    /// Start polling the health endpoint.  Does nothing without a session; replaces any
    /// monitor already running.
    pub(crate) fn start_monitor(&mut self) {
        self.stop_monitor();
        if self.is_torn_down() || self.state.session_id.is_none() {
            return;
        }
        let id = self.next_generation();
        let task = spawn_poller(
            Arc::clone(&self.backend),
            self.events.clone(),
            id,
            self.config.health_poll_interval,
            self.config.health_timeout,
        );
        tracing::debug!(
            interval = ?self.config.health_poll_interval,
            "connectivity monitor started"
        );
        self.monitor = Some(Monitor { id, task });
    }

    /// Stop polling.  Outcomes of probes already in flight are discarded.  Safe to call
    /// repeatedly.
    pub fn stop_monitor(&mut self) {
        if let Some(mut monitor) = self.monitor.take() {
            monitor.stop();
            tracing::debug!("connectivity monitor stopped");
        }
    }

    /// True while the health-poll loop is running.
    pub fn is_monitoring(&self) -> bool {
        self.monitor.as_ref().is_some_and(Monitor::is_running)
    }

    pub(crate) fn health_polled(
        &mut self,
        monitor: u64,
        outcome: Result<()>,
        renderer: &mut dyn Renderer,
    ) {
        if self.monitor.as_ref().map(|m| m.id) != Some(monitor) {
            tracing::debug!(monitor, "stale health probe dropped");
            return;
        }
        match outcome {
            Ok(()) => self.set_connected(true, renderer),
            Err(err) => {
                HEALTH_POLL_FAILURES.click();
                if self.state.connected {
                    tracing::warn!("health probe failed: {}", err);
                } else {
                    tracing::debug!("health probe still failing: {}", err);
                }
                self.set_connected(false, renderer);
            }
        }
    }
}
