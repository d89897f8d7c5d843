//! Periodic alert re-evaluation for the selected patient.
//!
//! [`AlertMonitor`] owns at most one tick task. Arming it for a new
//! selection aborts the previous task, and dropping the monitor aborts
//! whatever is running. Ticks are delivered over a channel to the single
//! owner of the [`Session`](crate::Session), which checks the generation
//! before acting on them.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;
use vitalwatch_types::PatientId;

/// Default alert re-check period.
pub const DEFAULT_ALERT_INTERVAL: Duration = Duration::from_secs(60);

/// A request to re-evaluate alerts, scheduled for one selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick {
    /// Selection generation the tick was scheduled for.
    pub generation: u64,
    pub patient_id: PatientId,
}

/// Cancellable tick scheduler tied to the current selection.
///
/// ```
/// use std::time::Duration;
/// use vitalwatch::{AlertMonitor, PatientId};
///
/// # tokio_test::block_on(async {
/// let handle = tokio::runtime::Handle::current();
/// let mut monitor = AlertMonitor::new(handle, Duration::from_millis(10));
/// monitor.arm(1, PatientId::from("7"));
///
/// let tick = monitor.next().await.unwrap();
/// assert_eq!(tick.generation, 1);
/// # });
/// ```
#[derive(Debug)]
pub struct AlertMonitor {
    runtime: Handle,
    period: Duration,
    sender: mpsc::UnboundedSender<Tick>,
    receiver: mpsc::UnboundedReceiver<Tick>,
    task: Option<JoinHandle<()>>,
}

impl AlertMonitor {
    /// Create an idle monitor that will spawn its task on `runtime`.
    pub fn new(runtime: Handle, period: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            runtime,
            period,
            sender,
            receiver,
            task: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start ticking for a selection, replacing any running task.
    ///
    /// The first tick arrives one full period after arming; evaluation on
    /// selection itself is the caller's job.
    pub fn arm(&mut self, generation: u64, patient_id: PatientId) {
        self.disarm();
        // Ticks already queued for an older selection are dropped here
        while self.receiver.try_recv().is_ok() {}

        debug!(generation, patient = %patient_id, period = ?self.period, "Arming alert monitor");

        let period = self.period.max(Duration::from_millis(1));
        let sender = self.sender.clone();
        self.task = Some(self.runtime.spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let tick = Tick {
                    generation,
                    patient_id: patient_id.clone(),
                };
                if sender.send(tick).is_err() {
                    break;
                }
            }
        }));
    }

    /// Stop ticking. Safe to call when already idle.
    pub fn disarm(&mut self) {
        if let Some(task) = self.task.take() {
            debug!("Disarming alert monitor");
            task.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Take the next pending tick without waiting.
    pub fn try_next(&mut self) -> Option<Tick> {
        self.receiver.try_recv().ok()
    }

    /// Wait for the next tick.
    pub async fn next(&mut self) -> Option<Tick> {
        self.receiver.recv().await
    }
}

impl Drop for AlertMonitor {
    fn drop(&mut self) {
        self.disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(secs: u64) -> AlertMonitor {
        AlertMonitor::new(Handle::current(), Duration::from_secs(secs))
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_after_one_period() {
        let mut m = monitor(60);
        m.arm(1, PatientId::from("7"));

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert!(m.try_next().is_none());

        let tick = m.next().await.unwrap();
        assert_eq!(tick.generation, 1);
        assert_eq!(tick.patient_id, PatientId::from("7"));
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_repeat() {
        let mut m = monitor(10);
        m.arm(3, PatientId::from("7"));
        for _ in 0..3 {
            assert_eq!(m.next().await.unwrap().generation, 3);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_replaces_previous_task() {
        let mut m = monitor(10);
        m.arm(1, PatientId::from("a"));
        tokio::time::sleep(Duration::from_secs(5)).await;
        m.arm(2, PatientId::from("b"));

        let tick = m.next().await.unwrap();
        assert_eq!(tick.generation, 2);
        assert_eq!(tick.patient_id, PatientId::from("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_discards_queued_ticks() {
        let mut m = monitor(10);
        m.arm(1, PatientId::from("a"));
        tokio::time::sleep(Duration::from_secs(25)).await;
        m.arm(2, PatientId::from("b"));
        assert!(m.try_next().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn disarm_stops_ticks() {
        let mut m = monitor(10);
        m.arm(1, PatientId::from("a"));
        assert!(m.is_armed());
        m.disarm();
        tokio::task::yield_now().await;
        assert!(!m.is_armed());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(m.try_next().is_none());
    }
}
