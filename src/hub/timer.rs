use super::*;
use std::time::Duration;
use tokio::sync::mpsc::WeakSender;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Single-shot alarm that feeds an [`Event`] back into the loop's own queue.
///
/// At most one alarm is armed; arming again aborts the previous one. The
/// loop still checks the round number carried by the event, so an alarm
/// that fired just before being replaced is harmless.
#[derive(Debug)]
pub struct Timer {
    tx: WeakSender<Event>,
    deadline: Option<Instant>,
    task: Option<JoinHandle<()>>,
}

impl Timer {
    /// Holds only a weak sender, so a pending alarm never keeps the loop alive.
    pub fn new(tx: WeakSender<Event>) -> Self {
        Self {
            tx,
            deadline: None,
            task: None,
        }
    }
    pub fn arm(&mut self, after: Duration, event: Event) {
        self.clear();
        let tx = self.tx.clone();
        self.deadline = Some(Instant::now() + after);
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(tx) = tx.upgrade() {
                if tx.send(event).await.is_err() {
                    log::debug!("[timer] loop gone before alarm");
                }
            }
        }));
    }
    /// Sends `event` back after `delay` without touching the armed alarm.
    /// Nothing cancels it; the loop decides on arrival whether it still applies.
    pub fn schedule(&self, delay: Duration, event: Event) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(tx) = tx.upgrade() {
                if tx.send(event).await.is_err() {
                    log::debug!("[timer] loop gone before scheduled event");
                }
            }
        });
    }
    pub fn clear(&mut self) {
        self.deadline = None;
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    #[tokio::test(start_paused = true)]
    async fn alarm_fires_after_delay() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut timer = Timer::new(tx.downgrade());
        timer.arm(Duration::from_secs(10), Event::Deadline { round: 1 });
        assert_eq!(timer.remaining(), Some(Duration::from_secs(10)));
        tokio::time::sleep(Duration::from_secs(9)).await;
        assert!(rx.try_recv().is_err());
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(matches!(rx.recv().await, Some(Event::Deadline { round: 1 })));
    }
    #[tokio::test(start_paused = true)]
    async fn rearming_replaces_alarm() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut timer = Timer::new(tx.downgrade());
        timer.arm(Duration::from_secs(5), Event::Deadline { round: 1 });
        timer.arm(Duration::from_secs(3), Event::Cooldown { round: 1 });
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(matches!(rx.recv().await, Some(Event::Cooldown { round: 1 })));
        assert!(rx.try_recv().is_err());
    }
    #[tokio::test(start_paused = true)]
    async fn scheduled_event_survives_rearm_and_clear() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut timer = Timer::new(tx.downgrade());
        timer.schedule(Duration::from_secs(2), Event::Cooldown { round: 7 });
        timer.arm(Duration::from_secs(5), Event::Deadline { round: 1 });
        timer.clear();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(matches!(rx.recv().await, Some(Event::Cooldown { round: 7 })));
        assert!(rx.try_recv().is_err());
    }
    #[tokio::test(start_paused = true)]
    async fn cleared_timer_stays_silent() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut timer = Timer::new(tx.downgrade());
        timer.arm(Duration::from_secs(1), Event::Deadline { round: 1 });
        timer.clear();
        assert!(timer.deadline().is_none());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }
}
