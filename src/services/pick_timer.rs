// Per-league pick clock. One live timer per league; arming replaces.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures_util::future::BoxFuture;
use tokio::task::AbortHandle;
use tracing::debug;

use crate::dto::draft_dto::TimerSnapshot;

struct ArmedTimer {
    generation: u64,
    armed_for_pick_number: i64,
    expires_at: DateTime<Utc>,
    handle: Option<AbortHandle>,
}

impl ArmedTimer {
    fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            armed_for_pick_number: self.armed_for_pick_number,
            expires_at: self.expires_at,
        }
    }

    fn abort(self) {
        if let Some(handle) = self.handle {
            handle.abort();
        }
    }
}

#[derive(Clone, Default)]
pub struct PickTimers {
    timers: Arc<DashMap<i64, ArmedTimer>>,
    generations: Arc<AtomicU64>,
}

impl PickTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the clock for `pick_number`, cancelling whatever was running for
    /// the league. `on_expire` runs once if the timer is still the live one
    /// when the budget elapses; it must re-check the draft state itself.
    pub fn arm(
        &self,
        league_id: i64,
        pick_number: i64,
        budget: Duration,
        on_expire: BoxFuture<'static, ()>,
    ) -> TimerSnapshot {
        let (generation, snapshot) = self.install(league_id, pick_number, budget);
        self.spawn(league_id, pick_number, generation, budget, on_expire);
        snapshot
    }

    /// Like `arm`, but leaves a running clock alone. Returns None in that case.
    pub fn arm_if_idle(
        &self,
        league_id: i64,
        pick_number: i64,
        budget: Duration,
        on_expire: BoxFuture<'static, ()>,
    ) -> Option<TimerSnapshot> {
        let (generation, snapshot) = match self.timers.entry(league_id) {
            Entry::Occupied(_) => return None,
            Entry::Vacant(slot) => {
                let (generation, armed) = self.fresh(pick_number, budget);
                let snapshot = armed.snapshot();
                slot.insert(armed);
                (generation, snapshot)
            }
        };
        self.spawn(league_id, pick_number, generation, budget, on_expire);
        Some(snapshot)
    }

    fn fresh(&self, pick_number: i64, budget: Duration) -> (u64, ArmedTimer) {
        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        let expires_at = Utc::now() + chrono::Duration::from_std(budget).unwrap_or_else(|_| chrono::Duration::zero());
        let armed = ArmedTimer {
            generation,
            armed_for_pick_number: pick_number,
            expires_at,
            handle: None,
        };
        (generation, armed)
    }

    fn install(&self, league_id: i64, pick_number: i64, budget: Duration) -> (u64, TimerSnapshot) {
        let (generation, armed) = self.fresh(pick_number, budget);
        let snapshot = armed.snapshot();
        if let Some(previous) = self.timers.insert(league_id, armed) {
            previous.abort();
        }
        (generation, snapshot)
    }

    fn spawn(&self, league_id: i64, pick_number: i64, generation: u64, budget: Duration, on_expire: BoxFuture<'static, ()>) {
        let timers = self.timers.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(budget).await;
            // Only the timer that is still registered gets to fire.
            let fired = timers
                .remove_if(&league_id, |_, t| t.generation == generation)
                .is_some();
            if fired {
                debug!("Pick clock expired for league {} pick {}", league_id, pick_number);
                on_expire.await;
            }
        });

        if let Some(mut armed) = self.timers.get_mut(&league_id) {
            if armed.generation == generation {
                armed.handle = Some(task.abort_handle());
            }
        }
    }

    /// Stop the league's clock. Returns false if nothing was running, which
    /// includes the case where it already fired.
    pub fn cancel(&self, league_id: i64) -> bool {
        match self.timers.remove(&league_id) {
            Some((_, armed)) => {
                armed.abort();
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self, league_id: i64) -> Option<TimerSnapshot> {
        self.timers.get(&league_id).map(|t| t.snapshot())
    }

    pub fn active(&self) -> usize {
        self.timers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter_future(counter: &Arc<AtomicUsize>) -> BoxFuture<'static, ()> {
        let counter = counter.clone();
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_budget() {
        let timers = PickTimers::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let snap = timers.arm(1, 5, Duration::from_secs(30), counter_future(&fired));
        assert_eq!(snap.armed_for_pick_number, 5);
        assert_eq!(timers.snapshot(1).unwrap().armed_for_pick_number, 5);

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(timers.snapshot(1).is_none());
        assert!(!timers.cancel(1));
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_replaces_previous_timer() {
        let timers = PickTimers::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        timers.arm(1, 5, Duration::from_secs(10), counter_future(&first));
        timers.arm(1, 6, Duration::from_secs(10), counter_future(&second));
        assert_eq!(timers.active(), 1);

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn arm_if_idle_never_replaces_a_running_clock() {
        let timers = PickTimers::new();
        let live = Arc::new(AtomicUsize::new(0));
        let retry = Arc::new(AtomicUsize::new(0));

        timers.arm(1, 6, Duration::from_secs(10), counter_future(&live));
        assert!(timers.arm_if_idle(1, 5, Duration::from_secs(1), counter_future(&retry)).is_none());
        assert_eq!(timers.snapshot(1).unwrap().armed_for_pick_number, 6);

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(live.load(Ordering::SeqCst), 1);
        assert_eq!(retry.load(Ordering::SeqCst), 0);

        let snap = timers.arm_if_idle(1, 7, Duration::from_secs(1), counter_future(&retry)).unwrap();
        assert_eq!(snap.armed_for_pick_number, 7);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(retry.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_fire_and_leagues_are_independent() {
        let timers = PickTimers::new();
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));

        timers.arm(1, 1, Duration::from_secs(5), counter_future(&a));
        timers.arm(2, 1, Duration::from_secs(5), counter_future(&b));
        assert!(timers.cancel(1));

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(a.load(Ordering::SeqCst), 0);
        assert_eq!(b.load(Ordering::SeqCst), 1);
        assert_eq!(timers.active(), 0);
    }
}
