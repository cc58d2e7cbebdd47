//! Virtual-time timers for the single UI thread.
//!
//! Nothing here sleeps or reads the wall clock. The host reports the current
//! `Timestamp` with every event and drains due timers with [`TimerQueue::pop_due`].
//! Due timers come out in deadline order, ties in scheduling order.

use std::ops::Add;
use std::time::Duration;

/// Monotonic session time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(Duration);

impl Timestamp {
    pub const ZERO: Self = Self(Duration::ZERO);

    pub const fn from_millis(ms: u64) -> Self {
        Self(Duration::from_millis(ms))
    }

    pub fn as_millis(self) -> u64 {
        self.0.as_millis() as u64
    }

    /// Time elapsed since `earlier`, zero if `earlier` is in the future.
    pub fn since(self, earlier: Timestamp) -> Duration {
        self.0.saturating_sub(earlier.0)
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp(self.0 + rhs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Entry<T> {
    id: TimerId,
    deadline: Timestamp,
    interval: Option<Duration>,
    payload: T,
}

#[derive(Debug)]
pub struct TimerQueue<T> {
    next_id: u64,
    entries: Vec<Entry<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    fn push(&mut self, deadline: Timestamp, interval: Option<Duration>, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            deadline,
            interval,
            payload,
        });
        id
    }

    /// Fire `payload` once at `now + delay`.
    pub fn schedule_once(&mut self, now: Timestamp, delay: Duration, payload: T) -> TimerId {
        self.push(now + delay, None, payload)
    }

    /// Fire `payload` at `now + delay` and then every `interval` until cancelled.
    pub fn schedule_repeating(
        &mut self,
        now: Timestamp,
        delay: Duration,
        interval: Duration,
        payload: T,
    ) -> TimerId {
        self.push(now + delay, Some(interval), payload)
    }

    /// Returns whether the timer was still scheduled. Cancelling a fired or
    /// already cancelled timer is a no-op.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Cancel every timer whose payload matches. Returns how many were removed.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !pred(&e.payload));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.entries.iter().map(|e| e.deadline).min()
    }

    fn earliest_due(&self, now: Timestamp) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.deadline <= now)
            .min_by_key(|(_, e)| (e.deadline, e.id.0))
            .map(|(i, _)| i)
    }
}

impl<T: Clone> TimerQueue<T> {
    /// Take the earliest timer due at `now`. A repeating timer stays queued
    /// with its deadline moved forward by one interval.
    pub fn pop_due(&mut self, now: Timestamp) -> Option<(TimerId, Timestamp, T)> {
        let index = self.earliest_due(now)?;
        let entry = &mut self.entries[index];
        let fired_at = entry.deadline;
        let id = entry.id;
        match entry.interval {
            Some(interval) => {
                entry.deadline = entry.deadline + interval;
                Some((id, fired_at, entry.payload.clone()))
            }
            None => {
                let entry = self.entries.swap_remove(index);
                Some((id, fired_at, entry.payload))
            }
        }
    }
}
