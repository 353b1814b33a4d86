//! Virtual-time timers: one-shot and periodic.
//!
//! Nothing here reads a wall clock. The owner calls [`TimerQueue::pop_due`]
//! with the current time and receives the due events one by one.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use diorama_core::{DioramaError, DioramaResult, Duration, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// A timer that came due.
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<E> {
    pub id: TimerId,
    /// When the timer was due, which may be earlier than the `now` passed in.
    pub due: Timestamp,
    pub event: E,
}

#[derive(Debug, Clone)]
struct Timer<E> {
    due: Timestamp,
    seq: u64,
    interval: Option<Duration>,
    event: E,
}

/// Heap entry. Ordered so the earliest due time (then lowest seq) is on top.
#[derive(Debug, Clone, Copy)]
struct Pending {
    due: f64,
    seq: u64,
    id: TimerId,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .total_cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Pending timers. Events with equal due times fire in the order they were armed.
#[derive(Debug, Clone)]
pub struct TimerQueue<E> {
    heap: BinaryHeap<Pending>,
    timers: HashMap<TimerId, Timer<E>>,
    next_id: u64,
    next_seq: u64,
}

impl<E: Clone> TimerQueue<E> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            timers: HashMap::new(),
            next_id: 0,
            next_seq: 0,
        }
    }

    /// Fire `event` once at `at`.
    pub fn schedule_once(&mut self, at: Timestamp, event: E) -> TimerId {
        self.arm(at, None, event)
    }

    /// Fire `event` at `first`, then every `interval` after that.
    pub fn schedule_every(
        &mut self,
        first: Timestamp,
        interval: Duration,
        event: E,
    ) -> DioramaResult<TimerId> {
        if interval.is_zero() || !interval.as_seconds().is_finite() {
            return Err(DioramaError::Config(format!(
                "periodic timer interval must be positive and finite, got {}",
                interval.as_seconds()
            )));
        }
        Ok(self.arm(first, Some(interval), event))
    }

    fn arm(&mut self, due: Timestamp, interval: Option<Duration>, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let seq = self.push(id, due);
        self.timers.insert(
            id,
            Timer {
                due,
                seq,
                interval,
                event,
            },
        );
        id
    }

    fn push(&mut self, id: TimerId, due: Timestamp) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Pending {
            due: due.as_seconds(),
            seq,
            id,
        });
        seq
    }

    /// Remove a timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.timers.remove(&id).is_some()
    }

    /// Pop the next event due at or before `now`.
    ///
    /// Periodic timers re-arm at `due + interval`, so a late call catches up
    /// on every missed occurrence instead of drifting.
    pub fn pop_due(&mut self, now: Timestamp) -> Option<Fired<E>> {
        while let Some(top) = self.heap.peek().copied() {
            if top.due > now.as_seconds() {
                return None;
            }
            self.heap.pop();

            let Some(timer) = self.timers.get(&top.id) else {
                continue;
            };
            if timer.seq != top.seq {
                continue;
            }
            let due = timer.due;
            let interval = timer.interval;

            match interval {
                Some(interval) => {
                    let event = timer.event.clone();
                    let next = due + interval;
                    let seq = self.push(top.id, next);
                    if let Some(timer) = self.timers.get_mut(&top.id) {
                        timer.due = next;
                        timer.seq = seq;
                    }
                    return Some(Fired {
                        id: top.id,
                        due,
                        event,
                    });
                }
                None => {
                    if let Some(timer) = self.timers.remove(&top.id) {
                        return Some(Fired {
                            id: top.id,
                            due,
                            event: timer.event,
                        });
                    }
                }
            }
        }
        None
    }

    /// Earliest pending due time.
    pub fn next_due(&self) -> Option<Timestamp> {
        self.timers
            .values()
            .map(|timer| timer.due)
            .min_by(|a, b| a.as_seconds().total_cmp(&b.as_seconds()))
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

impl<E: Clone> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: f64) -> Timestamp {
        Timestamp::from_seconds(s)
    }

    fn drain(queue: &mut TimerQueue<&'static str>, now: f64) -> Vec<(f64, &'static str)> {
        let mut fired = Vec::new();
        while let Some(f) = queue.pop_due(at(now)) {
            fired.push((f.due.as_seconds(), f.event));
        }
        fired
    }

    #[test]
    fn test_one_shot_fires_once() {
        let mut queue = TimerQueue::new();
        queue.schedule_once(at(3.0), "open");
        assert!(drain(&mut queue, 2.9).is_empty());
        assert_eq!(drain(&mut queue, 3.0), vec![(3.0, "open")]);
        assert!(drain(&mut queue, 100.0).is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_due_order_and_ties() {
        let mut queue = TimerQueue::new();
        queue.schedule_once(at(6.0), "close");
        queue.schedule_once(at(3.0), "open");
        queue.schedule_once(at(6.0), "later-armed");
        assert_eq!(
            drain(&mut queue, 10.0),
            vec![(3.0, "open"), (6.0, "close"), (6.0, "later-armed")]
        );
    }

    #[test]
    fn test_periodic_catches_up_without_drift() {
        let mut queue = TimerQueue::new();
        queue
            .schedule_every(at(0.0), Duration::from_seconds(10.0), "cycle")
            .unwrap();
        let fired = drain(&mut queue, 25.0);
        assert_eq!(fired, vec![(0.0, "cycle"), (10.0, "cycle"), (20.0, "cycle")]);
        assert_eq!(queue.next_due(), Some(at(30.0)));
    }

    #[test]
    fn test_cancel() {
        let mut queue = TimerQueue::new();
        let periodic = queue
            .schedule_every(at(1.0), Duration::from_seconds(1.0), "tick")
            .unwrap();
        let once = queue.schedule_once(at(1.5), "once");
        assert_eq!(drain(&mut queue, 1.0).len(), 1);
        assert!(queue.cancel(periodic));
        assert!(queue.cancel(once));
        assert!(!queue.cancel(once));
        assert!(drain(&mut queue, 10.0).is_empty());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut queue: TimerQueue<&'static str> = TimerQueue::new();
        assert!(queue.schedule_every(at(0.0), Duration::zero(), "x").is_err());
    }

    #[test]
    fn test_events_armed_while_draining_fire_in_same_pass() {
        let mut queue = TimerQueue::new();
        queue.schedule_once(at(1.0), "first");
        let mut seen = Vec::new();
        while let Some(f) = queue.pop_due(at(1.0)) {
            if f.event == "first" {
                queue.schedule_once(f.due, "chained");
            }
            seen.push(f.event);
        }
        assert_eq!(seen, vec!["first", "chained"]);
    }
}
