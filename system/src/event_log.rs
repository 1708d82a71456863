use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::clock::{next_stamp, Clock, SystemClock};
use crate::types::{SessionId, Timestamp};

pub trait Event: Clone + Send + Sync {
    fn timestamp(&self) -> Timestamp;

    /// The same event carrying the timestamp the store assigned.
    fn stamped(self, at: Timestamp) -> Self;
}

/// Per-session, capacity-bounded, time-ordered event storage.
///
/// Writes to one session key are serialized; different keys are independent.
/// Builders passed to `append_with`/`replace_with` run while the key is held,
/// with the timestamp the store assigned, so insertion order and timestamp
/// order never disagree.
pub trait EventStore<T: Event>: Send + Sync {
    fn capacity(&self) -> usize;

    fn append_with<F>(&self, session_id: &str, build: F) -> T
    where
        F: FnOnce(Timestamp) -> T;

    fn replace_with<F>(&self, session_id: &str, build: F) -> T
    where
        F: FnOnce(Timestamp) -> T;

    /// Everything, or only events strictly newer than `since`. Unknown keys
    /// yield an empty list.
    fn list_since(&self, session_id: &str, since: Option<Timestamp>) -> Vec<T>;

    fn len(&self, session_id: &str) -> usize;

    /// Drops the whole log for a key, returning how many events it held.
    fn purge(&self, session_id: &str) -> usize;

    /// Appends a prebuilt event. Whatever timestamp it carried is replaced
    /// by the store's.
    fn append(&self, session_id: &str, event: T) -> T {
        self.append_with(session_id, |at| event.stamped(at))
    }

    fn replace_with_singleton(&self, session_id: &str, event: T) -> T {
        self.replace_with(session_id, |at| event.stamped(at))
    }

    fn list_all(&self, session_id: &str) -> Vec<T> {
        self.list_since(session_id, None)
    }
}

struct Log<T> {
    events: VecDeque<T>,
    // last stamp handed out, kept even when the events are gone
    high_water: Option<Timestamp>,
}

type Slot<T> = Arc<Mutex<Log<T>>>;

pub struct MemoryEventLog<T> {
    capacity: usize,
    clock: Arc<dyn Clock>,
    logs: RwLock<HashMap<SessionId, Slot<T>>>,
    retired: Mutex<HashMap<SessionId, Timestamp>>,
}

impl<T: Event> MemoryEventLog<T> {
    pub fn new(capacity: usize) -> Self {
        Self::with_clock(capacity, Arc::new(SystemClock))
    }

    pub fn with_clock(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            capacity: capacity.max(1),
            clock,
            logs: RwLock::new(HashMap::new()),
            retired: Mutex::new(HashMap::new()),
        }
    }

    fn existing(&self, session_id: &str) -> Option<Slot<T>> {
        self.logs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .cloned()
    }

    fn slot(&self, session_id: &str) -> Slot<T> {
        if let Some(slot) = self.existing(session_id) {
            return slot;
        }
        let mut logs = self.logs.write().unwrap_or_else(PoisonError::into_inner);
        logs.entry(session_id.to_owned())
            .or_insert_with(|| {
                log::debug!("Opening event log for session {}", session_id);
                let high_water = self
                    .retired
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(session_id);
                Arc::new(Mutex::new(Log {
                    events: VecDeque::new(),
                    high_water,
                }))
            })
            .clone()
    }

    fn stamp(&self, log: &mut Log<T>) -> Timestamp {
        let at = next_stamp(self.clock.now(), log.high_water);
        log.high_water = Some(at);
        at
    }
}

fn lock<T>(slot: &Slot<T>) -> MutexGuard<'_, Log<T>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Event> EventStore<T> for MemoryEventLog<T> {
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn append_with<F>(&self, session_id: &str, build: F) -> T
    where
        F: FnOnce(Timestamp) -> T,
    {
        let slot = self.slot(session_id);
        let mut log = lock(&slot);
        let event = build(self.stamp(&mut log));
        log.events.push_back(event.clone());
        while log.events.len() > self.capacity {
            log.events.pop_front();
        }
        event
    }

    fn replace_with<F>(&self, session_id: &str, build: F) -> T
    where
        F: FnOnce(Timestamp) -> T,
    {
        let slot = self.slot(session_id);
        let mut log = lock(&slot);
        let event = build(self.stamp(&mut log));
        let dropped = log.events.len();
        log.events.clear();
        log.events.push_back(event.clone());
        log::debug!(
            "Session {} log reset, {} earlier events dropped",
            session_id,
            dropped
        );
        event
    }

    fn list_since(&self, session_id: &str, since: Option<Timestamp>) -> Vec<T> {
        let slot = match self.existing(session_id) {
            Some(slot) => slot,
            None => return Vec::new(),
        };
        let log = lock(&slot);
        match since {
            None => log.events.iter().cloned().collect(),
            Some(since) => {
                // timestamps are strictly increasing, so skip the older prefix
                let start = log.events.partition_point(|e| e.timestamp() <= since);
                log.events.range(start..).cloned().collect()
            }
        }
    }

    fn len(&self, session_id: &str) -> usize {
        match self.existing(session_id) {
            Some(slot) => {
                let len = lock(&slot).events.len();
                len
            }
            None => 0,
        }
    }

    /// The key's last stamp survives the purge, so a log reopened under the
    /// same key never stamps at or before a cursor a poller already holds.
    fn purge(&self, session_id: &str) -> usize {
        let mut logs = self.logs.write().unwrap_or_else(PoisonError::into_inner);
        let slot = match logs.remove(session_id) {
            Some(slot) => slot,
            None => return 0,
        };
        let log = lock(&slot);
        if let Some(at) = log.high_water {
            self.retired
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(session_id.to_owned(), at);
        }
        let len = log.events.len();
        len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[derive(Debug, Clone, PartialEq)]
    struct Tick {
        n: usize,
        at: Timestamp,
    }

    impl Event for Tick {
        fn timestamp(&self) -> Timestamp {
            self.at
        }

        fn stamped(self, at: Timestamp) -> Self {
            Tick { at, ..self }
        }
    }

    fn log_with(capacity: usize) -> (MemoryEventLog<Tick>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_at_epoch_millis(1_700_000_000_000));
        (MemoryEventLog::with_clock(capacity, clock.clone()), clock)
    }

    fn push(log: &MemoryEventLog<Tick>, key: &str, n: usize) -> Tick {
        log.append_with(key, |at| Tick { n, at })
    }

    #[test]
    fn it_keeps_everything_below_capacity() {
        let (log, clock) = log_with(5);
        for n in 0..5 {
            push(&log, "s", n);
            clock.advance_millis(10);
        }
        assert_eq!(log.len("s"), 5);
        let ns: Vec<_> = log.list_all("s").into_iter().map(|t| t.n).collect();
        assert_eq!(ns, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn it_drops_oldest_beyond_capacity() {
        let (log, _) = log_with(3);
        for n in 0..8 {
            push(&log, "s", n);
        }
        let ns: Vec<_> = log.list_all("s").into_iter().map(|t| t.n).collect();
        assert_eq!(ns, vec![5, 6, 7]);
    }

    #[test]
    fn it_lists_strictly_newer_events() {
        let (log, clock) = log_with(10);
        let mut stamps = Vec::new();
        for n in 0..6 {
            stamps.push(push(&log, "s", n).at);
            clock.advance_millis(7);
        }
        let all = log.list_all("s");
        for since in &stamps {
            let expected: Vec<_> = all.iter().filter(|e| e.at > *since).cloned().collect();
            assert_eq!(log.list_since("s", Some(*since)), expected);
        }
        let before_all = stamps[0] - chrono::Duration::seconds(1);
        assert_eq!(log.list_since("s", Some(before_all)), all);
    }

    #[test]
    fn it_stamps_strictly_increasing_when_clock_stalls() {
        let (log, _) = log_with(10);
        let a = push(&log, "s", 0);
        let b = push(&log, "s", 1);
        let c = push(&log, "s", 2);
        assert!(a.at < b.at && b.at < c.at);
        assert_eq!(log.list_since("s", Some(a.at)), vec![b, c]);
    }

    #[test]
    fn it_returns_empty_for_unknown_session() {
        let (log, _) = log_with(10);
        assert!(log.list_all("nope").is_empty());
        assert_eq!(log.len("nope"), 0);
        assert_eq!(log.purge("nope"), 0);
    }

    #[test]
    fn it_restamps_prebuilt_events_in_arrival_order() {
        let (log, clock) = log_with(10);
        let base = clock.now();
        for (n, offset) in [(0, 10), (1, 5), (2, 20)] {
            log.append("s", Tick { n, at: base + chrono::Duration::seconds(offset) });
            clock.advance_millis(1);
        }
        let all = log.list_all("s");
        assert!(all.windows(2).all(|w| w[0].at < w[1].at));
        for since in all.iter().map(|e| e.at) {
            let expected: Vec<_> = all.iter().filter(|e| e.at > since).cloned().collect();
            assert_eq!(log.list_since("s", Some(since)), expected);
        }
        let middle = all[1].at;
        let ns: Vec<_> = log.list_since("s", Some(middle)).into_iter().map(|t| t.n).collect();
        assert_eq!(ns, vec![2]);

        let stale = Tick { n: 9, at: base - chrono::Duration::days(1) };
        let reset = log.replace_with_singleton("s", stale);
        assert!(reset.at > all[2].at);
        assert_eq!(log.list_since("s", Some(all[2].at)), vec![reset]);
    }

    #[test]
    fn it_stamps_past_a_purged_log_when_clock_stalls() {
        let (log, _) = log_with(10);
        push(&log, "s", 0);
        let last = push(&log, "s", 1);
        assert_eq!(log.purge("s"), 2);

        let reopened = push(&log, "s", 2);
        assert!(reopened.at > last.at);
        assert_eq!(log.list_since("s", Some(last.at)), vec![reopened]);
    }

    #[test]
    fn it_replaces_log_with_singleton() {
        let (log, _) = log_with(10);
        for n in 0..4 {
            push(&log, "s", n);
        }
        let reset = log.replace_with("s", |at| Tick { n: 99, at });
        assert_eq!(log.list_all("s"), vec![reset]);
    }

    #[test]
    fn it_keeps_sessions_independent() {
        let (log, _) = log_with(2);
        push(&log, "a", 1);
        push(&log, "b", 2);
        push(&log, "b", 3);
        push(&log, "b", 4);
        assert_eq!(log.len("a"), 1);
        assert_eq!(log.len("b"), 2);
        assert_eq!(log.purge("b"), 2);
        assert_eq!(log.len("b"), 0);
        assert_eq!(log.len("a"), 1);
    }

    #[test]
    fn it_loses_nothing_under_concurrent_appends() {
        let log = Arc::new(MemoryEventLog::<Tick>::new(1000));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let log = log.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        push(&log, "shared", t * 100 + i);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().expect("writer thread");
        }
        let all = log.list_all("shared");
        assert_eq!(all.len(), 400);
        assert!(all.windows(2).all(|w| w[0].at < w[1].at));
    }
}
