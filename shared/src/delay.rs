//! Fixed-delay queue used to simulate network latency on both directions

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Holds items back for a fixed delay before releasing them.
///
/// The server pushes every inbound input and every outbound snapshot through
/// one of these, which is what turns a loopback connection into a believable
/// 200ms link. Callers pass `now` explicitly so tests can drive the queue
/// with a synthetic clock instead of sleeping.
#[derive(Debug)]
pub struct DelayQueue<T> {
    delay: Duration,
    pending: VecDeque<(Instant, T)>,
}

impl<T> DelayQueue<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: VecDeque::new(),
        }
    }

    /// Stores `item` to be released at `now + delay`.
    ///
    /// The pending list stays sorted by ready-at time. With a monotonic
    /// `now` this is a plain push, but arbitrary enqueue times still release
    /// in ready-at order.
    pub fn enqueue(&mut self, item: T, now: Instant) {
        let ready_at = now + self.delay;
        let pos = self
            .pending
            .iter()
            .rposition(|(t, _)| *t <= ready_at)
            .map(|i| i + 1)
            .unwrap_or(0);
        self.pending.insert(pos, (ready_at, item));
    }

    /// Removes and returns every item whose ready-at time has elapsed,
    /// in ready-at order. An empty queue drains to an empty vec.
    pub fn drain_ready(&mut self, now: Instant) -> Vec<T> {
        let mut ready = Vec::new();
        while self
            .pending
            .front()
            .map_or(false, |(ready_at, _)| *ready_at <= now)
        {
            if let Some((_, item)) = self.pending.pop_front() {
                ready.push(item);
            }
        }
        ready
    }

    /// Discards all in-flight items. Used when a link goes away.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_queue_drains_empty() {
        let mut queue: DelayQueue<u32> = DelayQueue::new(Duration::from_millis(200));
        assert!(queue.is_empty());
        assert!(queue.drain_ready(Instant::now()).is_empty());
    }

    #[test]
    fn test_item_held_until_delay_elapses() {
        let mut queue = DelayQueue::new(Duration::from_millis(200));
        let t0 = Instant::now();

        queue.enqueue(42, t0);

        // Not ready at enqueue time, nor one millisecond short of the delay.
        assert!(queue.drain_ready(t0).is_empty());
        assert!(queue
            .drain_ready(t0 + Duration::from_millis(199))
            .is_empty());
        assert_eq!(queue.len(), 1);

        // Ready exactly at t0 + delay.
        assert_eq!(queue.drain_ready(t0 + Duration::from_millis(200)), vec![42]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_preserves_enqueue_order() {
        let mut queue = DelayQueue::new(Duration::from_millis(100));
        let t0 = Instant::now();

        queue.enqueue(1, t0);
        queue.enqueue(2, t0 + Duration::from_millis(10));
        queue.enqueue(3, t0 + Duration::from_millis(20));

        let ready = queue.drain_ready(t0 + Duration::from_millis(110));
        assert_eq!(ready, vec![1, 2]);

        let ready = queue.drain_ready(t0 + Duration::from_millis(120));
        assert_eq!(ready, vec![3]);
    }

    #[test]
    fn test_out_of_order_enqueue_times_release_in_ready_order() {
        let mut queue = DelayQueue::new(Duration::from_millis(100));
        let t0 = Instant::now();

        // Enqueued "later item" first; ready-at order must still win.
        queue.enqueue("second", t0 + Duration::from_millis(50));
        queue.enqueue("first", t0);

        let ready = queue.drain_ready(t0 + Duration::from_millis(200));
        assert_eq!(ready, vec!["first", "second"]);
    }

    #[test]
    fn test_partial_drain_keeps_pending_items() {
        let mut queue = DelayQueue::new(Duration::from_millis(100));
        let t0 = Instant::now();

        for i in 0..5u32 {
            queue.enqueue(i, t0 + Duration::from_millis(u64::from(i) * 30));
        }

        let ready = queue.drain_ready(t0 + Duration::from_millis(160));
        assert_eq!(ready, vec![0, 1, 2]);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_clear_discards_in_flight_items() {
        let mut queue = DelayQueue::new(Duration::from_millis(100));
        let t0 = Instant::now();

        queue.enqueue(1, t0);
        queue.enqueue(2, t0);
        queue.clear();

        assert!(queue.is_empty());
        assert!(queue
            .drain_ready(t0 + Duration::from_secs(1))
            .is_empty());
    }

    #[test]
    fn test_zero_delay_releases_immediately() {
        let mut queue = DelayQueue::new(Duration::ZERO);
        let t0 = Instant::now();

        queue.enqueue(7, t0);
        assert_eq!(queue.drain_ready(t0), vec![7]);
    }
}
