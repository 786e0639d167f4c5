//! Time-ordered history of received world snapshots

use log::debug;
use shared::Snapshot;
use std::collections::VecDeque;

/// Buffered snapshots keyed by authoritative timestamp.
///
/// The receive task pushes snapshots in, the render loop asks for the pair
/// bracketing its render time. Snapshots that can no longer matter for
/// rendering (older than the current bracket) are evicted; arrivals already
/// superseded by the render cursor are dropped rather than inserted.
///
/// The buffer also keeps a running estimate of the offset between the
/// server's snapshot timestamps and the local receive clock, taken as the
/// maximum observed `timestamp - recv_time`. The maximum tracks the fastest
/// delivery seen so far, so jitter only ever makes the estimate
/// conservative.
#[derive(Debug, Default)]
pub struct SnapshotBuffer {
    snapshots: VecDeque<Snapshot>,
    render_cursor: u64,
    clock_offset_ms: Option<i64>,
}

impl SnapshotBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a received snapshot, stamped with the local receive time.
    ///
    /// In-order arrivals append; out-of-order arrivals are inserted at
    /// their timestamp position if they can still end up ahead of the
    /// render cursor, and dropped as superseded otherwise.
    pub fn push(&mut self, snapshot: Snapshot, recv_now_ms: u64) {
        let offset = snapshot.timestamp as i64 - recv_now_ms as i64;
        self.clock_offset_ms = Some(match self.clock_offset_ms {
            Some(current) => current.max(offset),
            None => offset,
        });

        match self.snapshots.back() {
            None => self.snapshots.push_back(snapshot),
            Some(newest) if snapshot.timestamp > newest.timestamp => {
                self.snapshots.push_back(snapshot);
            }
            Some(_) => {
                if snapshot.timestamp <= self.render_cursor {
                    debug!(
                        "Dropping superseded snapshot t={} (cursor {})",
                        snapshot.timestamp, self.render_cursor
                    );
                    return;
                }
                if self
                    .snapshots
                    .iter()
                    .any(|s| s.timestamp == snapshot.timestamp)
                {
                    return;
                }
                let pos = self
                    .snapshots
                    .iter()
                    .position(|s| s.timestamp > snapshot.timestamp)
                    .unwrap_or(self.snapshots.len());
                self.snapshots.insert(pos, snapshot);
            }
        }
    }

    /// Maps the local clock onto the authoritative timeline and backs off
    /// by the render delay. `None` until the first snapshot has arrived.
    pub fn render_time(&self, now_ms: u64, render_delay_ms: u64) -> Option<u64> {
        self.clock_offset_ms.map(|offset| {
            (now_ms as i64 + offset - render_delay_ms as i64).max(0) as u64
        })
    }

    /// Returns the snapshots bracketing `t`.
    ///
    /// `(before, Some(after))` with `before.timestamp <= t <= after.timestamp`
    /// when `t` falls inside the buffered range; `(nearest, None)` when it
    /// falls outside (the jitter/packet-gap tolerance path); `None` while
    /// the buffer is empty. Entries superseded for cursor `t` are evicted.
    pub fn bracket(&mut self, t: u64) -> Option<(&Snapshot, Option<&Snapshot>)> {
        self.render_cursor = self.render_cursor.max(t);

        while self.snapshots.len() >= 2 && self.snapshots[1].timestamp <= t {
            self.snapshots.pop_front();
        }

        let front = self.snapshots.front()?;
        if t < front.timestamp || self.snapshots.len() < 2 {
            // Render time is outside the buffered range; the caller renders
            // the nearest snapshot without blending.
            return Some((&self.snapshots[0], None));
        }

        Some((&self.snapshots[0], Some(&self.snapshots[1])))
    }

    /// The most recently received (newest) snapshot, if any.
    pub fn newest(&self) -> Option<&Snapshot> {
        self.snapshots.back()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(timestamp: u64) -> Snapshot {
        Snapshot {
            timestamp,
            players: Vec::new(),
            coins: Vec::new(),
        }
    }

    #[test]
    fn test_empty_buffer_has_no_bracket() {
        let mut buffer = SnapshotBuffer::new();
        assert!(buffer.bracket(100).is_none());
        assert!(buffer.render_time(100, 50).is_none());
    }

    #[test]
    fn test_in_order_pushes_append() {
        let mut buffer = SnapshotBuffer::new();
        buffer.push(snapshot(100), 100);
        buffer.push(snapshot(116), 116);
        buffer.push(snapshot(133), 133);

        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.newest().unwrap().timestamp, 133);
    }

    #[test]
    fn test_bracket_returns_adjacent_pair() {
        let mut buffer = SnapshotBuffer::new();
        buffer.push(snapshot(100), 100);
        buffer.push(snapshot(116), 116);
        buffer.push(snapshot(133), 133);

        let (before, after) = buffer.bracket(120).unwrap();
        assert_eq!(before.timestamp, 116);
        assert_eq!(after.unwrap().timestamp, 133);
        assert!(before.timestamp <= 120);
    }

    #[test]
    fn test_bracket_never_inverts_pair_order() {
        let mut buffer = SnapshotBuffer::new();
        for t in [100u64, 116, 133, 150, 166] {
            buffer.push(snapshot(t), t);
        }

        for t in [90u64, 100, 105, 116, 140, 166, 200] {
            if let Some((before, Some(after))) = buffer.bracket(t) {
                assert!(before.timestamp <= after.timestamp);
                assert!(before.timestamp <= t && t <= after.timestamp);
            }
        }
    }

    #[test]
    fn test_bracket_before_range_degrades_to_nearest() {
        let mut buffer = SnapshotBuffer::new();
        buffer.push(snapshot(100), 100);
        buffer.push(snapshot(116), 116);

        let (nearest, after) = buffer.bracket(50).unwrap();
        assert_eq!(nearest.timestamp, 100);
        assert!(after.is_none());
    }

    #[test]
    fn test_bracket_past_range_degrades_to_newest() {
        let mut buffer = SnapshotBuffer::new();
        buffer.push(snapshot(100), 100);
        buffer.push(snapshot(116), 116);

        let (nearest, after) = buffer.bracket(500).unwrap();
        assert_eq!(nearest.timestamp, 116);
        assert!(after.is_none());
    }

    #[test]
    fn test_eviction_drops_superseded_entries() {
        let mut buffer = SnapshotBuffer::new();
        for t in [100u64, 116, 133, 150] {
            buffer.push(snapshot(t), t);
        }

        buffer.bracket(140);
        assert_eq!(buffer.len(), 2);

        let (before, after) = buffer.bracket(140).unwrap();
        assert_eq!(before.timestamp, 133);
        assert_eq!(after.unwrap().timestamp, 150);
    }

    #[test]
    fn test_out_of_order_arrival_ahead_of_cursor_is_inserted() {
        let mut buffer = SnapshotBuffer::new();
        buffer.push(snapshot(100), 100);
        buffer.push(snapshot(133), 133);
        buffer.push(snapshot(116), 134); // late arrival

        let (before, after) = buffer.bracket(120).unwrap();
        assert_eq!(before.timestamp, 116);
        assert_eq!(after.unwrap().timestamp, 133);
    }

    #[test]
    fn test_out_of_order_arrival_behind_cursor_is_dropped() {
        let mut buffer = SnapshotBuffer::new();
        buffer.push(snapshot(100), 100);
        buffer.push(snapshot(133), 133);
        buffer.bracket(120);

        buffer.push(snapshot(110), 140); // superseded by the cursor
        assert!(buffer.snapshots.iter().all(|s| s.timestamp != 110));
    }

    #[test]
    fn test_duplicate_timestamps_are_dropped() {
        let mut buffer = SnapshotBuffer::new();
        buffer.push(snapshot(100), 100);
        buffer.push(snapshot(133), 133);
        buffer.push(snapshot(100), 134);

        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_render_time_tracks_fastest_observed_path() {
        let mut buffer = SnapshotBuffer::new();
        // Snapshot stamped 1000 arrives at local time 1200: offset -200.
        buffer.push(snapshot(1000), 1200);
        assert_eq!(buffer.render_time(1300, 100), Some(1000));

        // A slower (more jittered) arrival must not shift the mapping.
        buffer.push(snapshot(1016), 1266);
        assert_eq!(buffer.render_time(1300, 100), Some(1000));
    }
}
