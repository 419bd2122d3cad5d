/// Deferred, single-shot events on the simulation clock.
///
/// Every entry carries the epoch of the level instance that scheduled
/// it. The queue is cleared on every load, and the consumer re-checks
/// the epoch before applying an entry, so a late entry can never touch
/// a freshly loaded level.

/// What to do when an entry comes due.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Deferred {
    /// Release an armed falling block (tile index).
    ActivateFalling { tile: usize },
    /// Put a dead actor back at the start position.
    Respawn,
}

#[derive(Clone, Debug)]
struct Entry {
    due_ms: u64,
    seq: u64,
    epoch: u64,
    action: Deferred,
}

#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    entries: Vec<Entry>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due_ms: u64, epoch: u64, action: Deferred) {
        self.entries.push(Entry { due_ms, seq: self.next_seq, epoch, action });
        self.next_seq += 1;
        tracing::debug!(due_ms, epoch, ?action, "scheduled");
    }

    /// Remove and return every entry due at `now_ms`, ordered by due
    /// time, then by scheduling order.
    pub fn drain_due(&mut self, now_ms: u64) -> Vec<(u64, Deferred)> {
        let (mut fired, rest): (Vec<Entry>, Vec<Entry>) =
            std::mem::take(&mut self.entries).into_iter().partition(|e| e.due_ms <= now_ms);
        self.entries = rest;
        fired.sort_by_key(|e| (e.due_ms, e.seq));
        fired.into_iter().map(|e| (e.epoch, e.action)).collect()
    }

    pub fn cancel_all(&mut self) {
        if !self.is_empty() {
            tracing::debug!(count = self.len(), "cancelled pending events");
        }
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_fires_early() {
        let mut s = Scheduler::new();
        s.schedule(200, 1, Deferred::Respawn);
        assert!(s.drain_due(199).is_empty());
        assert_eq!(s.drain_due(200), vec![(1, Deferred::Respawn)]);
        assert!(s.is_empty());
    }

    #[test]
    fn fires_in_due_then_schedule_order() {
        let mut s = Scheduler::new();
        s.schedule(500, 1, Deferred::Respawn);
        s.schedule(200, 1, Deferred::ActivateFalling { tile: 7 });
        s.schedule(200, 1, Deferred::ActivateFalling { tile: 3 });
        s.schedule(900, 1, Deferred::ActivateFalling { tile: 9 });

        let fired = s.drain_due(600);
        assert_eq!(fired, vec![
            (1, Deferred::ActivateFalling { tile: 7 }),
            (1, Deferred::ActivateFalling { tile: 3 }),
            (1, Deferred::Respawn),
        ]);
        assert_eq!(s.len(), 1);
        assert_eq!(s.drain_due(900), vec![(1, Deferred::ActivateFalling { tile: 9 })]);
        assert!(s.is_empty());
    }

    #[test]
    fn cancel_all_drops_pending() {
        let mut s = Scheduler::new();
        s.schedule(10, 1, Deferred::Respawn);
        s.cancel_all();
        assert!(s.drain_due(u64::MAX).is_empty());
    }

    #[test]
    fn entries_keep_their_epoch() {
        let mut s = Scheduler::new();
        s.schedule(10, 4, Deferred::Respawn);
        s.schedule(10, 5, Deferred::Respawn);
        let epochs: Vec<u64> = s.drain_due(10).into_iter().map(|(e, _)| e).collect();
        assert_eq!(epochs, vec![4, 5]);
    }
}
