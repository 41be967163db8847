use std::collections::HashSet;

/// How many stories one scroll trigger resolves.
pub const BATCH_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    /// No batch dispatched yet for this session.
    Idle,
    /// A batch is being dispatched; further triggers are ignored.
    LoadingBatch,
    /// Dispatch done, waiting for the next scroll trigger.
    AwaitingScroll,
}

/// One category activation: the id sequence fetched for the category, a
/// forward-only cursor over it, and the phase of the load loop.
///
/// The cursor advances exactly once, synchronously, per trigger, so a burst
/// of scroll events can never dispatch overlapping id ranges. Stale sessions
/// are never torn down; they are superseded by a new session with a higher
/// epoch, and in-flight results carrying the old epoch are dropped on
/// arrival.
pub struct FeedSession {
    epoch: u64,
    ids: Vec<u64>,
    cursor: usize,
    phase: FeedPhase,
}

impl FeedSession {
    pub fn new(epoch: u64, ids: Vec<u64>) -> Self {
        Self {
            epoch,
            ids,
            cursor: 0,
            phase: FeedPhase::Idle,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn phase(&self) -> FeedPhase {
        self.phase
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.ids.len()
    }

    /// Whether a scroll trigger should start another batch right now.
    pub fn wants_batch(&self) -> bool {
        self.phase != FeedPhase::LoadingBatch && !self.is_exhausted()
    }

    /// Take the next batch: advance the cursor by `min(BATCH_SIZE, remaining)`
    /// and return the ids to fetch, minus any the user has hidden. Returns an
    /// empty batch when a dispatch is already in progress or the sequence is
    /// exhausted; the cursor is untouched in both cases.
    pub fn begin_batch(&mut self, hidden: &HashSet<u64>) -> Vec<u64> {
        if !self.wants_batch() {
            return Vec::new();
        }
        self.phase = FeedPhase::LoadingBatch;

        let end = (self.cursor + BATCH_SIZE).min(self.ids.len());
        let batch = self.ids[self.cursor..end]
            .iter()
            .copied()
            .filter(|id| !hidden.contains(id))
            .collect();
        self.cursor = end;
        batch
    }

    /// All of the batch's fetches have been spawned (not necessarily
    /// resolved): re-arm the scroll trigger.
    pub fn finish_dispatch(&mut self) {
        if self.phase == FeedPhase::LoadingBatch {
            self.phase = FeedPhase::AwaitingScroll;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_hidden() -> HashSet<u64> {
        HashSet::new()
    }

    #[test]
    fn twelve_ids_take_two_batches_then_noop() {
        let ids: Vec<u64> = (1..=12).collect();
        let mut session = FeedSession::new(1, ids);

        let first = session.begin_batch(&no_hidden());
        assert_eq!(first, (1..=10).collect::<Vec<u64>>());
        assert_eq!(session.cursor(), 10);
        session.finish_dispatch();

        let second = session.begin_batch(&no_hidden());
        assert_eq!(second, vec![11, 12]);
        assert_eq!(session.cursor(), 12);
        session.finish_dispatch();

        let third = session.begin_batch(&no_hidden());
        assert!(third.is_empty());
        assert_eq!(session.cursor(), 12);
    }

    #[test]
    fn cursor_never_exceeds_sequence_length() {
        let mut session = FeedSession::new(1, vec![5, 6, 7]);
        session.begin_batch(&no_hidden());
        assert_eq!(session.cursor(), 3);
        session.finish_dispatch();
        session.begin_batch(&no_hidden());
        assert_eq!(session.cursor(), 3);
        assert!(session.cursor() <= session.len());
        assert!(session.is_exhausted());
    }

    #[test]
    fn hidden_ids_are_never_dispatched() {
        let ids: Vec<u64> = (1..=20).collect();
        let hidden = HashSet::from([2, 5, 9, 15]);
        let mut session = FeedSession::new(1, ids);

        let mut dispatched = Vec::new();
        loop {
            let batch = session.begin_batch(&hidden);
            session.finish_dispatch();
            if batch.is_empty() && session.is_exhausted() {
                break;
            }
            dispatched.extend(batch);
        }

        for id in &hidden {
            assert!(!dispatched.contains(id));
        }
        // The cursor still advances over hidden positions.
        assert_eq!(dispatched.len(), 16);
        assert_eq!(session.cursor(), 20);
    }

    #[test]
    fn cursor_advances_even_when_whole_batch_is_hidden() {
        let ids: Vec<u64> = (1..=10).collect();
        let hidden: HashSet<u64> = (1..=10).collect();
        let mut session = FeedSession::new(1, ids);

        let batch = session.begin_batch(&hidden);
        assert!(batch.is_empty());
        assert_eq!(session.cursor(), 10);
        assert!(session.is_exhausted());
    }

    #[test]
    fn reentrant_trigger_during_dispatch_is_ignored() {
        let ids: Vec<u64> = (1..=30).collect();
        let mut session = FeedSession::new(1, ids);

        let first = session.begin_batch(&no_hidden());
        assert_eq!(first.len(), 10);
        assert_eq!(session.phase(), FeedPhase::LoadingBatch);

        // A second trigger before finish_dispatch must not advance anything.
        let reentrant = session.begin_batch(&no_hidden());
        assert!(reentrant.is_empty());
        assert_eq!(session.cursor(), 10);

        session.finish_dispatch();
        assert_eq!(session.phase(), FeedPhase::AwaitingScroll);
        let second = session.begin_batch(&no_hidden());
        assert_eq!(second, (11..=20).collect::<Vec<u64>>());
    }

    #[test]
    fn phase_transitions() {
        let mut session = FeedSession::new(3, vec![1, 2]);
        assert_eq!(session.phase(), FeedPhase::Idle);
        session.begin_batch(&no_hidden());
        assert_eq!(session.phase(), FeedPhase::LoadingBatch);
        session.finish_dispatch();
        assert_eq!(session.phase(), FeedPhase::AwaitingScroll);
        // finish_dispatch outside a dispatch is a no-op.
        session.finish_dispatch();
        assert_eq!(session.phase(), FeedPhase::AwaitingScroll);
    }

    #[test]
    fn empty_sequence_never_wants_a_batch() {
        let mut session = FeedSession::new(1, Vec::new());
        assert!(!session.wants_batch());
        assert!(session.begin_batch(&no_hidden()).is_empty());
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn sessions_carry_their_epoch() {
        let session = FeedSession::new(7, vec![1]);
        assert_eq!(session.epoch(), 7);
    }
}
