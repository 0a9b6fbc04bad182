/// A deferred Eaten -> Chase transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingRevert {
    pub ghost_id: usize,
    pub due_ms: u64,
    pub epoch: u64,
}

/// Timer queue for eaten ghosts, keyed on the engine clock.
///
/// `cancel_all` bumps the epoch, so anything scheduled before a level reset
/// can never fire afterwards.
#[derive(Clone, Debug, Default)]
pub struct RevertSchedule {
    pending: Vec<PendingRevert>,
    epoch: u64,
}

impl RevertSchedule {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Schedule a revert, replacing any earlier one for the same ghost.
    pub fn schedule(&mut self, ghost_id: usize, due_ms: u64) {
        self.pending.retain(|entry| entry.ghost_id != ghost_id);
        self.pending.push(PendingRevert {
            ghost_id,
            due_ms,
            epoch: self.epoch,
        });
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
        self.epoch += 1;
    }

    /// Remove and return every current-epoch entry due at `now_ms`, oldest first.
    pub fn take_due(&mut self, now_ms: u64) -> Vec<PendingRevert> {
        let epoch = self.epoch;
        self.pending.retain(|entry| entry.epoch == epoch);

        let mut due = Vec::new();
        self.pending.retain(|entry| {
            if entry.due_ms <= now_ms {
                due.push(*entry);
                false
            } else {
                true
            }
        });
        due.sort_by_key(|entry| (entry.due_ms, entry.ghost_id));
        due
    }
}
