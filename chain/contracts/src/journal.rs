//! Undo journal for all-or-nothing calls
//!
//! Each stateful component records the previous value of whatever it
//! overwrites while a checkpoint is open. Committing the outermost
//! checkpoint discards the entries; reverting hands back everything written
//! since the checkpoint, newest first, for the owner to apply. Cost is
//! proportional to what the call touched, not to the size of the state.

/// Position in a journal returned by [`Journal::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

#[derive(Debug, Clone)]
pub struct Journal<U> {
    entries: Vec<U>,
    depth: usize,
}

impl<U> Default for Journal<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> Journal<U> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            depth: 0,
        }
    }

    /// Whether any checkpoint is open (writes are being recorded).
    pub fn is_open(&self) -> bool {
        self.depth > 0
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record an undo entry. Ignored when no checkpoint is open.
    pub fn record(&mut self, entry: U) {
        if self.is_open() {
            self.entries.push(entry);
        }
    }

    /// Open a (possibly nested) checkpoint.
    pub fn open(&mut self) -> Checkpoint {
        self.depth += 1;
        Checkpoint(self.entries.len())
    }

    /// Close `checkpoint` keeping its writes. Entries survive until the
    /// outermost checkpoint closes, since an enclosing call may still revert.
    pub fn commit(&mut self, _checkpoint: Checkpoint) {
        self.close();
    }

    /// Close `checkpoint` and return its entries, newest first.
    pub fn rollback(&mut self, checkpoint: Checkpoint) -> std::iter::Rev<std::vec::IntoIter<U>> {
        let at = checkpoint.0.min(self.entries.len());
        let undone = self.entries.split_off(at);
        self.close();
        undone.into_iter().rev()
    }

    /// Entries recorded so far, oldest first.
    pub fn entries_mut(&mut self) -> &mut [U] {
        &mut self.entries
    }

    fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.entries.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_recorded_while_closed() {
        let mut journal = Journal::new();
        journal.record(1);
        assert!(journal.is_empty());
        assert!(!journal.is_open());
    }

    #[test]
    fn test_rollback_returns_newest_first() {
        let mut journal = Journal::new();
        let checkpoint = journal.open();
        journal.record(1);
        journal.record(2);
        journal.record(3);
        let undone: Vec<_> = journal.rollback(checkpoint).collect();
        assert_eq!(undone, vec![3, 2, 1]);
        assert!(journal.is_empty());
        assert!(!journal.is_open());
    }

    #[test]
    fn test_nested_commit_keeps_entries_for_outer_rollback() {
        let mut journal = Journal::new();
        let outer = journal.open();
        journal.record("outer");
        let inner = journal.open();
        journal.record("inner");
        journal.commit(inner);
        assert_eq!(journal.len(), 2);

        let undone: Vec<_> = journal.rollback(outer).collect();
        assert_eq!(undone, vec!["inner", "outer"]);
    }

    #[test]
    fn test_nested_rollback_only_undoes_inner() {
        let mut journal = Journal::new();
        let outer = journal.open();
        journal.record("outer");
        let inner = journal.open();
        journal.record("inner");

        let undone: Vec<_> = journal.rollback(inner).collect();
        assert_eq!(undone, vec!["inner"]);
        assert!(journal.is_open());

        journal.commit(outer);
        assert!(journal.is_empty());
    }
}
