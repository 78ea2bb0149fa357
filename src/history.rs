use std::collections::VecDeque;

use crate::snapshot::Snapshot;

/// Default number of snapshots kept for undo
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Bounded, linear undo/redo over surface snapshots.
///
/// `entries` is oldest first and its last element is what the surface shows.
/// `redo` is most-recently-undone first. Pushing a new snapshot empties `redo`;
/// once over capacity the oldest entry is dropped.
#[derive(Debug, Clone)]
pub struct SnapshotHistory {
    entries: VecDeque<Snapshot>,
    redo: VecDeque<Snapshot>,
    capacity: usize,
}

impl SnapshotHistory {
    /// A capacity of zero is treated as one; the current state is always kept.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            redo: VecDeque::new(),
            capacity,
        }
    }

    /// Append a freshly committed snapshot and invalidate redo
    pub fn push(&mut self, snapshot: Snapshot) {
        self.append(snapshot);
        if !self.redo.is_empty() {
            log::debug!("Discarding {} redo entries", self.redo.len());
            self.redo.clear();
        }
    }

    fn append(&mut self, snapshot: Snapshot) {
        self.entries.push_back(snapshot);
        while self.entries.len() > self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                log::trace!("Evicted snapshot {} from history", evicted.id());
            }
        }
    }

    /// Snapshot `undo` would reveal, without changing anything
    pub fn undo_target(&self) -> Option<&Snapshot> {
        if self.entries.len() <= 1 {
            return None;
        }
        self.entries.get(self.entries.len() - 2)
    }

    /// Snapshot `redo` would reveal, without changing anything
    pub fn redo_target(&self) -> Option<&Snapshot> {
        self.redo.front()
    }

    /// Move the current snapshot to the redo buffer. Returns the new current
    /// snapshot, or `None` (and changes nothing) when only the seed is left.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if self.entries.len() <= 1 {
            return None;
        }
        let undone = self.entries.pop_back()?;
        self.redo.push_front(undone);
        self.entries.back()
    }

    /// Move the most recently undone snapshot back into history.
    /// The same eviction rule as `push` applies.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        let next = self.redo.pop_front()?;
        self.append(next);
        self.entries.back()
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.entries.back()
    }

    /// Number of snapshots in history, including the seed
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn can_undo(&self) -> bool {
        self.entries.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> impl Iterator<Item = &Snapshot> {
        self.entries.iter()
    }

    pub fn redo_entries(&self) -> impl Iterator<Item = &Snapshot> {
        self.redo.iter()
    }
}

impl Default for SnapshotHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn snapshot(shade: u8) -> Snapshot {
        Snapshot::encode(&RgbaImage::from_pixel(2, 2, Rgba([shade, shade, shade, 255]))).unwrap()
    }

    fn shades(history: &SnapshotHistory) -> Vec<u8> {
        history
            .entries()
            .map(|s| s.decode().unwrap().get_pixel(0, 0)[0])
            .collect()
    }

    #[test]
    fn test_retains_everything_under_capacity() {
        let mut history = SnapshotHistory::default();
        history.push(snapshot(0));
        for i in 1..=49 {
            history.push(snapshot(i));
        }
        assert_eq!(history.depth(), 50);
        assert_eq!(shades(&history)[0], 0);
    }

    #[test]
    fn test_overflow_evicts_oldest_first() {
        let mut history = SnapshotHistory::new(3);
        for i in 0..5 {
            history.push(snapshot(i));
        }
        assert_eq!(history.depth(), 3);
        assert_eq!(shades(&history), vec![2, 3, 4]);
    }

    #[test]
    fn test_undo_never_removes_the_seed() {
        let mut history = SnapshotHistory::default();
        history.push(snapshot(0));
        assert!(history.undo_target().is_none());
        assert!(history.undo().is_none());
        assert_eq!(history.depth(), 1);
        assert_eq!(history.redo_len(), 0);
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut history = SnapshotHistory::default();
        let seed = snapshot(0);
        let a = snapshot(10);
        let b = snapshot(20);
        history.push(seed);
        history.push(a.clone());
        history.push(b.clone());

        assert_eq!(history.undo_target().map(Snapshot::id), Some(a.id()));
        assert_eq!(history.undo().map(Snapshot::id), Some(a.id()));
        assert_eq!(history.depth(), 2);
        assert_eq!(history.redo_target().map(Snapshot::id), Some(b.id()));

        assert_eq!(history.redo().map(Snapshot::id), Some(b.id()));
        assert_eq!(history.depth(), 3);
        assert_eq!(history.redo_len(), 0);
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_redo_buffer_is_most_recent_first() {
        let mut history = SnapshotHistory::default();
        for i in 0..4 {
            history.push(snapshot(i));
        }
        history.undo();
        history.undo();
        let redo: Vec<u8> = history
            .redo_entries()
            .map(|s| s.decode().unwrap().get_pixel(0, 0)[0])
            .collect();
        assert_eq!(redo, vec![2, 3]);
    }

    #[test]
    fn test_push_after_undo_discards_redo() {
        let mut history = SnapshotHistory::default();
        history.push(snapshot(0));
        history.push(snapshot(1));
        history.undo();
        assert!(history.can_redo());

        history.push(snapshot(2));
        assert!(!history.can_redo());
        assert!(history.redo().is_none());
        assert_eq!(shades(&history), vec![0, 2]);
    }
}
