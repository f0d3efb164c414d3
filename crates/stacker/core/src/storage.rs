//! Member storage: the ordered snapshots behind a stack's head.
//!
//! Storage is LIFO. The most recently pushed snapshot is the next one a split
//! materializes. Forward traversal starts from the oldest member.

use std::collections::VecDeque;

/// Opaque captured state of one stacked creature.
///
/// The engine never looks inside; only the [`EntityAdapter`] that produced a
/// snapshot knows how to turn it back into a live creature.
///
/// [`EntityAdapter`]: crate::env::EntityAdapter
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemberSnapshot(Vec<u8>);

impl MemberSnapshot {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// Ordered collection of member snapshots.
pub trait MemberStorage: Send + Sync {
    fn push(&mut self, snapshot: MemberSnapshot);

    /// Removes and returns the most recently pushed snapshot.
    fn pop(&mut self) -> Option<MemberSnapshot>;

    /// The most recently pushed snapshot.
    fn peek(&self) -> Option<&MemberSnapshot>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visits at most `limit` snapshots starting from the oldest.
    fn for_each_capped(&self, limit: usize, visit: &mut dyn FnMut(&MemberSnapshot));

    /// Moves every snapshot out of the storage, oldest first.
    fn drain_all(&mut self) -> Vec<MemberSnapshot>;

    /// Pops up to `count` snapshots, discarding them. Returns how many were removed.
    fn pop_many(&mut self, count: usize) -> usize {
        let mut removed = 0;
        while removed < count && self.pop().is_some() {
            removed += 1;
        }
        removed
    }

    /// Appends snapshots in order, so the last one ends up on top.
    fn extend(&mut self, snapshots: Vec<MemberSnapshot>) {
        for snapshot in snapshots {
            self.push(snapshot);
        }
    }
}

/// In-memory storage backed by a deque.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VecMemberStorage {
    members: VecDeque<MemberSnapshot>,
}

impl VecMemberStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemberStorage for VecMemberStorage {
    fn push(&mut self, snapshot: MemberSnapshot) {
        self.members.push_back(snapshot);
    }

    fn pop(&mut self) -> Option<MemberSnapshot> {
        self.members.pop_back()
    }

    fn peek(&self) -> Option<&MemberSnapshot> {
        self.members.back()
    }

    fn len(&self) -> usize {
        self.members.len()
    }

    fn for_each_capped(&self, limit: usize, visit: &mut dyn FnMut(&MemberSnapshot)) {
        self.members.iter().take(limit).for_each(visit);
    }

    fn drain_all(&mut self) -> Vec<MemberSnapshot> {
        self.members.drain(..).collect()
    }

    fn pop_many(&mut self, count: usize) -> usize {
        let removed = count.min(self.members.len());
        self.members.truncate(self.members.len() - removed);
        removed
    }

    fn extend(&mut self, snapshots: Vec<MemberSnapshot>) {
        self.members.extend(snapshots);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(tag: u8) -> MemberSnapshot {
        MemberSnapshot::new(vec![tag])
    }

    #[test]
    fn pop_is_lifo() {
        let mut storage = VecMemberStorage::new();
        storage.push(snapshot(1));
        storage.push(snapshot(2));

        assert_eq!(storage.peek(), Some(&snapshot(2)));
        assert_eq!(storage.pop(), Some(snapshot(2)));
        assert_eq!(storage.pop(), Some(snapshot(1)));
        assert_eq!(storage.pop(), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn for_each_capped_walks_oldest_first() {
        let mut storage = VecMemberStorage::new();
        storage.extend((0..5).map(snapshot).collect());

        let mut seen = Vec::new();
        storage.for_each_capped(3, &mut |s: &MemberSnapshot| seen.push(s.as_bytes()[0]));
        assert_eq!(seen, vec![0, 1, 2]);

        let mut all = 0;
        storage.for_each_capped(100, &mut |_: &MemberSnapshot| all += 1);
        assert_eq!(all, 5);
    }

    #[test]
    fn pop_many_stops_at_empty() {
        let mut storage = VecMemberStorage::new();
        storage.extend((0..3).map(snapshot).collect());

        assert_eq!(storage.pop_many(2), 2);
        assert_eq!(storage.peek(), Some(&snapshot(0)));
        assert_eq!(storage.pop_many(10), 1);
        assert!(storage.is_empty());
    }

    #[test]
    fn drain_keeps_order_for_append() {
        let mut donor = VecMemberStorage::new();
        donor.extend(vec![snapshot(7), snapshot(8)]);

        let mut target = VecMemberStorage::new();
        target.push(snapshot(1));
        target.extend(donor.drain_all());

        assert!(donor.is_empty());
        assert_eq!(target.len(), 3);
        assert_eq!(target.peek(), Some(&snapshot(8)));
    }
}
