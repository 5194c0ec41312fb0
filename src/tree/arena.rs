#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use serde::{Deserialize, Serialize};

/// Stable index of a node inside a tree's arena.
///
/// Ids are only meaningful for the tree that issued them. Copies of a tree
/// (via `Clone`) keep the same ids, which lets the engines snapshot a tree and
/// keep addressing the same logical nodes in the copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the raw slot index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Slot storage with a free list so spliced-out nodes can be reclaimed.
#[derive(Clone, Debug, Default)]
pub(crate) struct Arena<T> {
    /// Occupied (`Some`) and vacated (`None`) slots.
    slots: Vec<Option<T>>,
    /// Vacated slots available for reuse.
    free:  Vec<NodeId>,
}

impl<T> Arena<T> {
    /// Creates an empty arena.
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free:  Vec::new(),
        }
    }

    /// Stores `element`, reusing a vacated slot when one exists.
    pub(crate) fn alloc(&mut self, element: T) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.slots[id.0] = Some(element);
            id
        } else {
            self.slots.push(Some(element));
            NodeId(self.slots.len() - 1)
        }
    }

    /// Borrows the element behind `id`.
    pub(crate) fn get(&self, id: NodeId) -> &T {
        match self.slots.get(id.0) {
            Some(Some(element)) => element,
            _ => panic!("`Arena::get()` - node id {} is stale", id.0),
        }
    }

    /// Mutably borrows the element behind `id`.
    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut T {
        match self.slots.get_mut(id.0) {
            Some(Some(element)) => element,
            _ => panic!("`Arena::get_mut()` - node id {} is stale", id.0),
        }
    }

    /// Removes the element behind `id` and marks its slot reusable.
    pub(crate) fn take(&mut self, id: NodeId) -> Option<T> {
        let element = self.slots.get_mut(id.0)?.take()?;
        self.free.push(id);
        Some(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vacated_slots_are_reused() {
        let mut arena = Arena::new();
        let a = arena.alloc(1);
        let b = arena.alloc(2);
        assert!(arena.free.is_empty());

        assert_eq!(arena.take(a), Some(1));
        assert_eq!(arena.free, vec![a]);
        assert_eq!(arena.take(a), None);
        assert_eq!(arena.free.len(), 1);

        let c = arena.alloc(3);
        assert_eq!(c, a);
        assert_eq!(arena.slots.len(), 2);
        assert_eq!(*arena.get(c), 3);
        assert_eq!(*arena.get(b), 2);
    }

    #[test]
    #[should_panic(expected = "is stale")]
    fn stale_ids_panic() {
        let mut arena = Arena::new();
        let a = arena.alloc(1);
        arena.take(a);
        let _ = arena.get(a);
    }
}
