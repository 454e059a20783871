//! Node storage.
//!
//! Nodes live in a dense arena and refer to each other by `NodeId`. Children are
//! owned through the arena; the parent link is a plain index used for navigation
//! only. Released slots are chained into a free list and reused by later inserts.

use std::mem;
use std::ops::{Index, IndexMut};

use crate::error::TreeResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

pub(crate) type Link = Option<NodeId>;

/// Height of an absent subtree.
pub(crate) const EMPTY_HEIGHT: i32 = -1;

pub(crate) struct Node {
    pub(crate) data: Box<[u8]>,
    // Leaf = 0.
    pub(crate) height: i32,
    pub(crate) parent: Link,
    pub(crate) left: Link,
    pub(crate) right: Link,
}

/// Which child slot of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    pub(crate) fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

impl Node {
    pub(crate) fn child(&self, side: Side) -> Link {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub(crate) fn child_mut(&mut self, side: Side) -> &mut Link {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

enum Slot {
    Occupied(Node),
    Vacant { next_free: Link },
}

pub(crate) struct Arena {
    slots: Vec<Slot>,
    free_head: Link,
}

impl Arena {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
        }
    }

    /// Copies `record` into a new parentless leaf.
    ///
    /// Both the record buffer and the arena slot are reserved before the node is
    /// stored, so a failed allocation leaves the arena as it was.
    pub(crate) fn allocate(&mut self, record: &[u8]) -> TreeResult<NodeId> {
        let mut data = Vec::new();
        data.try_reserve_exact(record.len())?;
        data.extend_from_slice(record);

        let node = Node {
            data: data.into_boxed_slice(),
            height: 0,
            parent: None,
            left: None,
            right: None,
        };

        match self.free_head {
            Some(id) => {
                self.free_head = match self.slots[id.0] {
                    Slot::Vacant { next_free } => next_free,
                    Slot::Occupied(_) => unreachable!("free list points at a live node"),
                };
                self.slots[id.0] = Slot::Occupied(node);
                Ok(id)
            }
            None => {
                self.slots.try_reserve(1)?;
                self.slots.push(Slot::Occupied(node));
                Ok(NodeId(self.slots.len() - 1))
            }
        }
    }

    /// Removes the node from the arena and hands it back to the caller.
    /// The node's links are not touched; unlinking is the caller's business.
    pub(crate) fn release(&mut self, id: NodeId) -> Node {
        let slot = mem::replace(
            &mut self.slots[id.0],
            Slot::Vacant {
                next_free: self.free_head,
            },
        );
        match slot {
            Slot::Occupied(node) => {
                self.free_head = Some(id);
                node
            }
            Slot::Vacant { .. } => unreachable!("node {:?} released twice", id),
        }
    }

    /// Drops every slot. Records must already have been passed to the destructor.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free_head = None;
    }

    /// Number of slots ever handed out, live or free.
    #[cfg(test)]
    pub(crate) fn capacity_used(&self) -> usize {
        self.slots.len()
    }

    /// Height of a possibly absent subtree.
    pub(crate) fn height(&self, link: Link) -> i32 {
        link.map_or(EMPTY_HEIGHT, |id| self[id].height)
    }
}

impl Index<NodeId> for Arena {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        match &self.slots[id.0] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("use of released node {:?}", id),
        }
    }
}

impl IndexMut<NodeId> for Arena {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        match &mut self.slots[id.0] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("use of released node {:?}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_copies_record() {
        let mut arena = Arena::new();
        let mut record = [1u8, 2, 3];
        let id = arena.allocate(&record).unwrap();
        record[0] = 9;
        assert_ne!(&*arena[id].data, &record);
        assert_eq!(&*arena[id].data, &[1, 2, 3]);
        assert_eq!(arena[id].height, 0);
        assert!(arena[id].parent.is_none());
    }

    #[test]
    fn test_release_reuses_slots() {
        let mut arena = Arena::new();
        let a = arena.allocate(&[1]).unwrap();
        let b = arena.allocate(&[2]).unwrap();
        assert_eq!(arena.capacity_used(), 2);

        let node = arena.release(a);
        assert_eq!(&*node.data, &[1]);
        let c = arena.allocate(&[3]).unwrap();
        assert_eq!(c, a);
        assert_eq!(arena.capacity_used(), 2);
        assert_eq!(&*arena[b].data, &[2]);
        assert_eq!(&*arena[c].data, &[3]);
    }

    #[test]
    fn test_height_of_absent_subtree() {
        let mut arena = Arena::new();
        let id = arena.allocate(&[0]).unwrap();
        assert_eq!(arena.height(None), EMPTY_HEIGHT);
        assert_eq!(arena.height(Some(id)), 0);
    }
}
