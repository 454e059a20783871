//! Rotations and the AVL rebalancing step.

use std::cmp::Ordering;

use tracing::trace;

use crate::node::{NodeId, Side};
use crate::policy::{Comparator, Destructor};
use crate::tree::AvlTree;

/// The mutation that preceded a rebalance.
///
/// After an insert the heavy grandchild is the one on the path of the new record,
/// so comparing against that record tells which rotation is needed. After a removal
/// the reference record lies on the shortened side and says nothing about the heavy
/// grandchild, so the grandchild heights decide instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Mode {
    Insertion,
    Removal,
}

impl<C, D> AvlTree<C, D>
where
    C: Comparator,
    D: Destructor,
{
    /// Restores the AVL condition at `id` if necessary and adjusts its height.
    /// Initial balance must not exceed +2 or -2, which always holds after a single update.
    /// Returns the node now at the top of the subtree.
    pub(crate) fn rebalance(&mut self, id: NodeId, reference: &[u8], mode: Mode) -> NodeId {
        let balance = self.balance_factor(id);
        debug_assert!(balance.abs() <= 2);

        let node = &self.nodes[id];
        match (node.left, node.right) {
            (Some(left), _) if balance > 1 => {
                if !self.outer_is_heavy(left, Side::Left, reference, mode) {
                    self.rotate_from(Side::Right, left);
                }
                self.rotate_from(Side::Left, id)
            }
            (_, Some(right)) if balance < -1 => {
                if !self.outer_is_heavy(right, Side::Right, reference, mode) {
                    self.rotate_from(Side::Left, right);
                }
                self.rotate_from(Side::Right, id)
            }
            _ => {
                self.adjust_height(id);
                id
            }
        }
    }

    // Whether the grandchild below `child` on the outer `side` is the taller one.
    fn outer_is_heavy(&self, child: NodeId, side: Side, reference: &[u8], mode: Mode) -> bool {
        let child = &self.nodes[child];
        match mode {
            Mode::Insertion => {
                let ordering = self.comparator.compare(reference, &child.data);
                match side {
                    Side::Left => ordering == Ordering::Less,
                    Side::Right => ordering == Ordering::Greater,
                }
            }
            // Equal heights need the single rotation, a double one would leave
            // the subtree unbalanced.
            Mode::Removal => {
                self.nodes.height(child.child(side))
                    >= self.nodes.height(child.child(side.opposite()))
            }
        }
    }

    /// Promotes the child of `old_root` on `side` into its place.
    ///
    /// `rotate_from(Side::Left, ..)` is a right rotation: the left child becomes the
    /// subtree root, its inner (right) subtree moves under `old_root`.
    pub(crate) fn rotate_from(&mut self, side: Side, old_root: NodeId) -> NodeId {
        let Some(new_root) = self.nodes[old_root].child(side) else {
            unreachable!("rotation of {:?} without a child on {:?}", old_root, side);
        };

        let inner = self.nodes[new_root].child(side.opposite());
        *self.nodes[old_root].child_mut(side) = inner;
        if let Some(inner) = inner {
            self.nodes[inner].parent = Some(old_root);
        }

        let parent = self.nodes[old_root].parent;
        self.replace_child(parent, old_root, Some(new_root));

        *self.nodes[new_root].child_mut(side.opposite()) = Some(old_root);
        self.nodes[old_root].parent = Some(new_root);

        self.adjust_height(old_root);
        self.adjust_height(new_root);
        #[cfg(test)]
        {
            self.rotations += 1;
        }
        trace!(?side, "rotated");
        new_root
    }

    pub(crate) fn balance_factor(&self, id: NodeId) -> i32 {
        let node = &self.nodes[id];
        self.nodes.height(node.left) - self.nodes.height(node.right)
    }

    pub(crate) fn adjust_height(&mut self, id: NodeId) {
        let node = &self.nodes[id];
        let height = 1 + self
            .nodes
            .height(node.left)
            .max(self.nodes.height(node.right));
        self.nodes[id].height = height;
    }
}

#[cfg(test)]
mod tests {
    use crate::{AvlTree, PodOrder};

    fn tree_of(values: &[i32]) -> AvlTree<PodOrder<i32>> {
        let mut tree = AvlTree::for_pod().unwrap();
        for value in values {
            tree.insert_pod(value).unwrap();
        }
        tree
    }

    fn shape(tree: &AvlTree<PodOrder<i32>>) -> Vec<(i32, usize, usize)> {
        let mut shape = Vec::new();
        tree.traverse(|visit| {
            let value: i32 = bytemuck::pod_read_unaligned(visit.record);
            shape.push((value, visit.depth, visit.height));
        });
        shape
    }

    #[test]
    fn test_rotate_from_left_and_back() {
        //     3        2
        //    /        / \
        //   2    ->  1   3
        //  /
        // 1
        let mut tree = tree_of(&[3, 2]);
        let root = tree.root.unwrap();
        // Attach 1 by hand so that no rebalance runs.
        let left = tree.nodes[root].left.unwrap();
        let leaf = tree.nodes.allocate(bytemuck::bytes_of(&1i32)).unwrap();
        tree.nodes[leaf].parent = Some(left);
        tree.nodes[left].left = Some(leaf);
        tree.adjust_height(left);
        tree.adjust_height(root);
        assert_eq!(tree.balance_factor(root), 2);

        let new_root = tree.rotate_from(super::Side::Left, root);
        assert_eq!(tree.root, Some(new_root));
        assert_eq!(shape(&tree), vec![(1, 1, 0), (2, 0, 1), (3, 1, 0)]);

        let old_root = tree.rotate_from(super::Side::Right, new_root);
        assert_eq!(tree.root, Some(old_root));
        assert_eq!(shape(&tree), vec![(1, 2, 0), (2, 1, 1), (3, 0, 2)]);
    }

    #[test]
    #[should_panic]
    fn test_rotate_without_child_panics() {
        let mut tree = tree_of(&[1]);
        let root = tree.root.unwrap();
        tree.rotate_from(super::Side::Left, root);
    }

    #[test]
    fn test_double_rotation_on_insert() {
        //   3        2
        //  /        / \
        // 1    ->  1   3
        //  \
        //   2
        let tree = tree_of(&[3, 1, 2]);
        assert_eq!(tree.rotations, 2);
        assert_eq!(shape(&tree), vec![(1, 1, 0), (2, 0, 1), (3, 1, 0)]);
        tree.check_consistency();

        // 1          2
        //  \        / \
        //   3  ->  1   3
        //  /
        // 2
        let tree = tree_of(&[1, 3, 2]);
        assert_eq!(shape(&tree), vec![(1, 1, 0), (2, 0, 1), (3, 1, 0)]);
        tree.check_consistency();
    }

    #[test]
    fn test_single_rotation_on_removal_tie() {
        //     2            4
        //    / \          / \
        //   1   4   ->   2   5
        //      / \        \
        //     3   5        3
        let mut tree = tree_of(&[2, 1, 4, 3, 5]);
        assert_eq!(tree.rotations, 0);
        tree.remove_pod(&1).unwrap();
        assert_eq!(tree.rotations, 1);
        tree.check_consistency();
        assert_eq!(shape(&tree), vec![(2, 1, 1), (3, 2, 0), (4, 0, 2), (5, 1, 0)]);
    }

    #[test]
    fn test_double_rotation_on_removal() {
        //   2          3
        //  / \        / \
        // 1   4  ->  2   4
        //    /
        //   3
        let mut tree = tree_of(&[2, 1, 4, 3]);
        tree.remove_pod(&1).unwrap();
        assert_eq!(tree.rotations, 2);
        tree.check_consistency();
        assert_eq!(shape(&tree), vec![(2, 1, 0), (3, 0, 1), (4, 1, 0)]);
    }
}
