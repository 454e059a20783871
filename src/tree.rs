use std::cmp::Ordering;
use std::io::Write;

use bytemuck::Pod;
use tracing::{debug, trace};

use crate::balance::Mode;
use crate::config::TreeConfig;
use crate::error::{TreeError, TreeResult};
use crate::node::{Arena, Link, NodeId, Side};
use crate::policy::{Comparator, Destructor, NoDestructor, PodOrder, Printer};

/// An AVL tree over fixed-size byte records ordered by a caller-supplied comparator.
///
/// ```
/// use avl_records::AvlTree;
///
/// let mut tree = AvlTree::new(1, |a: &[u8], b: &[u8]| a.cmp(b)).unwrap();
/// assert_eq!(tree.insert(&[10]).unwrap(), 1);
/// assert_eq!(tree.insert(&[20]).unwrap(), 2);
/// assert_eq!(tree.insert(&[30]).unwrap(), 2);
/// assert_eq!(tree.retrieve(&[20]).unwrap(), &[20]);
/// assert_eq!(tree.remove(&[20]).unwrap(), 2);
/// assert!(tree.get(&[20]).is_none());
/// ```
pub struct AvlTree<C, D = NoDestructor>
where
    C: Comparator,
    D: Destructor,
{
    pub(crate) nodes: Arena,
    pub(crate) root: Link,
    num_nodes: usize,
    record_size: usize,
    pub(crate) comparator: C,
    destructor: D,
    // Single rotations performed so far; a double rotation counts twice.
    #[cfg(test)]
    pub(crate) rotations: usize,
}

/// A node seen during an in-order traversal.
#[derive(Clone, Copy, Debug)]
pub struct Visit<'a> {
    /// The node's stored record.
    pub record: &'a [u8],
    /// Distance from the root, which is at depth 0.
    pub depth: usize,
    /// Cached height of the node's subtree, a leaf has height 0.
    pub height: usize,
}

/// Which end of a subtree `extract` removes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Extreme {
    Min,
    Max,
}

impl Extreme {
    fn side(self) -> Side {
        match self {
            Extreme::Min => Side::Left,
            Extreme::Max => Side::Right,
        }
    }
}

impl<C: Comparator> AvlTree<C, NoDestructor> {
    /// Creates an empty tree for records of `record_size` bytes.
    pub fn new(record_size: usize, comparator: C) -> TreeResult<Self> {
        Self::with_destructor(record_size, comparator, NoDestructor)
    }
}

impl<T: Pod + Ord> AvlTree<PodOrder<T>, NoDestructor> {
    /// Creates an empty tree storing the bytes of `T` values, ordered by `T: Ord`.
    pub fn for_pod() -> TreeResult<Self> {
        Self::from_config(TreeConfig::for_pod::<T>()?, PodOrder::new(), NoDestructor)
    }
}

impl<C, D> AvlTree<C, D>
where
    C: Comparator,
    D: Destructor,
{
    /// Creates an empty tree whose records are passed to `destructor` before they are freed.
    pub fn with_destructor(record_size: usize, comparator: C, destructor: D) -> TreeResult<Self> {
        Self::from_config(TreeConfig::new(record_size)?, comparator, destructor)
    }

    pub fn from_config(config: TreeConfig, comparator: C, destructor: D) -> TreeResult<Self> {
        Ok(Self {
            nodes: Arena::new(),
            root: None,
            num_nodes: 0,
            record_size: config.record_size(),
            comparator,
            destructor,
            #[cfg(test)]
            rotations: 0,
        })
    }

    pub fn record_size(&self) -> usize {
        self.record_size
    }

    /// Returns true if the tree contains no records.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of records in the tree.
    pub fn len(&self) -> usize {
        self.num_nodes
    }

    /// Returns the height of the tree counted in node levels, 0 for an empty tree.
    pub fn height(&self) -> usize {
        (self.nodes.height(self.root) + 1) as usize
    }

    /// Destroys every record, children before their parent, leaving an empty tree.
    pub fn clear(&mut self) {
        if let Some(root) = self.root.take() {
            self.destroy_subtree(root);
        }
        self.nodes.clear();
        self.num_nodes = 0;
    }

    /// Copies `record` into the tree.
    ///
    /// Returns the resulting tree height in node levels. Fails with `DuplicateKey`
    /// if a record comparing equal is already stored; the tree is unchanged then.
    pub fn insert(&mut self, record: &[u8]) -> TreeResult<usize> {
        self.check_record(record)?;
        match self.root {
            None => self.root = Some(self.nodes.allocate(record)?),
            Some(root) => {
                if let Err(error) = self.insert_below(root, record) {
                    debug!(%error, "insert rejected");
                    return Err(error);
                }
            }
        }
        self.num_nodes += 1;
        debug!(len = self.num_nodes, height = self.height(), "inserted record");
        Ok(self.height())
    }

    /// Removes the record comparing equal to `key`.
    ///
    /// Returns the resulting tree height in node levels, 0 once the tree is empty.
    pub fn remove(&mut self, key: &[u8]) -> TreeResult<usize> {
        self.check_record(key)?;
        let root = self.root.ok_or(TreeError::EmptyTree)?;
        if let Err(error) = self.remove_below(root, key) {
            debug!(%error, "remove rejected");
            return Err(error);
        }
        debug_assert!(self.num_nodes >= 1);
        self.num_nodes -= 1;
        if self.num_nodes == 0 {
            self.root = None;
        }
        debug!(len = self.num_nodes, height = self.height(), "removed record");
        Ok(self.height())
    }

    /// Returns the stored record comparing equal to `key`.
    pub fn retrieve(&self, key: &[u8]) -> TreeResult<&[u8]> {
        self.check_record(key)?;
        if self.root.is_none() {
            return Err(TreeError::EmptyTree);
        }
        self.find(key)
            .map(|id| &*self.nodes[id].data)
            .ok_or(TreeError::NotFound)
    }

    /// Returns the stored record comparing equal to `key`, if any.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.retrieve(key).ok()
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    pub fn insert_pod<T: Pod>(&mut self, value: &T) -> TreeResult<usize> {
        self.insert(bytemuck::bytes_of(value))
    }

    pub fn remove_pod<T: Pod>(&mut self, key: &T) -> TreeResult<usize> {
        self.remove(bytemuck::bytes_of(key))
    }

    /// Returns a copy of the stored record comparing equal to `key`, decoded as `T`.
    pub fn retrieve_pod<T: Pod>(&self, key: &T) -> TreeResult<T> {
        self.retrieve(bytemuck::bytes_of(key))
            .map(bytemuck::pod_read_unaligned)
    }

    /// Walks the tree in order, left subtree first.
    pub fn traverse<F>(&self, mut visit: F)
    where
        F: FnMut(Visit<'_>),
    {
        self.traverse_from(self.root, 0, &mut visit);
    }

    /// Writes one line per record in order: the record indented by four spaces
    /// per level of depth, followed by `-` and its subtree height.
    pub fn print<W, P>(&self, out: &mut W, printer: Option<&P>) -> TreeResult<()>
    where
        W: Write + ?Sized,
        P: Printer + ?Sized,
    {
        if self.is_empty() {
            return Err(TreeError::EmptyTree);
        }
        let printer = printer.ok_or(TreeError::NoPrinter)?;

        let mut result = Ok(());
        self.traverse(|visit| {
            if result.is_ok() {
                result = writeln!(
                    out,
                    "{:indent$}{}-{}",
                    "",
                    printer.render(visit.record),
                    visit.height,
                    indent = 4 * visit.depth
                );
            }
        });
        Ok(result?)
    }

    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        // Check root link
        if let Some(root) = self.root {
            assert!(self.nodes[root].parent.is_none());
        } else {
            assert_eq!(self.num_nodes, 0);
        }

        let mut num_nodes = 0;
        self.check_subtree(self.root, &mut num_nodes);
        assert_eq!(num_nodes, self.num_nodes);
    }

    #[cfg(any(test, feature = "consistency_check"))]
    fn check_subtree(&self, link: Link, num_nodes: &mut usize) -> i32 {
        let Some(id) = link else {
            return crate::node::EMPTY_HEIGHT;
        };
        let node = &self.nodes[id];

        // Check links and order of child nodes
        if let Some(left) = node.left {
            assert_eq!(self.nodes[left].parent, Some(id));
            assert_eq!(
                self.comparator.compare(&self.nodes[left].data, &node.data),
                Ordering::Less
            );
        }
        if let Some(right) = node.right {
            assert_eq!(self.nodes[right].parent, Some(id));
            assert_eq!(
                self.comparator.compare(&self.nodes[right].data, &node.data),
                Ordering::Greater
            );
        }

        let left_height = self.check_subtree(node.left, num_nodes);
        let right_height = self.check_subtree(node.right, num_nodes);

        // Check height
        assert_eq!(node.height, 1 + left_height.max(right_height));

        // Check AVL condition (nearly balance)
        assert!((left_height - right_height).abs() <= 1);

        *num_nodes += 1;
        node.height
    }

    fn check_record(&self, record: &[u8]) -> TreeResult<()> {
        if record.len() != self.record_size {
            return Err(TreeError::RecordSize {
                expected: self.record_size,
                actual: record.len(),
            });
        }
        Ok(())
    }

    fn find(&self, key: &[u8]) -> Link {
        let mut current = self.root;
        while let Some(id) = current {
            let node = &self.nodes[id];
            current = match self.comparator.compare(key, &node.data) {
                Ordering::Equal => break,
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
        }
        current
    }

    // Returns the height of the subtree now rooted where `id` was.
    fn insert_below(&mut self, id: NodeId, record: &[u8]) -> TreeResult<i32> {
        let side = match self.comparator.compare(record, &self.nodes[id].data) {
            Ordering::Equal => return Err(TreeError::DuplicateKey),
            Ordering::Less => Side::Left,
            Ordering::Greater => Side::Right,
        };

        let child_height = match self.nodes[id].child(side) {
            Some(child) => self.insert_below(child, record)?,
            None => {
                let leaf = self.nodes.allocate(record)?;
                self.nodes[leaf].parent = Some(id);
                *self.nodes[id].child_mut(side) = Some(leaf);
                0
            }
        };

        // Balance can only break where the subtree grew.
        if child_height >= self.nodes[id].height {
            self.nodes[id].height = child_height + 1;
            let top = self.rebalance(id, record, Mode::Insertion);
            return Ok(self.nodes[top].height);
        }
        Ok(self.nodes[id].height)
    }

    fn remove_below(&mut self, id: NodeId, key: &[u8]) -> TreeResult<()> {
        let node = &self.nodes[id];
        match self.comparator.compare(key, &node.data) {
            Ordering::Less => {
                let left = node.left.ok_or(TreeError::NotFound)?;
                self.remove_below(left, key)?;
            }
            Ordering::Greater => {
                let right = node.right.ok_or(TreeError::NotFound)?;
                self.remove_below(right, key)?;
            }
            Ordering::Equal => match (node.left, node.right) {
                (None, None) => {
                    let parent = node.parent;
                    self.replace_child(parent, id, None);
                    let node = self.nodes.release(id);
                    self.destroy_record(node.data);
                    return Ok(());
                }
                (Some(left), None) => self.promote(id, Extreme::Max, left),
                (None, Some(right)) => self.promote(id, Extreme::Min, right),
                (Some(left), Some(right)) => {
                    // Take from the taller side to keep later rotations rare.
                    if self.nodes[left].height > self.nodes[right].height {
                        self.promote(id, Extreme::Max, left);
                    } else {
                        self.promote(id, Extreme::Min, right);
                    }
                }
            },
        }
        self.rebalance(id, key, Mode::Removal);
        Ok(())
    }

    // Replaces the record of `id` by the extreme record of `subtree`.
    fn promote(&mut self, id: NodeId, extreme: Extreme, subtree: NodeId) {
        let record = self.extract(extreme, subtree);
        let old = std::mem::replace(&mut self.nodes[id].data, record);
        self.destroy_record(old);
    }

    // Unlinks the minimum or maximum node of the subtree rooted at `id` and
    // returns its record. The record moves out untouched by the destructor.
    fn extract(&mut self, extreme: Extreme, id: NodeId) -> Box<[u8]> {
        let toward = extreme.side();
        if let Some(next) = self.nodes[id].child(toward) {
            let record = self.extract(extreme, next);
            self.rebalance(id, &record, Mode::Removal);
            return record;
        }

        // At most one child remains, on the other side.
        let node = &self.nodes[id];
        let (parent, remaining) = (node.parent, node.child(toward.opposite()));
        self.replace_child(parent, id, remaining);
        trace!(?extreme, "extracted node");
        self.nodes.release(id).data
    }

    // Points the slot of `parent` that holds `old` (or the root) at `new`.
    pub(crate) fn replace_child(&mut self, parent: Link, old: NodeId, new: Link) {
        if let Some(new) = new {
            self.nodes[new].parent = parent;
        }
        match parent {
            None => self.root = new,
            Some(parent) => {
                let parent = &mut self.nodes[parent];
                if parent.left == Some(old) {
                    parent.left = new;
                } else {
                    parent.right = new;
                }
            }
        }
    }

    fn destroy_subtree(&mut self, id: NodeId) {
        let node = &self.nodes[id];
        let (left, right) = (node.left, node.right);
        if let Some(left) = left {
            self.destroy_subtree(left);
        }
        if let Some(right) = right {
            self.destroy_subtree(right);
        }
        let node = self.nodes.release(id);
        self.destroy_record(node.data);
    }

    fn destroy_record(&mut self, mut record: Box<[u8]>) {
        self.destructor.destroy(&mut record);
    }

    fn traverse_from<F>(&self, link: Link, depth: usize, visit: &mut F)
    where
        F: FnMut(Visit<'_>),
    {
        if let Some(id) = link {
            let node = &self.nodes[id];
            self.traverse_from(node.left, depth + 1, visit);
            visit(Visit {
                record: &node.data,
                depth,
                height: node.height as usize,
            });
            self.traverse_from(node.right, depth + 1, visit);
        }
    }
}

impl<C, D> Drop for AvlTree<C, D>
where
    C: Comparator,
    D: Destructor,
{
    fn drop(&mut self) {
        self.clear();
    }
}
