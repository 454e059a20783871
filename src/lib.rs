//! An ordered map over opaque fixed-size records, implemented with an AVL tree.
//!
//! Records are byte strings of a length fixed when the tree is created. Their order
//! is defined by a [`Comparator`]; two records comparing equal are the same key.
//! Every insert and remove restores the AVL condition, so the height of the tree
//! stays logarithmic in the number of records.
//!
//! ```
//! use avl_records::{AvlTree, PodOrder, PodPrinter};
//!
//! let mut tree: AvlTree<PodOrder<i32>> = AvlTree::for_pod().unwrap();
//! for value in [5, 2, 8, 1, 3, 7, 9] {
//!     tree.insert_pod(&value).unwrap();
//! }
//! tree.remove_pod(&5).unwrap();
//! assert_eq!(tree.len(), 6);
//! assert_eq!(tree.retrieve_pod(&7).unwrap(), 7);
//!
//! let mut out = Vec::new();
//! tree.print(&mut out, Some(&PodPrinter::<i32>::new())).unwrap();
//! ```

mod balance;
mod config;
mod error;
mod node;
mod policy;
mod tree;

pub use config::TreeConfig;
pub use error::{TreeError, TreeResult};
pub use policy::{Comparator, Destructor, NoDestructor, PodOrder, PodPrinter, Printer};
pub use tree::{AvlTree, Visit};
