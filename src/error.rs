use std::collections::TryReserveError;
use std::io;

use thiserror::Error;

/// Errors reported by tree operations.
///
/// A failed operation never changes the tree.
#[derive(Debug, Error)]
pub enum TreeError {
    /// The tree configuration is unusable, e.g. a record size of zero.
    #[error("invalid tree configuration: {0}")]
    InvalidConfig(&'static str),

    /// A record or key does not have the configured record size.
    #[error("record is {actual} bytes, tree stores {expected}-byte records")]
    RecordSize { expected: usize, actual: usize },

    /// The operation needs at least one node.
    #[error("tree is empty")]
    EmptyTree,

    /// A record comparing equal to the inserted one is already stored.
    #[error("duplicate key")]
    DuplicateKey,

    /// No record compares equal to the key.
    #[error("key not found")]
    NotFound,

    /// `print` was called without a printer.
    #[error("no printer specified")]
    NoPrinter,

    /// Storage for a node or its record could not be reserved.
    #[error("allocation failure: {0}")]
    AllocationFailure(#[from] TryReserveError),

    /// Writing the printed tree failed.
    #[error("failed to write tree: {0}")]
    Output(#[from] io::Error),
}

pub type TreeResult<T> = Result<T, TreeError>;
