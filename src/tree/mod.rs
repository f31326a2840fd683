//! Call tree reconstruction.
//!
//! Blocks arrive per thread in completion order: a parent is written after
//! all of its children. The [`TreeBuilder`] folds that flat sequence back
//! into nested [`BlocksTree`] nodes hanging off a [`BlocksTreeRoot`].

pub mod builder;
pub mod node;

pub use builder::{OrderingCheck, TreeBuilder};
pub use node::{BlockIndex, BlocksTree, BlocksTreeRoot, ThreadId};
