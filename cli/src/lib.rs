//! Nodestate comparator
//!
//! Resolves two node snapshots, canonicalizes their state and diffs the
//! canonical trees.

pub mod args;
pub mod compare;
pub mod diff;

pub use args::*;
pub use compare::*;
pub use diff::*;
