//! Nodestate replay
//!
//! Resolves a node recording and delegates its re-execution to an external
//! node runtime, under the same cleanup rules as the comparator.

pub mod args;
pub mod replay;
pub mod runtime;

pub use args::*;
pub use replay::*;
pub use runtime::*;
