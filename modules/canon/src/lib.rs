//! Nodestate Canonicalizer
//! 
//! Converts a node's on-disk state into a canonical, line-oriented text tree
//! so two nodes can be compared with a plain recursive diff.

pub mod category;
pub mod render;
pub mod scrub;
pub mod merkle;
pub mod ledger;
pub mod normalize;
pub mod skip;
pub mod canonicalizer;
pub mod logtail;

pub use category::*;
pub use render::*;
pub use scrub::*;
pub use merkle::*;
pub use ledger::*;
pub use normalize::*;
pub use skip::*;
pub use canonicalizer::*;
pub use logtail::*;
