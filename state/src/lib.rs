//! Nodestate State Access
//! 
//! Turns snapshot inputs into directories and opens the key-value stores
//! found inside them:
//! - archive resolution (zip and tar family) with temp-resource tracking
//! - storage-directory detection by sentinel files
//! - a read-only opener with an ordered engine/key-ordering fallback list

pub mod archive;
pub mod lifecycle;
pub mod detector;
pub mod opener;
pub mod memory;
pub mod persistent;

pub use archive::*;
pub use lifecycle::*;
pub use detector::*;
pub use opener::*;
pub use memory::*;
pub use persistent::*;
